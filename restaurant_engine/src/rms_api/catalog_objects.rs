use serde::{Deserialize, Serialize};

use crate::db_types::{MenuCategory, Money};

/// Search criteria for menu items. Empty criteria match every menu item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuQueryFilter {
    pub restaurant_id: Option<i64>,
    pub category: Option<MenuCategory>,
    #[serde(default)]
    pub available_only: bool,
    pub max_price: Option<Money>,
    pub name_contains: Option<String>,
}

impl MenuQueryFilter {
    pub fn for_restaurant(restaurant_id: i64) -> Self {
        Self { restaurant_id: Some(restaurant_id), ..Default::default() }
    }

    pub fn with_category(mut self, category: MenuCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn available(mut self) -> Self {
        self.available_only = true;
        self
    }

    pub fn with_max_price(mut self, price: Money) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name_contains = Some(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.restaurant_id.is_none() &&
            self.category.is_none() &&
            !self.available_only &&
            self.max_price.is_none() &&
            self.name_contains.is_none()
    }
}

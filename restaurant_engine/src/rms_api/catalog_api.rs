//! Users, restaurants and menus. Orders refer to these, but the engine never modifies them on its own.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{MenuItem, Money, NewMenuItem, NewRestaurant, NewUser, Restaurant, User},
    helpers::{validate_email, validate_menu_price, validate_not_blank, validate_phone, validate_preparation_time},
    rms_api::catalog_objects::MenuQueryFilter,
    traits::{CatalogManagement, EngineError},
};

pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn register_user(&self, user: NewUser) -> Result<User, EngineError> {
        validate_not_blank("Username", &user.username)?;
        validate_email(user.email.as_deref())?;
        validate_phone(user.phone.as_deref())?;
        let user = self.db.insert_user(user).await?;
        debug!("🗃️ New user registered: #{} ({})", user.id, user.username);
        Ok(user)
    }

    pub async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, EngineError> {
        self.db.fetch_user(user_id).await
    }

    pub async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, EngineError> {
        self.db.fetch_user_by_username(username).await
    }

    /// Creates a new, active restaurant. The owner must be a registered user.
    pub async fn create_restaurant(&self, restaurant: NewRestaurant) -> Result<Restaurant, EngineError> {
        validate_not_blank("Restaurant name", &restaurant.name)?;
        validate_not_blank("Location", &restaurant.location)?;
        validate_phone(restaurant.phone.as_deref())?;
        validate_email(restaurant.email.as_deref())?;
        let restaurant = self.db.insert_restaurant(restaurant).await?;
        info!("🗃️ Restaurant '{}' created with slug '{}'", restaurant.name, restaurant.slug);
        Ok(restaurant)
    }

    pub async fn fetch_restaurant(&self, restaurant_id: i64) -> Result<Option<Restaurant>, EngineError> {
        self.db.fetch_restaurant(restaurant_id).await
    }

    pub async fn fetch_restaurant_by_slug(&self, slug: &str) -> Result<Option<Restaurant>, EngineError> {
        self.db.fetch_restaurant_by_slug(slug).await
    }

    /// Inactive restaurants do not accept new orders. Existing orders are unaffected.
    pub async fn set_restaurant_active(&self, restaurant_id: i64, active: bool) -> Result<Restaurant, EngineError> {
        let restaurant = self.db.set_restaurant_active(restaurant_id, active).await?;
        info!("🗃️ Restaurant '{}' is now {}", restaurant.name, if active { "open" } else { "closed" });
        Ok(restaurant)
    }

    pub async fn add_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, EngineError> {
        validate_not_blank("Menu item name", &item.name)?;
        validate_menu_price(item.price)?;
        validate_preparation_time(item.preparation_time)?;
        let item = self.db.insert_menu_item(item).await?;
        debug!("🗃️ Menu item '{}' added to restaurant #{} at {}", item.name, item.restaurant_id, item.price);
        Ok(item)
    }

    pub async fn fetch_menu_item(&self, menu_item_id: i64) -> Result<Option<MenuItem>, EngineError> {
        self.db.fetch_menu_item(menu_item_id).await
    }

    /// Items already on an order keep the price they were added at.
    pub async fn update_menu_item_price(&self, menu_item_id: i64, price: Money) -> Result<MenuItem, EngineError> {
        validate_menu_price(price)?;
        let item = self.db.update_menu_item_price(menu_item_id, price).await?;
        debug!("🗃️ Menu item '{}' now costs {}", item.name, item.price);
        Ok(item)
    }

    /// Unavailable items cannot be added to orders.
    pub async fn set_menu_item_availability(&self, menu_item_id: i64, available: bool) -> Result<MenuItem, EngineError> {
        self.db.set_menu_item_availability(menu_item_id, available).await
    }

    /// The menu for a single restaurant, narrowed down by `filter`. Any restaurant id in `filter` is ignored.
    pub async fn menu_for_restaurant(
        &self,
        restaurant_id: i64,
        filter: MenuQueryFilter,
    ) -> Result<Vec<MenuItem>, EngineError> {
        let filter = MenuQueryFilter { restaurant_id: Some(restaurant_id), ..filter };
        self.db.fetch_menu(filter).await
    }

    pub async fn search_menu(&self, filter: MenuQueryFilter) -> Result<Vec<MenuItem>, EngineError> {
        self.db.fetch_menu(filter).await
    }
}

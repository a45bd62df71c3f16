use std::{collections::HashMap, fmt::Debug};

use chrono::{DateTime, Utc};
use cucumber::World;
use restaurant_engine::{
    db_types::{MenuItem, Order},
    EngineError,
    OrderManagement,
};

use crate::support::TestSystem;

#[derive(Default, World)]
pub struct LifecycleWorld {
    pub system: Option<TestSystem>,
    /// Orders by the name the scenario gives them
    pub orders: HashMap<String, i64>,
    pub last_error: Option<EngineError>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Debug for LifecycleWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LifecycleWorld (orders: {:?}, last error: {:?})", self.orders, self.last_error)
    }
}

impl LifecycleWorld {
    pub fn system(&self) -> &TestSystem {
        self.system.as_ref().expect("Test system not initialised")
    }

    pub fn menu_item(&self, name: &str) -> &MenuItem {
        let sys = self.system();
        match name {
            "Burger" => &sys.burger,
            "Salad" => &sys.salad,
            "Soda" => &sys.soda,
            _ => panic!("'{name}' is not on the menu"),
        }
    }

    pub fn order_id(&self, name: &str) -> i64 {
        *self.orders.get(name).unwrap_or_else(|| panic!("Order '{name}' has not been placed"))
    }

    pub async fn order(&self, name: &str) -> Order {
        let id = self.order_id(name);
        self.system().db.fetch_order(id).await.expect("Error fetching order").expect("Order does not exist")
    }

    pub fn record<T>(&mut self, result: Result<T, EngineError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                self.last_error = Some(e);
                None
            },
        }
    }
}

use crate::{
    db_types::{MenuItem, Money, NewMenuItem, NewRestaurant, NewUser, Restaurant, User},
    rms_api::catalog_objects::MenuQueryFilter,
    traits::EngineError,
};

/// Users, restaurants and their menus.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_user(&self, user: NewUser) -> Result<User, EngineError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, EngineError>;

    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, EngineError>;

    /// Creates a restaurant. The slug is derived from the name and made unique by appending `-1`, `-2`, etc.
    async fn insert_restaurant(&self, restaurant: NewRestaurant) -> Result<Restaurant, EngineError>;

    async fn fetch_restaurant(&self, restaurant_id: i64) -> Result<Option<Restaurant>, EngineError>;

    async fn fetch_restaurant_by_slug(&self, slug: &str) -> Result<Option<Restaurant>, EngineError>;

    async fn set_restaurant_active(&self, restaurant_id: i64, active: bool) -> Result<Restaurant, EngineError>;

    async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, EngineError>;

    async fn fetch_menu_item(&self, menu_item_id: i64) -> Result<Option<MenuItem>, EngineError>;

    /// Changing the price does not affect the unit price of items already on an order.
    async fn update_menu_item_price(&self, menu_item_id: i64, price: Money) -> Result<MenuItem, EngineError>;

    async fn set_menu_item_availability(&self, menu_item_id: i64, available: bool) -> Result<MenuItem, EngineError>;

    async fn fetch_menu(&self, query: MenuQueryFilter) -> Result<Vec<MenuItem>, EngineError>;
}

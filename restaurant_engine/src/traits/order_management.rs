use crate::{
    db_types::{Order, OrderItem, OrderNumber, OrderStatusHistory, Review},
    rms_api::order_objects::OrderQueryFilter,
    traits::{data_objects::ReviewStats, EngineError},
};

/// Read-only queries over orders and everything attached to them.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, EngineError>;

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, EngineError>;

    /// Line items for the order, in the order they were added.
    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, EngineError>;

    async fn fetch_order_item(&self, order_item_id: i64) -> Result<Option<OrderItem>, EngineError>;

    /// The status history for the order, oldest entry first.
    async fn fetch_status_history(&self, order_id: i64) -> Result<Vec<OrderStatusHistory>, EngineError>;

    async fn fetch_review_for_order(&self, order_id: i64) -> Result<Option<Review>, EngineError>;

    /// Fetches orders according to criteria specified in the `OrderQueryFilter`, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, EngineError>;

    async fn review_stats(&self, restaurant_id: i64) -> Result<ReviewStats, EngineError>;
}

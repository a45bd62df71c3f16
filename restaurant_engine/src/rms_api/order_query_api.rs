use std::fmt::Debug;

use crate::{
    db_types::{Order, OrderNumber, OrderStatusHistory, OrderStatusType},
    rms_api::order_objects::OrderQueryFilter,
    traits::{EngineError, OrderDetails, OrderManagement, ReviewStats},
};

/// Read-only views over orders, for order tracking and the kitchen and admin dashboards.
pub struct OrderQueryApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderQueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderQueryApi ({:?})", self.db)
    }
}

impl<B> OrderQueryApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, EngineError> {
        self.db.fetch_order(order_id).await
    }

    pub async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, EngineError> {
        self.db.fetch_order_by_number(number).await
    }

    /// The order with its items, status history and review, if any.
    pub async fn order_details(&self, order_id: i64) -> Result<Option<OrderDetails>, EngineError> {
        let Some(order) = self.db.fetch_order(order_id).await? else {
            return Ok(None);
        };
        let items = self.db.fetch_order_items(order_id).await?;
        let history = self.db.fetch_status_history(order_id).await?;
        let review = self.db.fetch_review_for_order(order_id).await?;
        Ok(Some(OrderDetails { order, items, history, review }))
    }

    /// The status history of the order, oldest first.
    pub async fn status_history(&self, order_id: i64) -> Result<Vec<OrderStatusHistory>, EngineError> {
        if self.db.fetch_order(order_id).await?.is_none() {
            return Err(EngineError::order_not_found(order_id));
        }
        self.db.fetch_status_history(order_id).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, EngineError> {
        self.db.search_orders(query).await
    }

    /// Orders at the restaurant that have not yet been delivered or cancelled.
    pub async fn active_orders_for_restaurant(&self, restaurant_id: i64) -> Result<Vec<Order>, EngineError> {
        let query = OrderQueryFilter::default().with_restaurant_id(restaurant_id).active_only();
        self.db.search_orders(query).await
    }

    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, EngineError> {
        self.db.search_orders(OrderQueryFilter::default().with_user_id(user_id)).await
    }

    pub async fn orders_with_status(
        &self,
        restaurant_id: i64,
        status: OrderStatusType,
    ) -> Result<Vec<Order>, EngineError> {
        let query = OrderQueryFilter::default().with_restaurant_id(restaurant_id).with_status(status);
        self.db.search_orders(query).await
    }

    pub async fn review_stats(&self, restaurant_id: i64) -> Result<ReviewStats, EngineError> {
        self.db.review_stats(restaurant_id).await
    }
}

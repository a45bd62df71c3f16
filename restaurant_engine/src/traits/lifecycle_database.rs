use chrono::{DateTime, Utc};

use crate::{
    db_types::{Money, NewOrder, NewOrderItem, NewReview, Order, OrderStatusType, Review},
    lifecycle::TransitionMode,
    traits::{
        data_objects::{FeeChanged, ItemChanged, ItemRemoved, OrderWithItems, StatusChanged},
        EngineError,
        OrderManagement,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the order lifecycle engine.
///
/// Every method that mutates an order runs in a single transaction that:
/// * takes the per-order lock first (by bumping the order's `version`), before reading anything,
/// * applies the change,
/// * recalculates the order totals from its items where the item set changed, and
/// * appends a status history entry for any status change.
///
/// Two concurrent modifications of the same order are therefore serialized, and never lose an update.
#[allow(async_fn_in_trait)]
pub trait LifecycleDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order in `pending` status, along with its creation history entry and line items, and computes the
    /// initial totals. Items for the same menu item are merged into a single line.
    ///
    /// ## Failure modes:
    /// - `ValidationError` if there are no items, the restaurant is inactive, or a menu item is unavailable or belongs
    ///   to a different restaurant.
    /// - `NotFound` if the user, restaurant or a menu item does not exist.
    async fn insert_order_with_items(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
    ) -> Result<OrderWithItems, EngineError>;

    /// Adds an item to the order. If the order already has a line for the same menu item, the quantity is added to it
    /// instead, and the original unit price is kept. Totals are recalculated.
    async fn add_item(&self, order_id: i64, item: NewOrderItem) -> Result<ItemChanged, EngineError>;

    /// Sets the quantity of an existing line item and recalculates the order totals.
    async fn update_item_quantity(&self, order_item_id: i64, quantity: i64) -> Result<ItemChanged, EngineError>;

    /// Removes a line item and recalculates the order totals. If no items remain, the order is cancelled
    /// automatically, bypassing the transition graph.
    async fn remove_item(&self, order_item_id: i64) -> Result<ItemRemoved, EngineError>;

    /// Moves the order to `new_status` and records the change in the status history, atomically.
    async fn transition_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        mode: TransitionMode,
        changed_by: Option<i64>,
        notes: Option<String>,
    ) -> Result<StatusChanged, EngineError>;

    /// Sets the delivery fee on an active order and recalculates the totals.
    async fn set_delivery_fee(&self, order_id: i64, fee: Money) -> Result<FeeChanged, EngineError>;

    /// Stores the review for a delivered order. There can only be one review per order.
    async fn insert_review(&self, order_id: i64, review: NewReview) -> Result<Review, EngineError>;

    /// Deletes the order, along with its items, status history and review. Returns the deleted order.
    async fn delete_order(&self, order_id: i64) -> Result<Order, EngineError>;

    /// Deletes all cancelled orders that were last updated before `older_than`. Returns the number of orders deleted.
    async fn purge_cancelled_orders(&self, older_than: DateTime<Utc>) -> Result<u64, EngineError>;

    /// Closes the database connection pool.
    async fn close(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

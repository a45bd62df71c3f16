use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem, OrderStatusHistory, OrderStatusType, Review};

/// A new order has been placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacedEvent {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderPlacedEvent {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }
}

/// The status of an order has changed. This includes automatic cancellations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatusType,
    pub order: Order,
    pub history: OrderStatusHistory,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatusType, order: Order, history: OrderStatusHistory) -> Self {
        Self { old_status, order, history }
    }

    pub fn new_status(&self) -> OrderStatusType {
        self.order.status
    }
}

/// The items or delivery fee of an order have changed, and with them the totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderModifiedEvent {
    pub old_order: Order,
    pub new_order: Order,
}

impl OrderModifiedEvent {
    pub fn new(old_order: Order, new_order: Order) -> Self {
        Self { old_order, new_order }
    }

    pub fn total_changed(&self) -> bool {
        self.old_order.total != self.new_order.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmittedEvent {
    pub order: Order,
    pub review: Review,
}

impl ReviewSubmittedEvent {
    pub fn new(order: Order, review: Review) -> Self {
        Self { order, review }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderPlaced(OrderPlacedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    OrderModified(OrderModifiedEvent),
    ReviewSubmitted(ReviewSubmittedEvent),
}

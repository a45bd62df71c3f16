use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Order, OrderItem, OrderStatusHistory, Review};

/// An order together with all of its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn find_item_for_menu_item(&self, menu_item_id: i64) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.menu_item_id == menu_item_id)
    }
}

/// The result of adding an item to an order, or changing its quantity.
///
/// `order` carries the recalculated totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChanged {
    pub old_order: Order,
    pub order: Order,
    pub item: OrderItem,
    /// True if the item was merged into an existing line for the same menu item.
    pub merged: bool,
}

/// The result of removing an item from an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub old_order: Order,
    pub order: Order,
    pub removed: OrderItem,
    /// The history entry for the automatic cancellation, if this was the last item on the order.
    pub cancellation: Option<OrderStatusHistory>,
}

impl ItemRemoved {
    pub fn order_was_cancelled(&self) -> bool {
        self.cancellation.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub old_order: Order,
    pub order: Order,
    pub history: OrderStatusHistory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeChanged {
    pub old_fee: Money,
    pub order: Order,
}

/// Review statistics for a restaurant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub restaurant_id: i64,
    pub review_count: i64,
    /// `None` when the restaurant has no reviews yet.
    pub average_rating: Option<f64>,
    /// Number of reviews for each star rating. Index 0 holds the 1-star count.
    pub rating_counts: [i64; 5],
}

impl ReviewStats {
    pub fn new(restaurant_id: i64, rating_counts: [i64; 5]) -> Self {
        let review_count = rating_counts.iter().sum::<i64>();
        let weighted = rating_counts.iter().zip(1i64..).map(|(n, stars)| n * stars).sum::<i64>();
        #[allow(clippy::cast_precision_loss)]
        let average_rating = (review_count > 0).then(|| weighted as f64 / review_count as f64);
        Self { restaurant_id, review_count, average_rating, rating_counts }
    }

    pub fn count_for(&self, stars: i64) -> i64 {
        usize::try_from(stars - 1).ok().and_then(|i| self.rating_counts.get(i).copied()).unwrap_or(0)
    }
}

/// Everything the engine holds about one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<OrderStatusHistory>,
    pub review: Option<Review>,
}

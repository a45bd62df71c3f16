use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{Money, NewOrder, NewOrderItem, NewReview, Order, OrderStatusHistory, OrderStatusType, OrderType, Review},
    events::{EventProducers, OrderModifiedEvent, OrderPlacedEvent, OrderStatusChangedEvent, ReviewSubmittedEvent},
    helpers::{validate_delivery_fee, validate_not_blank, validate_phone, validate_quantity, validate_rating},
    lifecycle::TransitionMode,
    traits::{EngineError, ItemChanged, ItemRemoved, LifecycleDatabase, OrderWithItems, StatusChanged},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: placing orders, changing their items, moving them
/// through the status lifecycle, and reviewing them once delivered.
///
/// Every call is a single transaction in the backend. Once it has committed, the corresponding event is published to
/// the event hooks. Publishing never blocks and never fails the call.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderFlowApi<B>
where B: LifecycleDatabase
{
    /// Places a new order in `pending` status, with the given items.
    ///
    /// Items for the same menu item are merged into a single line. Each line takes its unit price from the menu at
    /// this moment.
    ///
    /// ## Failure modes:
    /// - `ValidationError` if there are no items, a quantity is out of range, a delivery order has no address, or the
    ///   contact phone number is malformed.
    /// - `NotFound` if the user, restaurant or a menu item does not exist.
    pub async fn place_order(&self, order: NewOrder, items: Vec<NewOrderItem>) -> Result<OrderWithItems, EngineError> {
        if items.is_empty() {
            return Err(EngineError::validation("An order must contain at least one item"));
        }
        for item in &items {
            validate_quantity(item.quantity)?;
        }
        if order.order_type == OrderType::Delivery {
            validate_not_blank("Delivery address", order.delivery_address.as_deref().unwrap_or_default())?;
        }
        validate_phone(order.phone_number.as_deref())?;
        validate_delivery_fee(order.delivery_fee)?;
        let placed = self.db.insert_order_with_items(order, items).await?;
        debug!(
            "🔄️📦️ Order [{}] placed for user #{} at restaurant #{}",
            placed.order.order_number, placed.order.user_id, placed.order.restaurant_id
        );
        self.producers.publish_order_placed(OrderPlacedEvent::new(placed.order.clone(), placed.items.clone()));
        Ok(placed)
    }

    /// Adds `quantity` of a menu item to the order, merging with an existing line for the same menu item.
    pub async fn add_item(
        &self,
        order_id: i64,
        menu_item_id: i64,
        quantity: i64,
        special_instructions: Option<String>,
    ) -> Result<ItemChanged, EngineError> {
        validate_quantity(quantity)?;
        let mut item = NewOrderItem::new(menu_item_id, quantity);
        item.special_instructions = special_instructions;
        let changed = self.db.add_item(order_id, item).await?;
        debug!(
            "🔄️🍽️ Order [{}]: {quantity} x menu item #{menu_item_id} added. New total: {}",
            changed.order.order_number, changed.order.total
        );
        self.publish_modified(&changed.old_order, &changed.order);
        Ok(changed)
    }

    pub async fn update_item_quantity(&self, order_item_id: i64, quantity: i64) -> Result<ItemChanged, EngineError> {
        validate_quantity(quantity)?;
        let changed = self.db.update_item_quantity(order_item_id, quantity).await?;
        debug!(
            "🔄️🍽️ Order [{}]: item #{order_item_id} quantity is now {quantity}. New total: {}",
            changed.order.order_number, changed.order.total
        );
        self.publish_modified(&changed.old_order, &changed.order);
        Ok(changed)
    }

    /// Removes a line item. Removing the last item on an order cancels it.
    pub async fn remove_item(&self, order_item_id: i64) -> Result<ItemRemoved, EngineError> {
        let removed = self.db.remove_item(order_item_id).await?;
        debug!(
            "🔄️🍽️ Order [{}]: item #{order_item_id} removed. New total: {}",
            removed.order.order_number, removed.order.total
        );
        self.publish_modified(&removed.old_order, &removed.order);
        if let Some(entry) = &removed.cancellation {
            info!("🔄️❌️ Order [{}] was cancelled because its last item was removed", removed.order.order_number);
            let event = OrderStatusChangedEvent::new(removed.old_order.status, removed.order.clone(), entry.clone());
            self.producers.publish_status_changed(event);
        }
        Ok(removed)
    }

    /// Moves the order to `new_status`, following the transition graph.
    ///
    /// ## Failure modes:
    /// - `InvalidTransition` if the order is already in `new_status`, or the graph has no edge from the current status
    ///   to `new_status`.
    pub async fn change_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        changed_by: Option<i64>,
        notes: Option<String>,
    ) -> Result<OrderStatusHistory, EngineError> {
        let changed = self.db.transition_status(order_id, new_status, TransitionMode::Strict, changed_by, notes).await?;
        Ok(self.status_changed(changed))
    }

    /// Cancels the order. Only pending and confirmed orders can be cancelled.
    pub async fn cancel_order(
        &self,
        order_id: i64,
        changed_by: Option<i64>,
        reason: Option<String>,
    ) -> Result<OrderStatusHistory, EngineError> {
        self.change_status(order_id, OrderStatusType::Cancelled, changed_by, reason).await
    }

    /// Administrative override: moves the order to any status other than its current one, ignoring the transition
    /// graph. The change is recorded in the status history like any other.
    pub async fn override_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        changed_by: Option<i64>,
        notes: Option<String>,
    ) -> Result<OrderStatusHistory, EngineError> {
        let changed =
            self.db.transition_status(order_id, new_status, TransitionMode::Override, changed_by, notes).await?;
        warn!(
            "🔄️⚠️ Order [{}] status overridden from {} to {} by {:?}",
            changed.order.order_number, changed.old_order.status, changed.order.status, changed.history.changed_by
        );
        Ok(self.status_changed(changed))
    }

    /// Sets the delivery fee, as calculated by the delivery service, and recalculates the order totals.
    pub async fn set_delivery_fee(&self, order_id: i64, fee: Money) -> Result<Order, EngineError> {
        validate_delivery_fee(fee)?;
        let changed = self.db.set_delivery_fee(order_id, fee).await?;
        debug!(
            "🔄️🚚️ Order [{}] delivery fee changed from {} to {}. New total: {}",
            changed.order.order_number, changed.old_fee, fee, changed.order.total
        );
        self.publish_modified_fee(changed.old_fee, &changed.order);
        Ok(changed.order)
    }

    /// Leaves a review for a delivered order. Each order can be reviewed once.
    pub async fn submit_review(
        &self,
        order_id: i64,
        rating: i64,
        comment: Option<String>,
    ) -> Result<Review, EngineError> {
        validate_rating(rating)?;
        let review = NewReview { rating, comment };
        let review = self.db.insert_review(order_id, review).await?;
        debug!("🔄️⭐️ Order #{order_id} received a {rating}-star review");
        if !self.producers.review_submitted_producer.is_empty() {
            match self.db.fetch_order(order_id).await {
                Ok(Some(order)) => self.producers.publish_review_submitted(ReviewSubmittedEvent::new(order, review.clone())),
                Ok(None) => warn!("🔄️⭐️ Order #{order_id} disappeared before the review event could be sent"),
                Err(e) => warn!("🔄️⭐️ Could not fetch order #{order_id} for the review event. {e}"),
            }
        }
        Ok(review)
    }

    /// Deletes the order along with its items, history and review. This cannot be undone.
    pub async fn delete_order(&self, order_id: i64) -> Result<Order, EngineError> {
        let order = self.db.delete_order(order_id).await?;
        warn!("🔄️🗑️ Order [{}] has been deleted", order.order_number);
        Ok(order)
    }

    /// Deletes cancelled orders that have not been touched since `older_than`.
    pub async fn purge_cancelled_orders(&self, older_than: DateTime<Utc>) -> Result<u64, EngineError> {
        let count = self.db.purge_cancelled_orders(older_than).await?;
        info!("🔄️🗑️ Purged {count} cancelled orders");
        Ok(count)
    }

    fn status_changed(&self, changed: StatusChanged) -> OrderStatusHistory {
        let StatusChanged { old_order, order, history } = changed;
        info!("🔄️🚦️ Order [{}] is now {}", order.order_number, order.status);
        let event = OrderStatusChangedEvent::new(old_order.status, order, history.clone());
        self.producers.publish_status_changed(event);
        history
    }

    fn publish_modified(&self, old_order: &Order, new_order: &Order) {
        self.producers.publish_order_modified(OrderModifiedEvent::new(old_order.clone(), new_order.clone()));
    }

    fn publish_modified_fee(&self, old_fee: Money, new_order: &Order) {
        let mut old_order = new_order.clone();
        old_order.delivery_fee = old_fee;
        self.publish_modified(&old_order, new_order);
    }
}

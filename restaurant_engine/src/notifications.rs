//! Customer and restaurant notifications.
//!
//! Notifications are driven from the post-commit event hooks (see [`notification_hooks`]), so a slow or failing
//! notification channel never affects the order that triggered it. Failures are logged and dropped.
//!
//! The engine does not know how to reach customers or restaurants. Integrators provide a [`NotificationSender`] and
//! route each message by its [`Recipient`]. [`LogNotificationSender`] is a sender that writes the notification payload
//! to the log.
use std::{fmt::Display, future::Future, sync::Arc};

use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{Order, OrderStatusType},
    config::EngineConfig,
    events::{EventHandlers, EventHooks, OrderPlacedEvent, OrderStatusChangedEvent},
};

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Could not deliver notification: {0}")]
    DeliveryFailed(String),
    #[error("Could not build notification payload: {0}")]
    PayloadError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    Customer,
    Restaurant,
}

/// The moments in an order's life that someone is told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    OrderPlaced,
    /// Sent to the restaurant when a customer places an order with it.
    NewOrderReceived,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl NotificationEvent {
    /// The notification, if any, for an order that has just entered `status`.
    pub fn for_status(status: OrderStatusType) -> Option<Self> {
        match status {
            OrderStatusType::Ready => Some(Self::Ready),
            OrderStatusType::OutForDelivery => Some(Self::OutForDelivery),
            OrderStatusType::Delivered => Some(Self::Delivered),
            OrderStatusType::Cancelled => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn recipient(&self) -> Recipient {
        match self {
            Self::NewOrderReceived => Recipient::Restaurant,
            _ => Recipient::Customer,
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Self::OrderPlaced => "Your order has been received",
            Self::NewOrderReceived => "New order received",
            Self::Ready => "Your order is ready",
            Self::OutForDelivery => "Your order is on its way",
            Self::Delivered => "Your order has been delivered",
            Self::Cancelled => "Your order has been cancelled",
        }
    }
}

impl Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.headline())
    }
}

/// The payload handed to a notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub event: NotificationEvent,
    pub recipient: Recipient,
    pub user_id: i64,
    pub restaurant_id: i64,
    pub order_number: String,
    pub subject: String,
    pub body: String,
}

impl NotificationMessage {
    pub fn new(order: &Order, event: NotificationEvent) -> Self {
        let subject = format!("{} - {}", event.headline(), order.order_number);
        let body = match event {
            NotificationEvent::OrderPlaced => {
                format!("Order #{} has been placed. Total: {}", order.order_number, order.total)
            },
            NotificationEvent::NewOrderReceived => format!(
                "New {} order #{} from user #{}. Total: {}. Status: {}",
                order.order_type, order.order_number, order.user_id, order.total, order.status
            ),
            NotificationEvent::Cancelled => format!("Order #{} has been cancelled.", order.order_number),
            _ => format!("{}. Order: #{}", event.headline(), order.order_number),
        };
        Self {
            event,
            recipient: event.recipient(),
            user_id: order.user_id,
            restaurant_id: order.restaurant_id,
            order_number: order.order_number.to_string(),
            subject,
            body,
        }
    }
}

/// A channel that can deliver order notifications to customers and restaurants.
pub trait NotificationSender: Clone + Send + Sync + 'static {
    fn notify(&self, order: &Order, event: NotificationEvent)
        -> impl Future<Output = Result<(), NotificationError>> + Send;
}

/// Writes every notification to the log as JSON.
#[derive(Debug, Clone, Default)]
pub struct LogNotificationSender;

impl NotificationSender for LogNotificationSender {
    async fn notify(&self, order: &Order, event: NotificationEvent) -> Result<(), NotificationError> {
        let message = NotificationMessage::new(order, event);
        let payload = serde_json::to_string(&message).map_err(|e| NotificationError::PayloadError(e.to_string()))?;
        info!("🔔️ {payload}");
        Ok(())
    }
}

async fn deliver<S: NotificationSender>(sender: &S, order: &Order, event: NotificationEvent) {
    match sender.notify(order, event).await {
        Ok(()) => debug!("🔔️ Sent '{event}' notification for order {}", order.order_number),
        Err(e) => warn!("🔔️ Could not send '{event}' notification for order {}. {e}", order.order_number),
    }
}

/// Builds event hooks that notify the customer when an order is placed, and when it becomes ready, goes out for
/// delivery, is delivered or is cancelled. The restaurant is also told about every new order.
pub fn notification_hooks<S: NotificationSender>(sender: S) -> EventHooks {
    let sender = Arc::new(sender);
    let mut hooks = EventHooks::default();
    let on_placed = Arc::clone(&sender);
    hooks.on_order_placed(move |ev: OrderPlacedEvent| {
        let sender = Arc::clone(&on_placed);
        Box::pin(async move {
            deliver(sender.as_ref(), &ev.order, NotificationEvent::OrderPlaced).await;
            deliver(sender.as_ref(), &ev.order, NotificationEvent::NewOrderReceived).await;
        })
    });
    hooks.on_status_changed(move |ev: OrderStatusChangedEvent| {
        let sender = Arc::clone(&sender);
        Box::pin(async move {
            match NotificationEvent::for_status(ev.new_status()) {
                Some(event) => deliver(sender.as_ref(), &ev.order, event).await,
                None => trace!("🔔️ No notification for order {} entering {}", ev.order.order_number, ev.new_status()),
            }
        })
    });
    hooks
}

/// Builds the notification event handlers for `config`, or `None` if notifications are switched off.
///
/// Start the handlers with [`EventHandlers::start_handlers`] and pass their producers to the order flow API.
pub fn create_notification_handlers<S: NotificationSender>(config: &EngineConfig, sender: S) -> Option<EventHandlers> {
    if !config.notifications_enabled {
        info!("🔔️ Notifications are disabled");
        return None;
    }
    debug!("🔔️ Notification queues hold {} events", config.event_buffer_size);
    Some(EventHandlers::new(config.event_buffer_size, notification_hooks(sender)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_customer_facing_statuses_notify() {
        assert_eq!(NotificationEvent::for_status(OrderStatusType::Pending), None);
        assert_eq!(NotificationEvent::for_status(OrderStatusType::Confirmed), None);
        assert_eq!(NotificationEvent::for_status(OrderStatusType::Preparing), None);
        assert_eq!(NotificationEvent::for_status(OrderStatusType::Ready), Some(NotificationEvent::Ready));
        assert_eq!(
            NotificationEvent::for_status(OrderStatusType::OutForDelivery),
            Some(NotificationEvent::OutForDelivery)
        );
        assert_eq!(NotificationEvent::for_status(OrderStatusType::Delivered), Some(NotificationEvent::Delivered));
        assert_eq!(NotificationEvent::for_status(OrderStatusType::Cancelled), Some(NotificationEvent::Cancelled));
    }

    #[test]
    fn hooks_are_wired() {
        let hooks = notification_hooks(LogNotificationSender);
        assert!(hooks.on_order_placed.is_some());
        assert!(hooks.on_status_changed.is_some());
        assert!(hooks.on_order_modified.is_none());
        assert!(hooks.on_review_submitted.is_none());
    }

    #[test]
    fn new_orders_go_to_the_restaurant() {
        assert_eq!(NotificationEvent::NewOrderReceived.recipient(), Recipient::Restaurant);
        assert_eq!(NotificationEvent::OrderPlaced.recipient(), Recipient::Customer);
        assert_eq!(NotificationEvent::Cancelled.recipient(), Recipient::Customer);
    }

    #[test]
    fn handlers_follow_config() {
        let disabled = EngineConfig::default().with_notifications(false);
        assert!(create_notification_handlers(&disabled, LogNotificationSender).is_none());
        let enabled = EngineConfig::default().with_event_buffer_size(8);
        let handlers = create_notification_handlers(&enabled, LogNotificationSender).expect("Handlers are enabled");
        let producers = handlers.producers();
        assert_eq!(producers.order_placed_producer.len(), 1);
        assert_eq!(producers.status_changed_producer.len(), 1);
        assert!(producers.order_modified_producer.is_empty());
    }
}

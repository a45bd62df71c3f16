//! # Order status lifecycle
//!
//! ```text
//!   pending ─► confirmed ─► preparing ─► ready ─► out_for_delivery ─► delivered
//!      │           │
//!      └───────────┴──► cancelled
//! ```
//!
//! `delivered` and `cancelled` are terminal. Skipping ahead is not allowed.
//!
//! [`plan_transition`] validates a requested change against the current order and works out the side effects (delivery
//! timestamps) without touching the database. Backends persist the resulting [`StatusChange`] together with its history
//! entry in a single transaction.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderStatusType},
    traits::EngineError,
};

/// Minutes added to the confirmation time to give the initial delivery estimate.
pub const ESTIMATED_DELIVERY_MINUTES: i64 = 45;

pub const ORDER_CREATED_NOTE: &str = "Order created";
pub const AUTO_CANCEL_NOTE: &str = "Order cancelled automatically: no items remain";

impl OrderStatusType {
    /// The statuses that can legally follow this one.
    pub fn allowed_transitions(&self) -> &'static [OrderStatusType] {
        use OrderStatusType::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Preparing, Cancelled],
            Preparing => &[Ready],
            Ready => &[OutForDelivery],
            OutForDelivery => &[Delivered],
            Delivered | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Delivered | OrderStatusType::Cancelled)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn can_be_cancelled(&self) -> bool {
        self.can_transition_to(OrderStatusType::Cancelled)
    }
}

/// How strictly a status change is checked against the transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionMode {
    /// Only edges in the transition graph are allowed.
    Strict,
    /// Administrative override. Any status may follow any other, except itself.
    Override,
    /// Engine-initiated changes, i.e. cancelling an order that has run out of items.
    System,
}

/// A validated status change, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub from: OrderStatusType,
    pub to: OrderStatusType,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub changed_by: Option<i64>,
    pub notes: String,
    pub timestamp: DateTime<Utc>,
}

/// Items, delivery fees and the like can only be changed while the order is active.
pub fn ensure_modifiable(order: &Order) -> Result<(), EngineError> {
    if order.status.is_terminal() {
        return Err(EngineError::invalid_state(format!(
            "Order {} is {} and can no longer be modified",
            order.order_number, order.status
        )));
    }
    Ok(())
}

/// Checks that `order` may move to `to` under the given `mode`, and works out the resulting delivery timestamps.
///
/// * Moving to the current status is always an `InvalidTransition`.
/// * In `Strict` mode, the edge must be in the transition graph.
/// * Entering `confirmed` sets the estimated delivery time to `now + 45min` if it is not already set.
/// * Entering `delivered` sets the actual delivery time to `now` if it is not already set.
pub fn plan_transition(
    order: &Order,
    to: OrderStatusType,
    mode: TransitionMode,
    changed_by: Option<i64>,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<StatusChange, EngineError> {
    let from = order.status;
    if from == to {
        return Err(EngineError::InvalidTransition { from, to });
    }
    if mode == TransitionMode::Strict && !from.can_transition_to(to) {
        return Err(EngineError::InvalidTransition { from, to });
    }
    let estimated_delivery_time = match (to, order.estimated_delivery_time) {
        (OrderStatusType::Confirmed, None) => Some(now + Duration::minutes(ESTIMATED_DELIVERY_MINUTES)),
        (_, eta) => eta,
    };
    let actual_delivery_time = match (to, order.actual_delivery_time) {
        (OrderStatusType::Delivered, None) => Some(now),
        (_, t) => t,
    };
    let notes = match (mode, notes) {
        (_, Some(n)) => n,
        (TransitionMode::System, None) => AUTO_CANCEL_NOTE.to_string(),
        (_, None) => String::default(),
    };
    Ok(StatusChange { from, to, estimated_delivery_time, actual_delivery_time, changed_by, notes, timestamp: now })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::{Money, OrderNumber, OrderType};

    fn order_with_status(status: OrderStatusType) -> Order {
        let now = Utc::now();
        Order {
            id: 1,
            order_number: OrderNumber("ORD-0000ABCD".into()),
            user_id: 1,
            restaurant_id: 1,
            subtotal: Money::from_units(10),
            tax_amount: Money::from_cents(80),
            delivery_fee: Money::zero(),
            total: Money::from_cents(1_080),
            status,
            order_type: OrderType::Pickup,
            delivery_address: None,
            delivery_notes: String::new(),
            phone_number: None,
            estimated_delivery_time: None,
            actual_delivery_time: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn graph() {
        use OrderStatusType::*;
        let edges = [
            (Pending, Confirmed),
            (Pending, Cancelled),
            (Confirmed, Preparing),
            (Confirmed, Cancelled),
            (Preparing, Ready),
            (Ready, OutForDelivery),
            (OutForDelivery, Delivered),
        ];
        for from in OrderStatusType::ALL {
            for to in OrderStatusType::ALL {
                assert_eq!(from.can_transition_to(to), edges.contains(&(from, to)), "{from} -> {to}");
            }
        }
        assert!(Pending.can_be_cancelled());
        assert!(Confirmed.can_be_cancelled());
        assert!(!Preparing.can_be_cancelled());
        assert!(Delivered.is_terminal() && Cancelled.is_terminal());
        assert!(OutForDelivery.is_active());
    }

    #[test]
    fn no_op_is_rejected_in_every_mode() {
        let order = order_with_status(OrderStatusType::Preparing);
        for mode in [TransitionMode::Strict, TransitionMode::Override, TransitionMode::System] {
            let err = plan_transition(&order, OrderStatusType::Preparing, mode, None, None, Utc::now()).unwrap_err();
            assert!(matches!(err, EngineError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn terminal_states_are_final() {
        for status in [OrderStatusType::Delivered, OrderStatusType::Cancelled] {
            let order = order_with_status(status);
            for to in OrderStatusType::ALL {
                let res = plan_transition(&order, to, TransitionMode::Strict, None, None, Utc::now());
                assert!(matches!(res, Err(EngineError::InvalidTransition { .. })));
            }
        }
    }

    #[test]
    fn skip_ahead_needs_an_override() {
        let order = order_with_status(OrderStatusType::Pending);
        let res = plan_transition(&order, OrderStatusType::Ready, TransitionMode::Strict, None, None, Utc::now());
        assert_eq!(res.unwrap_err(), EngineError::InvalidTransition {
            from: OrderStatusType::Pending,
            to: OrderStatusType::Ready
        });
        let change = plan_transition(
            &order,
            OrderStatusType::Ready,
            TransitionMode::Override,
            Some(9),
            Some("Kitchen fast-tracked".into()),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(change.to, OrderStatusType::Ready);
        assert_eq!(change.changed_by, Some(9));
        assert_eq!(change.notes, "Kitchen fast-tracked");
    }

    #[test]
    fn confirmation_sets_estimate_once() {
        let now = Utc::now();
        let mut order = order_with_status(OrderStatusType::Pending);
        let change = plan_transition(&order, OrderStatusType::Confirmed, TransitionMode::Strict, None, None, now).unwrap();
        assert_eq!(change.estimated_delivery_time, Some(now + Duration::minutes(45)));
        assert_eq!(change.actual_delivery_time, None);

        order.status = OrderStatusType::Confirmed;
        order.estimated_delivery_time = change.estimated_delivery_time;
        let later = now + Duration::minutes(10);
        let change =
            plan_transition(&order, OrderStatusType::Preparing, TransitionMode::Strict, None, None, later).unwrap();
        assert_eq!(change.estimated_delivery_time, Some(now + Duration::minutes(45)));
    }

    #[test]
    fn delivery_sets_actual_time() {
        let now = Utc::now();
        let order = order_with_status(OrderStatusType::OutForDelivery);
        let change = plan_transition(&order, OrderStatusType::Delivered, TransitionMode::Strict, None, None, now).unwrap();
        assert_eq!(change.actual_delivery_time, Some(now));
    }

    #[test]
    fn terminal_orders_are_frozen() {
        assert!(ensure_modifiable(&order_with_status(OrderStatusType::Ready)).is_ok());
        let err = ensure_modifiable(&order_with_status(OrderStatusType::Delivered)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
        assert!(ensure_modifiable(&order_with_status(OrderStatusType::Cancelled)).is_err());
    }

    #[test]
    fn system_cancellation_note() {
        let order = order_with_status(OrderStatusType::Preparing);
        let change =
            plan_transition(&order, OrderStatusType::Cancelled, TransitionMode::System, None, None, Utc::now()).unwrap();
        assert_eq!(change.notes, AUTO_CANCEL_NOTE);
    }
}

//! Order totals computation.
//!
//! The figures stored on an order (`subtotal`, `tax_amount`, `delivery_fee`, `total`) are always derived from its line
//! items and the delivery fee using [`recompute`]. The function is pure, so the backend can call it inside the same
//! transaction as the item mutation that triggered it.
use rms_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem};

/// The flat sales tax rate, in basis points (8%).
pub const TAX_RATE_BPS: i64 = 800;

/// An order total can never drop below one cent, even for an order with no items.
pub const MINIMUM_ORDER_TOTAL: Money = Money::from_cents(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Computes the totals for a set of line items and a delivery fee.
    pub fn from_items<'a, I>(items: I, delivery_fee: Money) -> Self
    where I: IntoIterator<Item = &'a OrderItem> {
        let subtotal = items.into_iter().map(OrderItem::subtotal).sum::<Money>();
        let tax_amount = tax_for(subtotal);
        let total = (subtotal + tax_amount + delivery_fee).max(MINIMUM_ORDER_TOTAL);
        Self { subtotal, tax_amount, delivery_fee, total }
    }

    /// True if these are the figures currently stored on the order.
    pub fn matches(&self, order: &Order) -> bool {
        self.subtotal == order.subtotal &&
            self.tax_amount == order.tax_amount &&
            self.delivery_fee == order.delivery_fee &&
            self.total == order.total
    }
}

pub fn tax_for(subtotal: Money) -> Money {
    subtotal.apply_rate_bps(TAX_RATE_BPS)
}

/// Recomputes the totals for `order` from `items`, keeping the order's current delivery fee.
///
/// Idempotent: calling it twice on the same inputs gives identical results.
pub fn recompute(order: &Order, items: &[OrderItem]) -> OrderTotals {
    OrderTotals::from_items(items, order.delivery_fee)
}

/// Checks the stored totals of an order against its items.
pub fn is_consistent(order: &Order, items: &[OrderItem]) -> bool {
    recompute(order, items).matches(order)
}

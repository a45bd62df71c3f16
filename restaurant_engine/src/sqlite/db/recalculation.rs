//! The recalculation step that follows every line item mutation.
//!
//! These functions run inside the transaction of the item mutation that triggered them, after the order has been
//! locked. They never create or delete items themselves.
use chrono::{DateTime, Utc};
use log::{debug, info};
use sqlx::SqliteConnection;

use super::{order_items, orders, status_history};
use crate::{
    db_types::{Order, OrderStatusHistory, OrderStatusType},
    lifecycle::{plan_transition, StatusChange, TransitionMode},
    totals::recompute,
    traits::EngineError,
};

/// Recomputes the order totals from its current items and writes them back. The order status is not touched.
pub async fn recalculate_totals(order_id: i64, conn: &mut SqliteConnection) -> Result<Order, EngineError> {
    let order = orders::fetch_existing_order(order_id, conn).await?;
    let items = order_items::fetch_items_for_order(order_id, conn).await?;
    let totals = recompute(&order, &items);
    if totals.matches(&order) {
        return Ok(order);
    }
    let order = orders::update_totals(order_id, &totals, conn).await?;
    debug!(
        "🗃️ Order [{}] totals recalculated. Subtotal: {}, tax: {}, fee: {}, total: {}",
        order.order_number, order.subtotal, order.tax_amount, order.delivery_fee, order.total
    );
    Ok(order)
}

/// Recalculates the totals after an item was removed. If the order has no items left, it is cancelled, bypassing the
/// transition graph, and the history entry for the cancellation is returned.
pub async fn recalculate_after_removal(
    order_id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(Order, Option<OrderStatusHistory>), EngineError> {
    let order = recalculate_totals(order_id, conn).await?;
    let remaining = order_items::fetch_items_for_order(order_id, conn).await?;
    if !remaining.is_empty() || order.status == OrderStatusType::Cancelled {
        return Ok((order, None));
    }
    let change = plan_transition(&order, OrderStatusType::Cancelled, TransitionMode::System, None, None, now)?;
    let (order, entry) = apply_status_change(&order, &change, conn).await?;
    info!("🗃️ Order [{}] has no items left and has been cancelled", order.order_number);
    Ok((order, Some(entry)))
}

/// Writes a planned status change and its history entry.
pub async fn apply_status_change(
    order: &Order,
    change: &StatusChange,
    conn: &mut SqliteConnection,
) -> Result<(Order, OrderStatusHistory), EngineError> {
    let updated = orders::update_status(order.id, change, conn).await?;
    let entry = status_history::insert_history(
        order.id,
        Some(change.from),
        change.to,
        change.changed_by,
        &change.notes,
        change.timestamp,
        conn,
    )
    .await?;
    Ok((updated, entry))
}

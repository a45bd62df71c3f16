use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Money, NewOrder, Order, OrderNumber, OrderStatusType, OrderType},
    lifecycle::StatusChange,
    rms_api::order_objects::OrderQueryFilter,
    totals::OrderTotals,
    traits::EngineError,
};

/// Takes the write lock for the order by bumping its version.
///
/// This must be the first statement of every transaction that mutates an order. SQLite grants the database write lock
/// to the first writer, so concurrent transactions touching the same order are serialized from this point on, and
/// nothing read afterwards can be stale.
///
/// Returns `NotFound` if the order does not exist.
pub async fn lock_order(order_id: i64, now: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<(), EngineError> {
    let result = sqlx::query("UPDATE orders SET version = version + 1, updated_at = $1 WHERE id = $2")
        .bind(now)
        .bind(order_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(EngineError::order_not_found(order_id));
    }
    trace!("🗃️ Order #{order_id} locked for update");
    Ok(())
}

/// Inserts a new order in `pending` status with zero totals. The caller adds the items and recalculates.
///
/// The delivery address is only stored for delivery orders.
pub async fn insert_order(
    order: NewOrder,
    order_number: &OrderNumber,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let delivery_address = match order.order_type {
        OrderType::Delivery => order.delivery_address.map(|a| a.trim().to_string()),
        OrderType::Pickup | OrderType::DineIn => None,
    };
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                user_id,
                restaurant_id,
                subtotal,
                tax_amount,
                delivery_fee,
                total,
                status,
                order_type,
                delivery_address,
                delivery_notes,
                phone_number,
                version,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, 0, 0, $4, $5, $6, $7, $8, $9, $10, 1, $11, $11)
            RETURNING *;
        "#,
    )
    .bind(order_number)
    .bind(order.user_id)
    .bind(order.restaurant_id)
    .bind(order.delivery_fee)
    .bind(OrderTotals::from_items(std::iter::empty(), order.delivery_fee).total)
    .bind(OrderStatusType::Pending)
    .bind(order.order_type)
    .bind(delivery_address)
    .bind(order.delivery_notes)
    .bind(order.phone_number)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order [{}] inserted with id {}", order.order_number, order.id);
    Ok(order)
}

pub async fn order_number_exists(number: &OrderNumber, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE order_number = $1")
        .bind(number)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// Like [`fetch_order`], but a missing order is an error.
pub async fn fetch_existing_order(id: i64, conn: &mut SqliteConnection) -> Result<Order, EngineError> {
    fetch_order(id, conn).await?.ok_or_else(|| EngineError::order_not_found(id))
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_number = $1").bind(number).fetch_optional(conn).await
}

/// Writes recalculated totals to the order. The status is not touched.
pub async fn update_totals(
    order_id: i64,
    totals: &OrderTotals,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET subtotal = $1, tax_amount = $2, delivery_fee = $3, total = $4
            WHERE id = $5
            RETURNING *;
        "#,
    )
    .bind(totals.subtotal)
    .bind(totals.tax_amount)
    .bind(totals.delivery_fee)
    .bind(totals.total)
    .bind(order_id)
    .fetch_one(conn)
    .await
}

/// Writes the new delivery fee only. The caller must recalculate the totals in the same transaction.
pub async fn update_delivery_fee(order_id: i64, fee: Money, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET delivery_fee = $1 WHERE id = $2").bind(fee).bind(order_id).execute(conn).await?;
    Ok(())
}

/// Writes the status and delivery timestamps from a planned status change. The history entry is written separately.
pub async fn update_status(
    order_id: i64,
    change: &StatusChange,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, estimated_delivery_time = $2, actual_delivery_time = $3, updated_at = $4
            WHERE id = $5
            RETURNING *;
        "#,
    )
    .bind(change.to)
    .bind(change.estimated_delivery_time)
    .bind(change.actual_delivery_time)
    .bind(change.timestamp)
    .bind(order_id)
    .fetch_one(conn)
    .await
}

/// Deletes the order. Items, status history and review are removed by the cascade.
pub async fn delete_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("DELETE FROM orders WHERE id = $1 RETURNING *").bind(order_id).fetch_optional(conn).await
}

pub async fn purge_cancelled_orders(older_than: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM orders WHERE status = $1 AND updated_at < $2")
        .bind(OrderStatusType::Cancelled)
        .bind(older_than)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(restaurant_id) = query.restaurant_id {
        where_clause.push("restaurant_id = ");
        where_clause.push_bind_unseparated(restaurant_id);
    }
    if let Some(order_type) = query.order_type {
        where_clause.push("order_type = ");
        where_clause.push_bind_unseparated(order_type);
    }
    if let Some(statuses) = query.statuses.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC, id ASC");

    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Order>().fetch_all(conn).await
}

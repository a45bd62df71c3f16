use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{OrderStatusHistory, OrderStatusType};

pub async fn insert_history(
    order_id: i64,
    previous_status: Option<OrderStatusType>,
    new_status: OrderStatusType,
    changed_by: Option<i64>,
    notes: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<OrderStatusHistory, sqlx::Error> {
    let entry = sqlx::query_as(
        r#"
            INSERT INTO order_status_history (order_id, previous_status, new_status, changed_by, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(previous_status)
    .bind(new_status)
    .bind(changed_by)
    .bind(notes)
    .bind(now)
    .fetch_one(conn)
    .await?;
    match previous_status {
        Some(prev) => debug!("🗃️ Order #{order_id} status history: {prev} -> {new_status}"),
        None => debug!("🗃️ Order #{order_id} status history: created as {new_status}"),
    }
    Ok(entry)
}

/// The status history for the order, oldest entry first.
pub async fn fetch_history(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderStatusHistory>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_status_history WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use super::menu_items;
use crate::{
    db_types::{Money, NewOrderItem, Order, OrderItem},
    helpers::{validate_quantity, MAX_QUANTITY},
    traits::EngineError,
};

/// Adds `item` to the order, or if the order already has a line for the same menu item, adds the quantity to that
/// line instead. A merged line keeps its original unit price.
///
/// Returns the new or updated line, and whether it was merged. The caller must have locked the order, and must
/// recalculate the totals afterwards.
pub async fn add_or_merge_item(
    order: &Order,
    item: NewOrderItem,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(OrderItem, bool), EngineError> {
    validate_quantity(item.quantity)?;
    let menu_item = menu_items::fetch_menu_item(item.menu_item_id, conn)
        .await?
        .ok_or_else(|| EngineError::menu_item_not_found(item.menu_item_id))?;
    if menu_item.restaurant_id != order.restaurant_id {
        return Err(EngineError::validation(format!(
            "Menu item '{}' is not on the menu of the restaurant for order {}",
            menu_item.name, order.order_number
        )));
    }
    if !menu_item.is_available {
        return Err(EngineError::validation(format!("Menu item '{}' is not available", menu_item.name)));
    }
    match fetch_item_for_menu_item(order.id, menu_item.id, conn).await? {
        Some(existing) => {
            let quantity = existing.quantity + item.quantity;
            if quantity > MAX_QUANTITY {
                return Err(EngineError::validation(format!(
                    "Order {} already has {} x '{}'. Adding {} more would exceed the maximum of {MAX_QUANTITY}",
                    order.order_number, existing.quantity, menu_item.name, item.quantity
                )));
            }
            let updated =
                update_quantity(existing.id, quantity, item.special_instructions.as_deref(), now, conn).await?;
            debug!("🗃️ Order [{}]: merged {} x '{}' into item #{}", order.order_number, item.quantity, menu_item.name, updated.id);
            Ok((updated, true))
        },
        None => {
            let instructions = item.special_instructions.unwrap_or_default();
            let inserted =
                insert_item(order.id, menu_item.id, item.quantity, menu_item.price, &instructions, now, conn).await?;
            Ok((inserted, false))
        },
    }
}

/// Line items for the order, in the order they were added.
pub async fn fetch_items_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

pub async fn fetch_item(id: i64, conn: &mut SqliteConnection) -> Result<Option<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// Looks up the parent order of a line item, so that the order can be locked before the item is read.
pub async fn fetch_order_id_for_item(id: i64, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT order_id FROM order_items WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_item_for_menu_item(
    order_id: i64,
    menu_item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 AND menu_item_id = $2")
        .bind(order_id)
        .bind(menu_item_id)
        .fetch_optional(conn)
        .await
}

pub async fn insert_item(
    order_id: i64,
    menu_item_id: i64,
    quantity: i64,
    unit_price: Money,
    special_instructions: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    let item: OrderItem = sqlx::query_as(
        r#"
            INSERT INTO order_items (
                order_id,
                menu_item_id,
                quantity,
                unit_price,
                special_instructions,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(menu_item_id)
    .bind(quantity)
    .bind(unit_price)
    .bind(special_instructions)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order #{order_id}: {quantity} x menu item #{menu_item_id} @ {unit_price} added as item #{}", item.id);
    Ok(item)
}

/// Sets the quantity of a line item. If `special_instructions` is given, it replaces the existing instructions.
pub async fn update_quantity(
    id: i64,
    quantity: i64,
    special_instructions: Option<&str>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE order_items
            SET quantity = $1, special_instructions = COALESCE($2, special_instructions), updated_at = $3
            WHERE id = $4
            RETURNING *;
        "#,
    )
    .bind(quantity)
    .bind(special_instructions)
    .bind(now)
    .bind(id)
    .fetch_one(conn)
    .await
}

pub async fn delete_item(id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM order_items WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected())
}

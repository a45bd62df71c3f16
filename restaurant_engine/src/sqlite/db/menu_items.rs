use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{MenuItem, Money, NewMenuItem},
    rms_api::catalog_objects::MenuQueryFilter,
};

pub async fn insert_menu_item(
    item: NewMenuItem,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<MenuItem, sqlx::Error> {
    let item: MenuItem = sqlx::query_as(
        r#"
            INSERT INTO menu_items (
                restaurant_id,
                name,
                description,
                price,
                category,
                preparation_time,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *;
        "#,
    )
    .bind(item.restaurant_id)
    .bind(item.name.trim())
    .bind(item.description)
    .bind(item.price)
    .bind(item.category)
    .bind(item.preparation_time)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Menu item '{}' ({}) added to restaurant #{}", item.name, item.price, item.restaurant_id);
    Ok(item)
}

pub async fn fetch_menu_item(id: i64, conn: &mut SqliteConnection) -> Result<Option<MenuItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM menu_items WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn update_price(
    id: i64,
    price: Money,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<MenuItem>, sqlx::Error> {
    sqlx::query_as("UPDATE menu_items SET price = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(price)
        .bind(now)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn set_availability(
    id: i64,
    available: bool,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<MenuItem>, sqlx::Error> {
    sqlx::query_as("UPDATE menu_items SET is_available = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(available)
        .bind(now)
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Fetches menu items matching the filter, grouped by category and then sorted by name.
pub async fn search_menu(query: MenuQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<MenuItem>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM menu_items ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(restaurant_id) = query.restaurant_id {
        where_clause.push("restaurant_id = ");
        where_clause.push_bind_unseparated(restaurant_id);
    }
    if let Some(category) = query.category {
        where_clause.push("category = ");
        where_clause.push_bind_unseparated(category);
    }
    if query.available_only {
        where_clause.push("is_available = 1");
    }
    if let Some(max_price) = query.max_price {
        where_clause.push("price <= ");
        where_clause.push_bind_unseparated(max_price);
    }
    if let Some(name) = query.name_contains {
        where_clause.push("name LIKE ");
        where_clause.push_bind_unseparated(format!("%{name}%"));
    }
    builder.push(" ORDER BY category, name");
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<MenuItem>().fetch_all(conn).await
}

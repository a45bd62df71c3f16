use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::db_types::{NewRestaurant, Restaurant};

/// Inserts the restaurant with the given, already unique, slug.
pub async fn insert_restaurant(
    restaurant: NewRestaurant,
    slug: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Restaurant, sqlx::Error> {
    let restaurant: Restaurant = sqlx::query_as(
        r#"
            INSERT INTO restaurants (owner_id, name, slug, location, phone, email, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING *;
        "#,
    )
    .bind(restaurant.owner_id)
    .bind(restaurant.name.trim())
    .bind(slug)
    .bind(restaurant.location.trim())
    .bind(restaurant.phone)
    .bind(restaurant.email)
    .bind(restaurant.description)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Restaurant '{}' created with id {} and slug {}", restaurant.name, restaurant.id, restaurant.slug);
    Ok(restaurant)
}

/// Returns `base` if no restaurant is using it as a slug yet, otherwise the first of `base-1`, `base-2`, ... that is
/// free.
pub async fn unique_slug(base: &str, conn: &mut SqliteConnection) -> Result<String, sqlx::Error> {
    let taken: Vec<String> = sqlx::query_scalar("SELECT slug FROM restaurants WHERE slug = $1 OR slug LIKE $2")
        .bind(base)
        .bind(format!("{base}-%"))
        .fetch_all(conn)
        .await?;
    if !taken.iter().any(|s| s == base) {
        return Ok(base.to_string());
    }
    let slug = (1u64..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| format!("{base}-{}", taken.len() + 1));
    trace!("🗃️ Slug '{base}' is taken. Using '{slug}' instead");
    Ok(slug)
}

pub async fn fetch_restaurant(id: i64, conn: &mut SqliteConnection) -> Result<Option<Restaurant>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM restaurants WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_restaurant_by_slug(slug: &str, conn: &mut SqliteConnection) -> Result<Option<Restaurant>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM restaurants WHERE slug = $1").bind(slug).fetch_optional(conn).await
}

pub async fn set_active(
    id: i64,
    active: bool,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Restaurant>, sqlx::Error> {
    sqlx::query_as("UPDATE restaurants SET is_active = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(active)
        .bind(now)
        .bind(id)
        .fetch_optional(conn)
        .await
}

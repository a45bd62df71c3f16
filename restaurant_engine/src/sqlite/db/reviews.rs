use chrono::{DateTime, Utc};
use log::debug;
use sqlx::{FromRow, SqliteConnection};

use crate::db_types::{NewReview, Review};

pub async fn insert_review(
    order_id: i64,
    review: NewReview,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Review, sqlx::Error> {
    let review: Review = sqlx::query_as(
        r#"
            INSERT INTO reviews (order_id, rating, comment, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(review.rating)
    .bind(review.comment)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Review #{} ({} stars) saved for order #{order_id}", review.id, review.rating);
    Ok(review)
}

pub async fn fetch_review_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM reviews WHERE order_id = $1").bind(order_id).fetch_optional(conn).await
}

#[derive(FromRow)]
struct RatingCount {
    rating: i64,
    count: i64,
}

/// The number of reviews for each star rating at the restaurant. Index 0 holds the 1-star count.
pub async fn rating_counts(restaurant_id: i64, conn: &mut SqliteConnection) -> Result<[i64; 5], sqlx::Error> {
    let rows: Vec<RatingCount> = sqlx::query_as(
        r#"
            SELECT r.rating AS rating, COUNT(*) AS count
            FROM reviews r JOIN orders o ON r.order_id = o.id
            WHERE o.restaurant_id = $1
            GROUP BY r.rating
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(conn)
    .await?;
    let mut counts = [0i64; 5];
    for row in rows {
        if let Some(slot) = usize::try_from(row.rating - 1).ok().and_then(|i| counts.get_mut(i)) {
            *slot = row.count;
        }
    }
    Ok(counts)
}

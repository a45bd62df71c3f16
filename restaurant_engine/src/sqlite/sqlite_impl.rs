//! `SqliteDatabase` is a concrete implementation of an order lifecycle engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
//!
//! Every mutating method opens a transaction whose first statement bumps the order's version (see
//! [`orders::lock_order`]). SQLite hands the write lock to one transaction at a time, and other writers wait up to the
//! configured busy timeout, so mutations of the same order are applied one after the other. A writer that times out
//! gets a `ConcurrencyConflict` error and may retry.
use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{
    menu_items,
    new_pool,
    order_items,
    orders,
    recalculation,
    restaurants,
    reviews,
    status_history,
    users,
};
use crate::{
    config::EngineConfig,
    db_types::{
        MenuItem,
        Money,
        NewMenuItem,
        NewOrder,
        NewOrderItem,
        NewRestaurant,
        NewReview,
        NewUser,
        Order,
        OrderItem,
        OrderNumber,
        OrderStatusHistory,
        OrderStatusType,
        Restaurant,
        Review,
        User,
    },
    helpers::{generate_order_number, slugify, validate_delivery_fee, validate_quantity, validate_rating},
    lifecycle::{ensure_modifiable, plan_transition, TransitionMode, ORDER_CREATED_NOTE},
    rms_api::{catalog_objects::MenuQueryFilter, order_objects::OrderQueryFilter},
    traits::{
        CatalogManagement,
        EngineError,
        FeeChanged,
        ItemChanged,
        ItemRemoved,
        LifecycleDatabase,
        OrderManagement,
        OrderWithItems,
        ReviewStats,
        StatusChanged,
    },
};

/// Number of attempts at generating an order number that is not already in use.
const ORDER_NUMBER_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl LifecycleDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order_with_items(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
    ) -> Result<OrderWithItems, EngineError> {
        if items.is_empty() {
            return Err(EngineError::validation("An order must contain at least one item"));
        }
        // The user and restaurant are checked before the transaction starts, so that its first statement is a write
        let mut conn = self.pool.acquire().await?;
        let user_id = order.user_id;
        users::fetch_user(user_id, &mut conn).await?.ok_or_else(|| EngineError::user_not_found(user_id))?;
        let restaurant = restaurants::fetch_restaurant(order.restaurant_id, &mut conn)
            .await?
            .ok_or_else(|| EngineError::restaurant_not_found(order.restaurant_id))?;
        if !restaurant.is_active {
            return Err(EngineError::validation(format!("{} is not accepting orders", restaurant.name)));
        }
        let mut number = generate_order_number();
        let mut attempts = 1;
        while orders::order_number_exists(&number, &mut conn).await? {
            if attempts >= ORDER_NUMBER_ATTEMPTS {
                return Err(EngineError::ConcurrencyConflict("Could not allocate a unique order number".into()));
            }
            warn!("🗃️ Order number {number} is already in use. Generating another one.");
            number = generate_order_number();
            attempts += 1;
        }
        drop(conn);

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let inserted = orders::insert_order(order, &number, now, &mut tx).await?;
        status_history::insert_history(
            inserted.id,
            None,
            OrderStatusType::Pending,
            Some(user_id),
            ORDER_CREATED_NOTE,
            now,
            &mut tx,
        )
        .await?;
        for item in items {
            order_items::add_or_merge_item(&inserted, item, now, &mut tx).await?;
        }
        let order = recalculation::recalculate_totals(inserted.id, &mut tx).await?;
        let items = order_items::fetch_items_for_order(order.id, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Order [{}] placed with {} line items. Total: {}", order.order_number, items.len(), order.total);
        Ok(OrderWithItems::new(order, items))
    }

    async fn add_item(&self, order_id: i64, item: NewOrderItem) -> Result<ItemChanged, EngineError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        orders::lock_order(order_id, now, &mut tx).await?;
        let old_order = orders::fetch_existing_order(order_id, &mut tx).await?;
        ensure_modifiable(&old_order)?;
        let (item, merged) = order_items::add_or_merge_item(&old_order, item, now, &mut tx).await?;
        let order = recalculation::recalculate_totals(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(ItemChanged { old_order, order, item, merged })
    }

    async fn update_item_quantity(&self, order_item_id: i64, quantity: i64) -> Result<ItemChanged, EngineError> {
        validate_quantity(quantity)?;
        let order_id = self.order_id_for_item(order_item_id).await?;
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        orders::lock_order(order_id, now, &mut tx).await?;
        let old_order = orders::fetch_existing_order(order_id, &mut tx).await?;
        ensure_modifiable(&old_order)?;
        // The item may have been removed while we were waiting for the lock
        order_items::fetch_item(order_item_id, &mut tx)
            .await?
            .ok_or_else(|| EngineError::order_item_not_found(order_item_id))?;
        let item = order_items::update_quantity(order_item_id, quantity, None, now, &mut tx).await?;
        let order = recalculation::recalculate_totals(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}]: item #{order_item_id} quantity set to {quantity}", order.order_number);
        Ok(ItemChanged { old_order, order, item, merged: false })
    }

    async fn remove_item(&self, order_item_id: i64) -> Result<ItemRemoved, EngineError> {
        let order_id = self.order_id_for_item(order_item_id).await?;
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        orders::lock_order(order_id, now, &mut tx).await?;
        let old_order = orders::fetch_existing_order(order_id, &mut tx).await?;
        ensure_modifiable(&old_order)?;
        let removed = order_items::fetch_item(order_item_id, &mut tx)
            .await?
            .ok_or_else(|| EngineError::order_item_not_found(order_item_id))?;
        order_items::delete_item(order_item_id, &mut tx).await?;
        let (order, cancellation) = recalculation::recalculate_after_removal(order_id, now, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}]: item #{order_item_id} removed", order.order_number);
        Ok(ItemRemoved { old_order, order, removed, cancellation })
    }

    async fn transition_status(
        &self,
        order_id: i64,
        new_status: OrderStatusType,
        mode: TransitionMode,
        changed_by: Option<i64>,
        notes: Option<String>,
    ) -> Result<StatusChanged, EngineError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        orders::lock_order(order_id, now, &mut tx).await?;
        let old_order = orders::fetch_existing_order(order_id, &mut tx).await?;
        let change = plan_transition(&old_order, new_status, mode, changed_by, notes, now)?;
        let (order, history) = recalculation::apply_status_change(&old_order, &change, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Order [{}] moved from {} to {} ({mode:?})", order.order_number, change.from, change.to);
        Ok(StatusChanged { old_order, order, history })
    }

    async fn set_delivery_fee(&self, order_id: i64, fee: Money) -> Result<FeeChanged, EngineError> {
        validate_delivery_fee(fee)?;
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        orders::lock_order(order_id, now, &mut tx).await?;
        let old_order = orders::fetch_existing_order(order_id, &mut tx).await?;
        ensure_modifiable(&old_order)?;
        orders::update_delivery_fee(order_id, fee, &mut tx).await?;
        let order = recalculation::recalculate_totals(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(FeeChanged { old_fee: old_order.delivery_fee, order })
    }

    async fn insert_review(&self, order_id: i64, review: NewReview) -> Result<Review, EngineError> {
        validate_rating(review.rating)?;
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        orders::lock_order(order_id, now, &mut tx).await?;
        let order = orders::fetch_existing_order(order_id, &mut tx).await?;
        if order.status != OrderStatusType::Delivered {
            return Err(EngineError::invalid_state(format!(
                "Order {} is {}. Only delivered orders can be reviewed",
                order.order_number, order.status
            )));
        }
        if reviews::fetch_review_for_order(order_id, &mut tx).await?.is_some() {
            return Err(EngineError::invalid_state(format!("Order {} has already been reviewed", order.order_number)));
        }
        let review = reviews::insert_review(order_id, review, now, &mut tx).await?;
        tx.commit().await?;
        Ok(review)
    }

    async fn delete_order(&self, order_id: i64) -> Result<Order, EngineError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::delete_order(order_id, &mut tx).await?.ok_or_else(|| EngineError::order_not_found(order_id))?;
        tx.commit().await?;
        info!("🗃️ Order [{}] has been deleted", order.order_number);
        Ok(order)
    }

    async fn purge_cancelled_orders(&self, older_than: DateTime<Utc>) -> Result<u64, EngineError> {
        let mut tx = self.pool.begin().await?;
        let count = orders::purge_cancelled_orders(older_than, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ {count} cancelled orders last updated before {older_than} have been purged");
        Ok(count)
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_number(number, &mut conn).await?)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(order_items::fetch_items_for_order(order_id, &mut conn).await?)
    }

    async fn fetch_order_item(&self, order_item_id: i64) -> Result<Option<OrderItem>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(order_items::fetch_item(order_item_id, &mut conn).await?)
    }

    async fn fetch_status_history(&self, order_id: i64) -> Result<Vec<OrderStatusHistory>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(status_history::fetch_history(order_id, &mut conn).await?)
    }

    async fn fetch_review_for_order(&self, order_id: i64) -> Result<Option<Review>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reviews::fetch_review_for_order(order_id, &mut conn).await?)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::search_orders(query, &mut conn).await?)
    }

    async fn review_stats(&self, restaurant_id: i64) -> Result<ReviewStats, EngineError> {
        let mut conn = self.pool.acquire().await?;
        let counts = reviews::rating_counts(restaurant_id, &mut conn).await?;
        Ok(ReviewStats::new(restaurant_id, counts))
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, EngineError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user(user_id, &mut conn).await?)
    }

    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user_by_username(username, &mut conn).await?)
    }

    async fn insert_restaurant(&self, restaurant: NewRestaurant) -> Result<Restaurant, EngineError> {
        let base = slugify(&restaurant.name);
        if base.is_empty() {
            return Err(EngineError::validation(format!("'{}' cannot be turned into a slug", restaurant.name)));
        }
        let mut tx = self.pool.begin().await?;
        users::fetch_user(restaurant.owner_id, &mut tx)
            .await?
            .ok_or_else(|| EngineError::user_not_found(restaurant.owner_id))?;
        let slug = restaurants::unique_slug(&base, &mut tx).await?;
        let restaurant = restaurants::insert_restaurant(restaurant, &slug, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        Ok(restaurant)
    }

    async fn fetch_restaurant(&self, restaurant_id: i64) -> Result<Option<Restaurant>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(restaurants::fetch_restaurant(restaurant_id, &mut conn).await?)
    }

    async fn fetch_restaurant_by_slug(&self, slug: &str) -> Result<Option<Restaurant>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(restaurants::fetch_restaurant_by_slug(slug, &mut conn).await?)
    }

    async fn set_restaurant_active(&self, restaurant_id: i64, active: bool) -> Result<Restaurant, EngineError> {
        let mut tx = self.pool.begin().await?;
        let restaurant = restaurants::set_active(restaurant_id, active, Utc::now(), &mut tx)
            .await?
            .ok_or_else(|| EngineError::restaurant_not_found(restaurant_id))?;
        tx.commit().await?;
        Ok(restaurant)
    }

    async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, EngineError> {
        let mut conn = self.pool.acquire().await?;
        restaurants::fetch_restaurant(item.restaurant_id, &mut conn)
            .await?
            .ok_or_else(|| EngineError::restaurant_not_found(item.restaurant_id))?;
        drop(conn);
        let mut tx = self.pool.begin().await?;
        let item = menu_items::insert_menu_item(item, Utc::now(), &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn fetch_menu_item(&self, menu_item_id: i64) -> Result<Option<MenuItem>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu_items::fetch_menu_item(menu_item_id, &mut conn).await?)
    }

    async fn update_menu_item_price(&self, menu_item_id: i64, price: Money) -> Result<MenuItem, EngineError> {
        let mut tx = self.pool.begin().await?;
        let item = menu_items::update_price(menu_item_id, price, Utc::now(), &mut tx)
            .await?
            .ok_or_else(|| EngineError::menu_item_not_found(menu_item_id))?;
        tx.commit().await?;
        Ok(item)
    }

    async fn set_menu_item_availability(&self, menu_item_id: i64, available: bool) -> Result<MenuItem, EngineError> {
        let mut tx = self.pool.begin().await?;
        let item = menu_items::set_availability(menu_item_id, available, Utc::now(), &mut tx)
            .await?
            .ok_or_else(|| EngineError::menu_item_not_found(menu_item_id))?;
        tx.commit().await?;
        Ok(item)
    }

    async fn fetch_menu(&self, query: MenuQueryFilter) -> Result<Vec<MenuItem>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu_items::search_menu(query, &mut conn).await?)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, configured from the `RMS_*` environment variables.
    pub async fn new() -> Result<Self, sqlx::Error> {
        let config = EngineConfig::from_env_or_default();
        info!("🗃️ Using database URL: {}", config.database_url);
        SqliteDatabase::from_config(&config).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let busy_timeout = EngineConfig::default().busy_timeout;
        SqliteDatabase::connect(url, max_connections, busy_timeout).await
    }

    pub async fn from_config(config: &EngineConfig) -> Result<Self, sqlx::Error> {
        SqliteDatabase::connect(&config.database_url, config.max_connections, config.busy_timeout).await
    }

    async fn connect(url: &str, max_connections: u32, busy_timeout: Duration) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections, busy_timeout).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date with the migrations embedded in this crate.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        debug!("🗃️ Migrations complete for {}", self.url);
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// An item never moves to another order, so its order id can be looked up before the order is locked.
    async fn order_id_for_item(&self, order_item_id: i64) -> Result<i64, EngineError> {
        let mut conn = self.pool.acquire().await?;
        order_items::fetch_order_id_for_item(order_item_id, &mut conn)
            .await?
            .ok_or_else(|| EngineError::order_item_not_found(order_item_id))
    }
}

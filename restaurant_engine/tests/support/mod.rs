#![allow(dead_code)]
pub mod prepare_env;

use std::time::Duration;

use log::*;
use restaurant_engine::{
    db_types::{MenuCategory, MenuItem, Money, NewMenuItem, NewRestaurant, NewUser, Restaurant, User},
    events::{EventHandlers, EventHooks, EventProducers},
    CatalogApi,
    EngineConfig,
    LifecycleDatabase,
    OrderFlowApi,
    OrderQueryApi,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

use self::prepare_env::{prepare_test_env, random_db_path};

pub const BURGER_PRICE: Money = Money::from_cents(25_000);
pub const SALAD_PRICE: Money = Money::from_cents(10_000);
pub const SODA_PRICE: Money = Money::from_cents(350);

/// A migrated database with one customer, one restaurant and a small menu.
pub struct TestSystem {
    pub db: SqliteDatabase,
    pub flow: OrderFlowApi<SqliteDatabase>,
    pub queries: OrderQueryApi<SqliteDatabase>,
    pub catalog: CatalogApi<SqliteDatabase>,
    pub customer: User,
    pub owner: User,
    pub restaurant: Restaurant,
    pub burger: MenuItem,
    pub salad: MenuItem,
    pub soda: MenuItem,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default(), 5).await
    }

    /// Starts handlers for `hooks` and wires their producers into the order flow API.
    pub async fn with_hooks(hooks: EventHooks) -> Self {
        let handlers = EventHandlers::new(64, hooks);
        let producers = handlers.producers();
        handlers.start_handlers();
        Self::with_producers(producers, 5).await
    }

    pub async fn with_producers(producers: EventProducers, max_connections: u32) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let config = EngineConfig::new(url.as_str()).with_max_connections(max_connections);
        let db = SqliteDatabase::from_config(&config).await.expect("Error creating database");
        let catalog = CatalogApi::new(db.clone());
        let customer = catalog
            .register_user(NewUser::new("alice").with_email("alice@example.com").with_phone("+15551234567"))
            .await
            .expect("Error registering customer");
        let owner = catalog.register_user(NewUser::new("bob")).await.expect("Error registering owner");
        let restaurant = catalog
            .create_restaurant(NewRestaurant::new(owner.id, "Bob's Burgers", "12 Ocean Avenue"))
            .await
            .expect("Error creating restaurant");
        let burger = catalog
            .add_menu_item(NewMenuItem::new(restaurant.id, "Burger", BURGER_PRICE, MenuCategory::Main))
            .await
            .expect("Error adding burger");
        let salad = catalog
            .add_menu_item(NewMenuItem::new(restaurant.id, "Salad", SALAD_PRICE, MenuCategory::Appetizer))
            .await
            .expect("Error adding salad");
        let soda = catalog
            .add_menu_item(NewMenuItem::new(restaurant.id, "Soda", SODA_PRICE, MenuCategory::Drink))
            .await
            .expect("Error adding soda");
        debug!("🚀️ Test system ready at {url}");
        Self {
            flow: OrderFlowApi::new(db.clone(), producers),
            queries: OrderQueryApi::new(db.clone()),
            db,
            catalog,
            customer,
            owner,
            restaurant,
            burger,
            salad,
            soda,
        }
    }

    pub async fn tear_down(self) {
        let TestSystem { mut db, flow, queries, catalog, .. } = self;
        drop((flow, queries, catalog));
        let url = db.url().to_string();
        if let Err(e) = db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&url).await {
            warn!("🚀️ Could not remove test database {url}: {e}");
        }
    }
}

/// Polls `check` until it returns true, or gives up after two seconds.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

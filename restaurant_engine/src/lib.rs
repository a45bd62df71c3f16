//! Restaurant Order Engine
//!
//! The order engine is the part of the restaurant back office that owns the life of an order: it places orders, keeps
//! their totals consistent with their line items as items are added, changed and removed, moves them through the
//! status lifecycle, and records every status change in an audit trail.
//!
//! The library is divided into the following sections:
//! 1. The order engine public API ([`mod@rms_api`]). You should never need to access the database directly. Instead,
//!    use [`OrderFlowApi`] to change orders, [`OrderQueryApi`] to read them, and [`CatalogApi`] to manage the users,
//!    restaurants and menu items that orders refer to.
//! 2. The backend traits ([`mod@traits`]). Specific backends need to implement these in order to act as storage for
//!    the engine. [`SqliteDatabase`] is the only backend at present.
//! 3. The rules themselves, which are pure and backend-independent: the status graph in [`mod@lifecycle`] and the
//!    money arithmetic in [`mod@totals`].
//!
//! The engine also emits events after every committed change. Subscribe to them with [`events::EventHooks`]; the
//! [`mod@notifications`] module uses them to tell customers about their orders.
pub mod config;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod lifecycle;
pub mod notifications;
pub mod rms_api;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod totals;
pub mod traits;

pub use config::EngineConfig;
pub use rms_api::{
    catalog_api::CatalogApi,
    catalog_objects,
    order_flow_api::OrderFlowApi,
    order_objects,
    order_query_api::OrderQueryApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{CatalogManagement, EngineError, LifecycleDatabase, OrderManagement};

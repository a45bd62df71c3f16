//! # Database backend contracts
//!
//! This module defines the behaviour that database backends need to expose in order to be supported by the order
//! lifecycle engine.
//!
//! * [`LifecycleDatabase`] is the highest level of behaviour. It owns every mutation of an order, its items, status
//!   and review, and is responsible for keeping the order totals and status history consistent.
//! * [`OrderManagement`] provides read-only queries over orders.
//! * [`CatalogManagement`] manages users, restaurants and menu items.
//!
//! All backends report failures using [`EngineError`].
mod catalog_management;
mod data_objects;
mod errors;
mod lifecycle_database;
mod order_management;

pub use catalog_management::CatalogManagement;
pub use data_objects::{FeeChanged, ItemChanged, ItemRemoved, OrderDetails, OrderWithItems, ReviewStats, StatusChanged};
pub use errors::EngineError;
pub use lifecycle_database::LifecycleDatabase;
pub use order_management::OrderManagement;

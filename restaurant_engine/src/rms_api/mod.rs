//! The public API of the order lifecycle engine.
//!
//! * [`order_flow_api::OrderFlowApi`] places and modifies orders and drives them through the status lifecycle.
//! * [`order_query_api::OrderQueryApi`] answers read-only questions about orders.
//! * [`catalog_api::CatalogApi`] manages the users, restaurants and menus that orders refer to.
pub mod catalog_api;
pub mod catalog_objects;
pub mod order_flow_api;
pub mod order_objects;
pub mod order_query_api;

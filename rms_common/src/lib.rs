//! Shared types for the restaurant management system.
//!
//! The only currency type in the system is [`Money`], an exact fixed-point amount held in minor units (cents). All
//! order totals, menu prices and fees are expressed with it so that no binary floating point ever touches a financial
//! figure.
pub mod helpers;
mod money;

pub mod op;

pub use money::{Money, MoneyConversionError, MINOR_UNITS_PER_UNIT};

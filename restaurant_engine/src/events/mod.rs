//! Post-commit event hooks.
//!
//! The APIs publish an event once the database transaction behind an operation has committed. Delivery is best effort:
//! a slow or failing subscriber never holds up, or fails, the operation that triggered it.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};

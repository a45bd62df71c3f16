use thiserror::Error;

use crate::db_types::OrderStatusType;

/// SQLite primary result codes that indicate lock contention rather than a broken query.
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";
const SQLITE_BUSY_SNAPSHOT: &str = "517";

/// Every error the engine hands back to its callers.
///
/// The HTTP layer is expected to map `ValidationError`, `InvalidTransition` and `InvalidState` to client errors,
/// `NotFound` to a missing resource, and `ConcurrencyConflict` to a retryable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    ValidationError(String),
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Operation not allowed in the current state: {0}")]
    InvalidState(String),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("Concurrent modification detected, please retry: {0}")]
    ConcurrencyConflict(String),
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
}

impl EngineError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn order_not_found(id: i64) -> Self {
        Self::NotFound(format!("Order {id}"))
    }

    pub fn order_item_not_found(id: i64) -> Self {
        Self::NotFound(format!("Order item {id}"))
    }

    pub fn menu_item_not_found(id: i64) -> Self {
        Self::NotFound(format!("Menu item {id}"))
    }

    pub fn user_not_found(id: i64) -> Self {
        Self::NotFound(format!("User {id}"))
    }

    pub fn restaurant_not_found(id: i64) -> Self {
        Self::NotFound(format!("Restaurant {id}"))
    }

    /// Only concurrency conflicts are worth retrying verbatim.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => EngineError::NotFound("Requested record".to_string()),
            sqlx::Error::Database(ref db_err) => {
                let code = db_err.code();
                match code.as_deref() {
                    Some(SQLITE_BUSY | SQLITE_LOCKED | SQLITE_BUSY_SNAPSHOT) => {
                        EngineError::ConcurrencyConflict(db_err.message().to_string())
                    },
                    _ if db_err.is_unique_violation() => {
                        EngineError::ValidationError(format!("Record already exists. {}", db_err.message()))
                    },
                    _ if db_err.is_check_violation() => {
                        EngineError::ValidationError(format!("Value out of range. {}", db_err.message()))
                    },
                    _ => EngineError::DatabaseError(e.to_string()),
                }
            },
            sqlx::Error::PoolTimedOut => EngineError::ConcurrencyConflict(e.to_string()),
            _ => EngineError::DatabaseError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(EngineError::ConcurrencyConflict("busy".into()).is_retryable());
        assert!(!EngineError::validation("bad").is_retryable());
        assert!(!EngineError::order_not_found(1).is_retryable());
        let e = EngineError::InvalidTransition { from: OrderStatusType::Delivered, to: OrderStatusType::Pending };
        assert!(!e.is_retryable());
        assert_eq!(e.to_string(), "Cannot change order status from delivered to pending");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let e = EngineError::from(sqlx::Error::RowNotFound);
        assert!(matches!(e, EngineError::NotFound(_)));
        let e = EngineError::from(sqlx::Error::PoolTimedOut);
        assert!(e.is_retryable());
    }
}

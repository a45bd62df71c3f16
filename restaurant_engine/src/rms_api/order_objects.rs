use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{OrderStatusType, OrderType},
    traits::EngineError,
};

/// Search criteria for orders. Empty criteria match every order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub user_id: Option<i64>,
    pub restaurant_id: Option<i64>,
    pub order_type: Option<OrderType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub statuses: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    pub fn since<T>(mut self, since: T) -> Result<Self, EngineError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = since.try_into().map_err(|e| EngineError::validation(e.to_string()))?;
        self.since = Some(dt);
        Ok(self)
    }

    pub fn until<T>(mut self, until: T) -> Result<Self, EngineError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = until.try_into().map_err(|e| EngineError::validation(e.to_string()))?;
        self.until = Some(dt);
        Ok(self)
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_restaurant_id(mut self, restaurant_id: i64) -> Self {
        self.restaurant_id = Some(restaurant_id);
        self
    }

    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = Some(order_type);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.statuses.get_or_insert_with(Vec::new).push(status);
        self
    }

    /// Restricts the search to orders that are still in progress.
    pub fn active_only(self) -> Self {
        OrderStatusType::ALL.into_iter().filter(OrderStatusType::is_active).fold(self, Self::with_status)
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() &&
            self.restaurant_id.is_none() &&
            self.order_type.is_none() &&
            self.statuses.as_ref().map_or(true, Vec::is_empty) &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(user_id) = &self.user_id {
            write!(f, "user_id: {user_id}. ")?;
        }
        if let Some(restaurant_id) = &self.restaurant_id {
            write!(f, "restaurant_id: {restaurant_id}. ")?;
        }
        if let Some(order_type) = &self.order_type {
            write!(f, "order_type: {order_type}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.statuses {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: {statuses}. ")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builders() {
        let filter = OrderQueryFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.to_string(), "No filters.");
        let filter = OrderQueryFilter::default()
            .with_restaurant_id(3)
            .with_status(OrderStatusType::Pending)
            .with_status(OrderStatusType::Ready);
        assert_eq!(filter.statuses, Some(vec![OrderStatusType::Pending, OrderStatusType::Ready]));
        assert_eq!(filter.to_string(), "restaurant_id: 3. statuses: pending,ready. ");
    }

    #[test]
    fn active_only() {
        let filter = OrderQueryFilter::default().active_only();
        let statuses = filter.statuses.unwrap();
        assert_eq!(statuses.len(), 5);
        assert!(!statuses.contains(&OrderStatusType::Delivered));
        assert!(!statuses.contains(&OrderStatusType::Cancelled));
    }

    #[test]
    fn since_accepts_rfc3339() {
        let filter = OrderQueryFilter::default().since("2024-03-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert!(filter.is_ok());
    }
}

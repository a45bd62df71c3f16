use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use rms_common::helpers::parse_boolean_flag;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/restaurant.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

/// Runtime configuration for the engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// How long SQLite waits on a locked database before giving up with `SQLITE_BUSY`.
    pub busy_timeout: Duration,
    /// Capacity of each event hook queue. Events published to a full queue are dropped.
    pub event_buffer_size: usize,
    pub notifications_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            notifications_enabled: true,
        }
    }
}

impl EngineConfig {
    pub fn new<S: Into<String>>(database_url: S) -> Self {
        Self { database_url: database_url.into(), ..Default::default() }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications_enabled = enabled;
        self
    }

    pub fn from_env_or_default() -> Self {
        let database_url = env::var("RMS_DATABASE_URL").unwrap_or_else(|_| {
            info!("🪛️ RMS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_env("RMS_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let busy_timeout = Duration::from_millis(parse_env("RMS_DB_BUSY_TIMEOUT_MS", DEFAULT_BUSY_TIMEOUT_MS));
        let event_buffer_size = parse_env("RMS_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let notifications_enabled = parse_boolean_flag(env::var("RMS_NOTIFICATIONS_ENABLED").ok(), true);
        Self { database_url, max_connections, busy_timeout, event_buffer_size, notifications_enabled }
    }
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    match env::var(key) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {key}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
        assert!(config.notifications_enabled);
    }

    #[test]
    fn bad_values_fall_back_to_defaults() {
        env::set_var("RMS_TEST_PARSE_GOOD", "42");
        env::set_var("RMS_TEST_PARSE_BAD", "forty-two");
        assert_eq!(parse_env("RMS_TEST_PARSE_GOOD", 7u32), 42);
        assert_eq!(parse_env("RMS_TEST_PARSE_BAD", 7u32), 7);
        assert_eq!(parse_env("RMS_TEST_PARSE_MISSING", 7u32), 7);
    }

    #[test]
    fn reads_settings_from_env() {
        env::set_var("RMS_DATABASE_URL", "sqlite://data/env_test.db");
        env::set_var("RMS_EVENT_BUFFER_SIZE", "8");
        env::set_var("RMS_NOTIFICATIONS_ENABLED", "off");
        let config = EngineConfig::from_env_or_default();
        assert_eq!(config.database_url, "sqlite://data/env_test.db");
        assert_eq!(config.event_buffer_size, 8);
        assert!(!config.notifications_enabled);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }
}

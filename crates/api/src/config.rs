//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Gateway and service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` / `PORT`: bind address (default `0.0.0.0:8080`)
/// - `RUST_LOG`: tracing filter directive (default `info`)
/// - `LOG_FORMAT`: `json` or `pretty` (default `pretty`)
/// - `DATABASE_URL`: PostgreSQL URL; unset keeps both record stores in memory
/// - `USERS_DATABASE_URL` / `ORDERS_DATABASE_URL`: per-service override
/// - `DB_MAX_CONNECTIONS` (5), `DB_TIMEOUT_SECS` (30)
/// - `RPC_TIMEOUT_SECS` (10), `PUBLISH_TIMEOUT_SECS` (5), `REQUEST_TIMEOUT_SECS` (30)
/// - `USER_VALIDATION_ENABLED` (true), `EVENTS_ENABLED` (true)
/// - `EVENT_RETRY_DELAY_MS` (1000), `EVENT_MAX_DELIVERIES` (5)
///
/// Values that fail to parse fall back to the default.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub users_database_url: Option<String>,
    pub orders_database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout: Duration,
    pub rpc_timeout: Duration,
    pub publish_timeout: Duration,
    pub request_timeout: Duration,
    pub user_validation_enabled: bool,
    pub events_enabled: bool,
    pub event_retry_delay: Duration,
    pub event_max_deliveries: u32,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| {
            parse_var(&lookup, key).map(Duration::from_secs).unwrap_or(default)
        };
        let database_url = non_blank(&lookup, "DATABASE_URL");

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse_var(&lookup, "LOG_FORMAT").unwrap_or(defaults.log_format),
            users_database_url: non_blank(&lookup, "USERS_DATABASE_URL")
                .or_else(|| database_url.clone()),
            orders_database_url: non_blank(&lookup, "ORDERS_DATABASE_URL")
                .or_else(|| database_url.clone()),
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS")
                .unwrap_or(defaults.db_max_connections),
            db_timeout: secs("DB_TIMEOUT_SECS", defaults.db_timeout),
            rpc_timeout: secs("RPC_TIMEOUT_SECS", defaults.rpc_timeout),
            publish_timeout: secs("PUBLISH_TIMEOUT_SECS", defaults.publish_timeout),
            request_timeout: secs("REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            user_validation_enabled: lookup("USER_VALIDATION_ENABLED")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.user_validation_enabled),
            events_enabled: lookup("EVENTS_ENABLED")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.events_enabled),
            event_retry_delay: parse_var(&lookup, "EVENT_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.event_retry_delay),
            event_max_deliveries: parse_var(&lookup, "EVENT_MAX_DELIVERIES")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.event_max_deliveries),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            users_database_url: None,
            orders_database_url: None,
            db_max_connections: 5,
            db_timeout: Duration::from_secs(30),
            rpc_timeout: Duration::from_secs(10),
            publish_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            user_validation_enabled: true,
            events_enabled: true,
            event_retry_delay: Duration::from_millis(1000),
            event_max_deliveries: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.users_database_url.is_none());
        assert!(config.user_validation_enabled);
        assert!(config.events_enabled);
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(from_pairs(&[]), Config::default());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 9090,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:9090");
    }

    #[test]
    fn test_database_url_applies_to_both_services() {
        let config = from_pairs(&[
            ("DATABASE_URL", "postgres://shared"),
            ("ORDERS_DATABASE_URL", "postgres://orders"),
        ]);
        assert_eq!(config.users_database_url.as_deref(), Some("postgres://shared"));
        assert_eq!(config.orders_database_url.as_deref(), Some("postgres://orders"));
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("PORT", "3000"),
            ("LOG_FORMAT", "JSON"),
            ("RPC_TIMEOUT_SECS", "2"),
            ("USER_VALIDATION_ENABLED", "false"),
            ("EVENT_RETRY_DELAY_MS", "250"),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.rpc_timeout, Duration::from_secs(2));
        assert!(!config.user_validation_enabled);
        assert_eq!(config.event_retry_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[
            ("PORT", "not-a-port"),
            ("LOG_FORMAT", "xml"),
            ("EVENTS_ENABLED", "maybe"),
            ("EVENT_MAX_DELIVERIES", "0"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.events_enabled);
        assert_eq!(config.event_max_deliveries, 5);
    }
}

//! Service configuration loaded from environment variables.
//!
//! Both binaries read the same keys (or a `.env` file via `dotenvy`).
//! Unset variables fall back to the defaults below; a variable that is set
//! but cannot be parsed is a [`ConfigError`].

use crate::application::consumer::{
    DEFAULT_HANDLER_TIMEOUT, DEFAULT_METADATA_TIMEOUT, DEFAULT_POLL_TIMEOUT,
    DEFAULT_TOPIC_POLL_INTERVAL, DEFAULT_TOPIC_WAIT_TIMEOUT, DEFAULT_WORKER_COUNT,
    SubscriberSettings,
};
use crate::application::publishing::{DEFAULT_CLOSE_TIMEOUT, DEFAULT_FLUSH_TIMEOUT};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MEMBER_EVENTS_TOPIC: &str = "member-created";
pub const DEFAULT_CONSUMER_GROUP: &str = "books-member-consumer-group";
pub const DEFAULT_BOOTSTRAP_SERVERS: &str = "localhost:9092";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: String },
}

/// Broker client settings shared by the publisher and the subscriber
#[derive(Debug, Clone)]
pub struct MessagingConfig {
    /// Kafka bootstrap servers (comma-separated)
    pub bootstrap_servers: String,
    pub topic: String,
    /// Consumer group of the books service
    pub consumer_group: String,
    pub flush_timeout: Duration,
    pub close_timeout: Duration,
    pub topic_wait_timeout: Duration,
    pub topic_poll_interval: Duration,
    pub metadata_timeout: Duration,
    pub poll_timeout: Duration,
    pub handler_timeout: Duration,
    pub worker_count: usize,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: DEFAULT_BOOTSTRAP_SERVERS.to_string(),
            topic: DEFAULT_MEMBER_EVENTS_TOPIC.to_string(),
            consumer_group: DEFAULT_CONSUMER_GROUP.to_string(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            topic_wait_timeout: DEFAULT_TOPIC_WAIT_TIMEOUT,
            topic_poll_interval: DEFAULT_TOPIC_POLL_INTERVAL,
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
            worker_count: DEFAULT_WORKER_COUNT,
        }
    }
}

impl MessagingConfig {
    /// Settings for the subscriber loop
    pub fn subscriber_settings(&self) -> SubscriberSettings {
        SubscriberSettings {
            topic: self.topic.clone(),
            topic_wait_timeout: self.topic_wait_timeout,
            poll_timeout: self.poll_timeout,
            handler_timeout: self.handler_timeout,
        }
    }

    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let worker_count = parse_var(lookup, "CONSUMER_WORKER_COUNT", defaults.worker_count)?;
        if worker_count == 0 {
            return Err(ConfigError::Zero {
                key: "CONSUMER_WORKER_COUNT".to_string(),
            });
        }

        Ok(Self {
            bootstrap_servers: lookup("KAFKA_BOOTSTRAP_SERVERS")
                .unwrap_or(defaults.bootstrap_servers),
            topic: lookup("MEMBER_EVENTS_TOPIC").unwrap_or(defaults.topic),
            consumer_group: lookup("KAFKA_CONSUMER_GROUP").unwrap_or(defaults.consumer_group),
            flush_timeout: parse_millis(lookup, "PUBLISH_FLUSH_TIMEOUT_MS", defaults.flush_timeout)?,
            close_timeout: parse_millis(lookup, "PUBLISH_CLOSE_TIMEOUT_MS", defaults.close_timeout)?,
            topic_wait_timeout: parse_millis(
                lookup,
                "TOPIC_WAIT_TIMEOUT_MS",
                defaults.topic_wait_timeout,
            )?,
            topic_poll_interval: parse_millis(
                lookup,
                "TOPIC_POLL_INTERVAL_MS",
                defaults.topic_poll_interval,
            )?,
            metadata_timeout: parse_millis(
                lookup,
                "METADATA_TIMEOUT_MS",
                defaults.metadata_timeout,
            )?,
            poll_timeout: parse_millis(lookup, "CONSUMER_POLL_TIMEOUT_MS", defaults.poll_timeout)?,
            handler_timeout: parse_millis(
                lookup,
                "CONSUMER_HANDLER_TIMEOUT_MS",
                defaults.handler_timeout,
            )?,
            worker_count,
        })
    }
}

/// Top-level service configuration
///
/// Loaded once at startup via [`ServiceConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Socket address to bind the HTTP server to
    pub listen_addr: SocketAddr,
    /// PostgreSQL connection string
    pub database_url: String,
    /// Maximum number of database connections in the pool
    pub database_max_connections: u32,
    pub messaging: MessagingConfig,
}

impl ServiceConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    /// `default_listen_addr` and `default_database_url` differ per service.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env(
        default_listen_addr: &str,
        default_database_url: &str,
    ) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            default_listen_addr,
            default_database_url,
        )
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(
        lookup: F,
        default_listen_addr: &str,
        default_database_url: &str,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr_raw =
            lookup("LISTEN_ADDR").unwrap_or_else(|| default_listen_addr.to_string());
        let listen_addr = listen_addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "LISTEN_ADDR".to_string(),
                value: listen_addr_raw.clone(),
            })?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| default_database_url.to_string());
        let database_max_connections = parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;

        Ok(Self {
            listen_addr,
            database_url,
            database_max_connections,
            messaging: MessagingConfig::from_lookup(&lookup)?,
        })
    }
}

/// Parses a variable as `T`, returning `default` when it is not set
fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            })
        }
    }
}

/// Parses a millisecond count as a `Duration`
fn parse_millis<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let millis = parse_var(lookup, key, default.as_millis() as u64)?;
    if millis == 0 {
        return Err(ConfigError::Zero {
            key: key.to_string(),
        });
    }
    Ok(Duration::from_millis(millis))
}

//! HTTP server configuration

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// HTTP server configuration
///
/// All fields have sensible defaults - you only need to specify what you
/// want to change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    /// Default: "0.0.0.0"
    pub host: String,

    /// Listen port
    /// Default: 8080
    pub port: u16,

    /// Read timeout for client requests
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,

    /// Write timeout for responses
    /// Default: 30s
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,

    /// How long shutdown waits for workers and the flush loop
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,

    /// Upper bound on batch ingestion size
    /// Default: 1000
    pub max_batch_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(10),
            max_batch_size: 1000,
        }
    }
}

impl ServerConfig {
    /// The socket address to bind, in "host:port" form
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(ConfigError::invalid_value(
                "server",
                "port",
                "must be non-zero",
            ));
        }
        if self.max_batch_size == 0 || self.max_batch_size > 10_000 {
            return Err(ConfigError::invalid_value(
                "server",
                "max_batch_size",
                format!("{} is outside 1..=10000", self.max_batch_size),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
        assert_eq!(config.max_batch_size, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ServerConfig = toml::from_str("port = 9999").unwrap();
        assert_eq!(config.port, 9999);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_rejects_zero_port() {
        let config: ServerConfig = toml::from_str("port = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversize_batch_limit() {
        let config: ServerConfig = toml::from_str("max_batch_size = 50000").unwrap();
        assert!(config.validate().is_err());
    }
}

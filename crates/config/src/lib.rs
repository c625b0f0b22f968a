//! Pulse Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use pulse_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[server]\nport = 9000").unwrap();
//! assert_eq!(config.server.port, 9000);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! shutdown_timeout = "10s"
//! max_batch_size = 1000
//!
//! [processing]
//! worker_count = 10
//! buffer_size = 1000
//! flush_interval = "5s"
//!
//! [window]
//! size = "60s"
//! retention = "5m"
//!
//! [log]
//! level = "info"
//! format = "console"
//! ```

mod error;
mod logging;
mod processing;
mod server;
mod window;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use processing::ProcessingConfig;
pub use server::ServerConfig;
pub use window::WindowConfig;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings (bind address, timeouts, batch limit)
    pub server: ServerConfig,

    /// Event processing settings (workers, queue, flush cadence)
    pub processing: ProcessingConfig,

    /// Tumbling window settings (width, retention)
    pub window: WindowConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.processing.validate()?;
        self.window.validate()?;
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.processing.worker_count, 10);
        assert_eq!(config.processing.buffer_size, 1000);
        assert_eq!(config.window.size, Duration::from_secs(60));
    }

    #[test]
    fn test_minimal_config() {
        let toml = r#"
[server]
port = 9090

[processing]
worker_count = 4
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.processing.worker_count, 4);
        // Untouched sections keep defaults
        assert_eq!(config.processing.flush_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8888
shutdown_timeout = "20s"
max_batch_size = 500

[processing]
worker_count = 16
buffer_size = 4096
flush_interval = "2s"

[window]
size = "30s"
retention = "10m"

[log]
level = "debug"
format = "json"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8888);
        assert_eq!(config.server.shutdown_timeout, Duration::from_secs(20));
        assert_eq!(config.server.max_batch_size, 500);
        assert_eq!(config.processing.worker_count, 16);
        assert_eq!(config.processing.buffer_size, 4096);
        assert_eq!(config.processing.flush_interval, Duration::from_secs(2));
        assert_eq!(config.window.size, Duration::from_secs(30));
        assert_eq!(config.window.effective_retention(), Duration::from_secs(600));
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_str("invalid { toml").is_err());
    }

    #[test]
    fn test_validation_rejects_zero_workers() {
        let result = Config::from_str("[processing]\nworker_count = 0");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_tiny_buffer() {
        let result = Config::from_str("[processing]\nbuffer_size = 10");
        assert!(result.is_err());
    }
}

//! Tumbling window configuration

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Closed windows are kept for this multiple of the window size when no
/// explicit retention is configured.
const DEFAULT_RETENTION_MULTIPLIER: u32 = 5;

/// Tumbling window configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Width of each tumbling window
    /// Default: 60s
    #[serde(with = "humantime_serde")]
    pub size: Duration,

    /// How long closed windows are retained before cleanup
    /// Default: 5x the window size
    #[serde(default, with = "humantime_serde::option")]
    pub retention: Option<Duration>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: Duration::from_secs(60),
            retention: None,
        }
    }
}

impl WindowConfig {
    /// The retention to apply: configured value, or 5x the window size
    pub fn effective_retention(&self) -> Duration {
        self.retention
            .unwrap_or(self.size * DEFAULT_RETENTION_MULTIPLIER)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.size.is_zero() {
            return Err(ConfigError::invalid_value(
                "window",
                "size",
                "must be greater than zero",
            ));
        }
        if let Some(retention) = self.retention {
            if retention < self.size {
                return Err(ConfigError::invalid_value(
                    "window",
                    "retention",
                    "must be at least one window size",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WindowConfig::default();
        assert_eq!(config.size, Duration::from_secs(60));
        assert_eq!(config.effective_retention(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_retention() {
        let config: WindowConfig = toml::from_str("size = \"30s\"\nretention = \"2m\"").unwrap();
        assert_eq!(config.effective_retention(), Duration::from_secs(120));
    }

    #[test]
    fn test_rejects_zero_size() {
        let config: WindowConfig = toml::from_str("size = \"0s\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_retention_below_size() {
        let config: WindowConfig = toml::from_str("size = \"60s\"\nretention = \"10s\"").unwrap();
        assert!(config.validate().is_err());
    }
}

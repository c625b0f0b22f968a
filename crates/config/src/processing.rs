//! Event processing configuration

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Event processing configuration
///
/// Controls the ingress queue and the worker pool draining it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of worker tasks consuming the event queue
    /// Default: 10, minimum: 1
    pub worker_count: usize,

    /// Capacity of the bounded ingress queue
    /// Default: 1000, minimum: 100
    pub buffer_size: usize,

    /// Interval between window expiry sweeps
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            worker_count: 10,
            buffer_size: 1000,
            flush_interval: Duration::from_secs(5),
        }
    }
}

impl ProcessingConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.worker_count < 1 {
            return Err(ConfigError::invalid_value(
                "processing",
                "worker_count",
                "must be at least 1",
            ));
        }
        if self.buffer_size < 100 {
            return Err(ConfigError::invalid_value(
                "processing",
                "buffer_size",
                format!("{} is below the minimum of 100", self.buffer_size),
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(ConfigError::invalid_value(
                "processing",
                "flush_interval",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

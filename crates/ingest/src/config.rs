//! HTTP server configuration
//!
//! Runtime options for the ingestion endpoint, assembled by the binary
//! from the loaded application config.

/// Default listen port
const DEFAULT_PORT: u16 = 8080;

/// Default upper bound on batch ingestion size
const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Bind address (e.g. "0.0.0.0")
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Maximum number of events in one batch request
    pub max_batch_size: usize,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl HttpServerConfig {
    /// Create config with a custom port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// The socket address to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let config = HttpServerConfig::with_port(9000);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }
}

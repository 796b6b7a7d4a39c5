//! Gateway configuration

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use common::error::{Error, Result};

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listening address
    pub addr: SocketAddr,
    /// Deadline applied to every RPC
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout: Duration::from_millis(5_000),
        }
    }
}

impl GatewayConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port: u16 = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| Error::ConfigurationError(format!("PORT has an invalid value: {}", raw)))?,
            Err(_) => defaults.addr.port(),
        };

        let request_timeout = match env::var("REQUEST_TIMEOUT_MS") {
            Ok(raw) => Duration::from_millis(raw.parse().map_err(|_| {
                Error::ConfigurationError(format!("REQUEST_TIMEOUT_MS has an invalid value: {}", raw))
            })?),
            Err(_) => defaults.request_timeout,
        };

        Ok(Self {
            addr: SocketAddr::new(defaults.addr.ip(), port),
            request_timeout,
        })
    }
}

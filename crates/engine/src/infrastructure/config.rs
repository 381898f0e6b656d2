//! Server configuration

use std::env;
use std::net::{IpAddr, SocketAddr};

/// Buffer size for per-connection message channel.
const DEFAULT_CHANNEL_BUFFER: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Server configuration loaded from environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: IpAddr,
    /// HTTP/WebSocket port
    pub port: u16,
    /// Outbound messages buffered per connection before sends are dropped
    pub channel_buffer: usize,
    /// CORS allowed origins (comma-separated, or "*" for any)
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("SERVER_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| "3000".to_string());
        let channel_buffer = lookup("CONNECTION_CHANNEL_BUFFER")
            .unwrap_or_else(|| DEFAULT_CHANNEL_BUFFER.to_string());

        Ok(Self {
            host: host.parse().map_err(|_| ConfigError::Invalid {
                key: "SERVER_HOST",
                expected: "an IP address",
                value: host.clone(),
            })?,
            port: port.parse().map_err(|_| ConfigError::Invalid {
                key: "SERVER_PORT",
                expected: "a valid port number",
                value: port.clone(),
            })?,
            channel_buffer: channel_buffer
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "CONNECTION_CHANNEL_BUFFER",
                    expected: "a positive integer",
                    value: channel_buffer.clone(),
                })?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 3000,
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

//! HTTP server configuration: bind address, logging, CORS.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

use super::error::ValidationError;

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind, as an IP address ("0.0.0.0", "127.0.0.1", "::1")
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Tracing filter directive, used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub json_logs: bool,

    /// Per-request timeout enforced by the HTTP middleware, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Comma-separated list of allowed CORS origins; unset means permissive
    pub cors_origins: Option<String>,
}

impl ServerConfig {
    /// Address the TCP listener binds to.
    ///
    /// Panics if `host` is not a valid IP address; `validate()` catches
    /// that before the listener is created.
    pub fn bind_addr(&self) -> SocketAddr {
        let ip: IpAddr = self.host.parse().expect("Invalid bind host");
        SocketAddr::new(ip, self.port)
    }

    /// Allowed CORS origins, split on commas and trimmed.
    ///
    /// Returns an empty list when `cors_origins` is unset, which the
    /// router interprets as "allow any origin" (development mode).
    pub fn cors_origins_list(&self) -> Vec<String> {
        match &self.cors_origins {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Validate server configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.host.parse::<IpAddr>().is_err() {
            return Err(ValidationError::InvalidBindHost);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            json_logs: false,
            request_timeout_secs: default_request_timeout(),
            cors_origins: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info,dealdesk=debug,sqlx=warn".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

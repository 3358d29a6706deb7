//! HTTP server configuration
//!
//! Loaded from `STRATA_*` environment variables on top of [`HttpDefaults`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strata_core::{
    get_env_or_default, parse_env_or_default, AppConfigTrait, ConfigError, ConfigSource,
    ConfigValidator, PortValidator,
};

use super::defaults::HttpDefaults;

const ENV_HOST: &str = "STRATA_HOST";
const ENV_PORT: &str = "STRATA_PORT";
const ENV_REQUEST_TIMEOUT: &str = "STRATA_REQUEST_TIMEOUT";
const ENV_MAX_REQUEST_SIZE: &str = "STRATA_MAX_REQUEST_SIZE";
const ENV_ENABLE_TRACING: &str = "STRATA_ENABLE_TRACING";
const ENV_HEALTH_CHECK_PATH: &str = "STRATA_HEALTH_CHECK_PATH";
const ENV_SHUTDOWN_TIMEOUT: &str = "STRATA_SHUTDOWN_TIMEOUT";

/// HTTP server specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    /// Listen port; 0 picks an ephemeral port
    pub port: u16,
    /// Per-request deadline in seconds
    pub request_timeout_secs: u64,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
    /// Wrap the router in tower-http's TraceLayer
    pub enable_tracing: bool,
    pub health_check_path: String,
    /// Grace period for in-flight requests on shutdown
    pub shutdown_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: HttpDefaults::HOST.to_string(),
            port: HttpDefaults::PORT,
            request_timeout_secs: HttpDefaults::REQUEST_TIMEOUT_SECS,
            max_request_size: HttpDefaults::MAX_REQUEST_SIZE,
            enable_tracing: HttpDefaults::ENABLE_TRACING,
            health_check_path: HttpDefaults::HEALTH_CHECK_PATH.to_string(),
            shutdown_timeout_secs: HttpDefaults::SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

impl AppConfigTrait for HttpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = HttpConfig {
            host: get_env_or_default(ENV_HOST, HttpDefaults::HOST),
            port: parse_env_or_default(ENV_PORT, HttpDefaults::PORT, "valid port number")?,
            request_timeout_secs: parse_env_or_default(
                ENV_REQUEST_TIMEOUT,
                HttpDefaults::REQUEST_TIMEOUT_SECS,
                "valid number of seconds",
            )?,
            max_request_size: parse_env_or_default(
                ENV_MAX_REQUEST_SIZE,
                HttpDefaults::MAX_REQUEST_SIZE,
                "valid number of bytes",
            )?,
            enable_tracing: parse_env_or_default(
                ENV_ENABLE_TRACING,
                HttpDefaults::ENABLE_TRACING,
                "true or false",
            )?,
            health_check_path: get_env_or_default(
                ENV_HEALTH_CHECK_PATH,
                HttpDefaults::HEALTH_CHECK_PATH,
            ),
            shutdown_timeout_secs: parse_env_or_default(
                ENV_SHUTDOWN_TIMEOUT,
                HttpDefaults::SHUTDOWN_TIMEOUT_SECS,
                "valid number of seconds",
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::missing_required(
                "host",
                "Set STRATA_HOST, e.g. 127.0.0.1",
            ));
        }

        PortValidator::allow_ephemeral().validate(&self.port)?;

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation_failed(
                "Request timeout must be greater than 0",
            ));
        }

        if self.shutdown_timeout_secs == 0 {
            return Err(ConfigError::validation_failed(
                "Shutdown timeout must be greater than 0",
            ));
        }

        if self.max_request_size == 0 {
            return Err(ConfigError::validation_failed(
                "Maximum request size must be greater than 0",
            ));
        }

        if self.health_check_path.is_empty() || !self.health_check_path.starts_with('/') {
            return Err(ConfigError::validation_failed(
                "Health check path must be non-empty and start with '/'",
            ));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        [
            ("host", ENV_HOST),
            ("port", ENV_PORT),
            ("request_timeout_secs", ENV_REQUEST_TIMEOUT),
            ("max_request_size", ENV_MAX_REQUEST_SIZE),
            ("enable_tracing", ENV_ENABLE_TRACING),
            ("health_check_path", ENV_HEALTH_CHECK_PATH),
            ("shutdown_timeout_secs", ENV_SHUTDOWN_TIMEOUT),
        ]
        .into_iter()
        .map(|(field, var)| {
            let source = if std::env::var(var).is_ok() {
                ConfigSource::EnvVar(var.to_string())
            } else {
                ConfigSource::Default(field.to_string())
            };
            (field.to_string(), source)
        })
        .collect()
    }
}

impl HttpConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Bind address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::invalid_value("host", addr, "IP address such as 127.0.0.1"))
    }
}

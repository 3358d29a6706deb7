//! # strata-security
//!
//! Admission control and access stages for the strata pipeline.
//! Provides a token bucket with an injectable clock, keyed bucket registries,
//! and rate-limit, bearer-auth, role and CORS stages.

pub mod bucket;
pub mod config;
pub mod middleware;

// Re-export main types
pub use bucket::{BucketRegistry, Clock, ManualClock, SystemClock, TokenBucket};
pub use config::{CorsConfig, RateLimitConfig, RateLimitIdentifier, SecurityConfig};
pub use middleware::auth::{BearerAuthStage, Claims, StaticTokenVerifier, TokenVerifier};
pub use middleware::cors::CorsStage;
pub use middleware::rate_limit::RateLimitStage;
pub use middleware::role::RoleStage;

use strata_http::HttpError;

/// Common result type for security operations
pub type SecurityResult<T> = Result<T, SecurityError>;

/// Security-related errors
#[derive(thiserror::Error, Debug)]
pub enum SecurityError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error(transparent)]
    Config(#[from] strata_core::ConfigError),
}

impl SecurityError {
    pub fn config<T: Into<String>>(message: T) -> Self {
        SecurityError::ConfigError {
            message: message.into(),
        }
    }

    pub fn invalid_token<T: Into<String>>(message: T) -> Self {
        SecurityError::InvalidToken {
            message: message.into(),
        }
    }
}

impl From<SecurityError> for HttpError {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::InvalidToken { message } => HttpError::unauthorized(message),
            other => HttpError::config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_http::StatusCode;

    #[test]
    fn invalid_token_maps_to_unauthorized() {
        let err: HttpError = SecurityError::invalid_token("expired").into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn config_errors_map_to_server_errors() {
        let err: HttpError = SecurityError::config("bad rate").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("bad rate"));
    }
}

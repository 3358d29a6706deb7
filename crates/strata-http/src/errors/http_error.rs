//! HTTP error types
//!
//! Every failure a stage or the server can hit is expressed as an [`HttpError`],
//! which renders to the uniform JSON error body `{"error": {"code", "message"}}`.

use axum::http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::response::Response;

/// Result type for HTTP operations
pub type HttpResult<T> = Result<T, HttpError>;

/// HTTP errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Server startup failed: {message}")]
    StartupFailed { message: String },

    #[error("Server shutdown failed: {message}")]
    ShutdownFailed { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Request cancelled")]
    RequestCancelled,

    #[error("Request too large: exceeds limit of {limit} bytes")]
    RequestTooLarge { limit: usize },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Internal server error: {message}")]
    InternalError { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Method not allowed: {method}")]
    MethodNotAllowed { method: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Access forbidden: {message}")]
    Forbidden { message: String },

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },
}

impl HttpError {
    /// Create a startup error
    pub fn startup<T: Into<String>>(message: T) -> Self {
        HttpError::StartupFailed {
            message: message.into(),
        }
    }

    /// Create a shutdown error
    pub fn shutdown<T: Into<String>>(message: T) -> Self {
        HttpError::ShutdownFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<T: Into<String>>(message: T) -> Self {
        HttpError::ConfigError {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        HttpError::BadRequest {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<T: Into<String>>(message: T) -> Self {
        HttpError::InternalError {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        HttpError::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a method not allowed error
    pub fn method_not_allowed<T: Into<String>>(method: T) -> Self {
        HttpError::MethodNotAllowed {
            method: method.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        HttpError::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden<T: Into<String>>(message: T) -> Self {
        HttpError::Forbidden {
            message: message.into(),
        }
    }

    /// Create a service unavailable error
    pub fn unavailable<T: Into<String>>(message: T) -> Self {
        HttpError::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Create a payload too large error
    pub fn payload_too_large(limit: usize) -> Self {
        HttpError::RequestTooLarge { limit }
    }

    /// Get error code for consistent API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            HttpError::StartupFailed { .. } => "SERVER_STARTUP_FAILED",
            HttpError::ShutdownFailed { .. } => "SERVER_SHUTDOWN_FAILED",
            HttpError::ConfigError { .. } => "CONFIGURATION_ERROR",
            HttpError::RequestTimeout => "REQUEST_TIMEOUT",
            HttpError::RequestCancelled => "REQUEST_CANCELLED",
            HttpError::RequestTooLarge { .. } => "REQUEST_TOO_LARGE",
            HttpError::BadRequest { .. } => "BAD_REQUEST",
            HttpError::InternalError { .. } => "INTERNAL_ERROR",
            HttpError::NotFound { .. } => "RESOURCE_NOT_FOUND",
            HttpError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            HttpError::Unauthorized { .. } => "UNAUTHORIZED",
            HttpError::Forbidden { .. } => "ACCESS_FORBIDDEN",
            HttpError::TooManyRequests => "TOO_MANY_REQUESTS",
            HttpError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
        }
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpError::StartupFailed { .. }
            | HttpError::ShutdownFailed { .. }
            | HttpError::ConfigError { .. }
            | HttpError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            HttpError::RequestCancelled | HttpError::ServiceUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            HttpError::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HttpError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            HttpError::NotFound { .. } => StatusCode::NOT_FOUND,
            HttpError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            HttpError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            HttpError::Forbidden { .. } => StatusCode::FORBIDDEN,
            HttpError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Render the uniform JSON error body with the matching status
    pub fn to_response(&self) -> Response {
        Response::with_status(self.status_code()).json_value(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }))
    }
}

impl From<strata_core::ConfigError> for HttpError {
    fn from(err: strata_core::ConfigError) -> Self {
        HttpError::ConfigError {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        HttpError::InternalError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::BadRequest {
            message: format!("JSON error: {}", err),
        }
    }
}

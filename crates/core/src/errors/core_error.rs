use thiserror::Error;

use crate::config::validation::ConfigError;

/// Result alias for operations that fail with [`CoreError`]
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type for the strata crates
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl CoreError {
    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::Io(_) => "IO_ERROR",
            CoreError::Yaml(_) => "YAML_ERROR",
            CoreError::Json(_) => "JSON_ERROR",
            CoreError::Config(_) => "CONFIGURATION_ERROR",
            CoreError::Validation { .. } => "VALIDATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CoreError::validation("bad").error_code(), "VALIDATION_ERROR");
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(CoreError::from(io).error_code(), "IO_ERROR");
    }

    #[test]
    fn test_config_error_converts() {
        let err: CoreError = ConfigError::validation_failed("port must be set").into();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert!(err.to_string().contains("port must be set"));
    }
}

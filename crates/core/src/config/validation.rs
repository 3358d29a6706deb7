use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired { field: String, hint: String },

    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Configuration validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("File system error: {message}")]
    FileSystemError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Create a missing required field error
    pub fn missing_required(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create a validation failed error
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

/// Trait for validating configuration values
pub trait ConfigValidator<T> {
    /// Validate a configuration value
    fn validate(&self, value: &T) -> Result<(), ConfigError>;
}

/// Port number validator
pub struct PortValidator {
    pub min: u16,
    pub max: u16,
}

impl Default for PortValidator {
    fn default() -> Self {
        Self { min: 1, max: 65535 }
    }
}

impl PortValidator {
    /// Accept port 0 too (ephemeral port, used by tests)
    pub fn allow_ephemeral() -> Self {
        Self { min: 0, max: 65535 }
    }
}

impl ConfigValidator<u16> for PortValidator {
    fn validate(&self, value: &u16) -> Result<(), ConfigError> {
        if *value < self.min || *value > self.max {
            return Err(ConfigError::invalid_value(
                "port",
                value.to_string(),
                format!("port between {} and {}", self.min, self.max),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_validator() {
        let validator = PortValidator::default();
        assert!(validator.validate(&8080).is_ok());
        assert!(validator.validate(&0).is_err());
        assert!(PortValidator::allow_ephemeral().validate(&0).is_ok());
    }

    #[test]
    fn test_invalid_value_message() {
        let err = ConfigError::invalid_value("rate", "-1", "a positive number");
        assert_eq!(
            err.to_string(),
            "Invalid value for field 'rate': '-1'. Expected: a positive number"
        );
    }
}

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use crate::config::{ConfigError, ConfigSource};

/// Configuration trait for application configuration
pub trait AppConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Environment enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::invalid_value(
                "environment",
                s,
                "development, testing, or production",
            )),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_str = match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        };
        write!(f, "{}", env_str)
    }
}

impl Environment {
    /// Read `STRATA_ENV`, defaulting to development
    pub fn from_env() -> Result<Self, ConfigError> {
        get_env_or_default("STRATA_ENV", "development").parse()
    }

    /// Check if environment is development
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    /// Check if environment is testing
    pub fn is_testing(&self) -> bool {
        matches!(self, Environment::Testing)
    }

    /// Check if environment is production
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get debug mode status based on environment
    pub fn debug_mode(&self) -> bool {
        !self.is_production()
    }
}

/// Read an environment variable, falling back to `default` when unset
pub fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an environment variable, falling back to `default` when unset
pub fn parse_env_or_default<T>(key: &str, default: T, expected: &str) -> Result<T, ConfigError>
where
    T: FromStr,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::invalid_value(key, raw, expected)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("Test".parse::<Environment>().unwrap(), Environment::Testing);
        assert!("staging".parse::<Environment>().is_err());
        assert!(!Environment::Production.debug_mode());
    }

    #[test]
    #[serial]
    fn test_parse_env_or_default() {
        env::remove_var("STRATA_TEST_NUMBER");
        assert_eq!(parse_env_or_default("STRATA_TEST_NUMBER", 7u64, "a number").unwrap(), 7);

        env::set_var("STRATA_TEST_NUMBER", " 42 ");
        assert_eq!(parse_env_or_default("STRATA_TEST_NUMBER", 7u64, "a number").unwrap(), 42);

        env::set_var("STRATA_TEST_NUMBER", "many");
        let err = parse_env_or_default("STRATA_TEST_NUMBER", 7u64, "a number").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        env::remove_var("STRATA_TEST_NUMBER");
    }

    #[test]
    #[serial]
    fn test_environment_from_env() {
        env::set_var("STRATA_ENV", "production");
        assert_eq!(Environment::from_env().unwrap(), Environment::Production);
        env::remove_var("STRATA_ENV");
        assert_eq!(Environment::from_env().unwrap(), Environment::Development);
    }
}

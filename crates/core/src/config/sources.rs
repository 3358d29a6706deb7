use std::path::Path;

use serde::de::DeserializeOwned;

use super::validation::ConfigError;

/// Configuration source information for debugging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value loaded from environment variable
    EnvVar(String),
    /// Default value used
    Default(String),
    /// Value loaded from file
    File(String),
    /// Value provided programmatically
    Programmatic,
}

impl ConfigSource {
    /// Check if source is environment variable
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }

    /// Check if source is default value
    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default(_))
    }

    /// Check if source is from file
    pub fn is_file(&self) -> bool {
        matches!(self, ConfigSource::File(_))
    }

    /// Get source description
    pub fn description(&self) -> String {
        match self {
            ConfigSource::EnvVar(var) => format!("Environment variable: {}", var),
            ConfigSource::Default(value) => format!("Default value: {}", value),
            ConfigSource::File(path) => format!("Configuration file: {}", path),
            ConfigSource::Programmatic => "Programmatically set".to_string(),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Read and deserialize a YAML configuration file
pub fn load_yaml_file<T, P>(path: P) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileSystemError {
        message: format!("failed to read {}: {}", path.display(), e),
    })?;

    tracing::debug!(path = %path.display(), "loading YAML configuration");
    Ok(serde_yaml::from_str(&contents)?)
}

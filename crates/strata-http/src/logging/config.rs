//! # Structured Logging
//!
//! Installs the process-wide `tracing` subscriber with plain, pretty or JSON
//! output and an `EnvFilter` that honours `RUST_LOG`.

use std::io;
use std::str::FromStr;

use serde_json::{json, Value};
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(LogFormat::Plain),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!(
                "unknown log format '{}', expected plain, pretty or json",
                other
            )),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    pub format: LogFormat,
    /// Include file and line number information
    pub include_location: bool,
    /// Custom fields echoed in the initialization line
    pub global_fields: serde_json::Map<String, Value>,
    /// Environment filter (supports complex filters like "strata_http=debug,tower_http=info")
    pub env_filter: Option<String>,
    pub service_name: Option<String>,
    pub service_version: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Plain,
            include_location: false,
            global_fields: serde_json::Map::new(),
            env_filter: None,
            service_name: None,
            service_version: None,
        }
    }
}

impl LoggingConfig {
    /// Create production logging configuration
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            env_filter: Some("strata_http=info,strata_security=info,tower_http=warn".to_string()),
            ..Self::default()
        }
        .with_global_field("env", "production")
    }

    /// Create development logging configuration
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            env_filter: Some(
                "strata_http=debug,strata_security=debug,tower_http=debug".to_string(),
            ),
            ..Self::default()
        }
        .with_global_field("env", "development")
    }

    /// Create test logging configuration (minimal output)
    pub fn test() -> Self {
        Self {
            level: "error".to_string(),
            env_filter: Some("strata_http=error".to_string()),
            ..Self::default()
        }
        .with_global_field("env", "test")
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Add a global field to the initialization line
    pub fn with_global_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.global_fields.insert(key.into(), value.into());
        self
    }

    /// Set service name and version
    pub fn with_service(mut self, name: &str, version: &str) -> Self {
        self.service_name = Some(name.to_string());
        self.service_version = Some(version.to_string());
        self
    }

    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }
}

/// Initialize structured logging for the application
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = config.env_filter.as_deref().unwrap_or(&config.level);
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(env_filter))?;

    let registry = tracing_subscriber::registry().with(filter);
    let layer = Layer::new()
        .with_writer(io::stdout)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    match config.format {
        LogFormat::Json => registry.with(layer.json()).try_init()?,
        LogFormat::Pretty => registry.with(layer.pretty()).try_init()?,
        LogFormat::Plain => registry.with(layer).try_init()?,
    }

    let mut init_msg = json!({
        "message": "Structured logging initialized",
        "level": config.level,
        "format": format!("{:?}", config.format).to_lowercase(),
    });
    if let Some(name) = config.service_name {
        init_msg["service_name"] = json!(name);
    }
    if let Some(version) = config.service_version {
        init_msg["service_version"] = json!(version);
    }
    for (key, value) in config.global_fields {
        init_msg[key] = value;
    }

    tracing::info!("{}", init_msg);
    Ok(())
}

/// Log application startup with system information
pub fn log_startup_info(service_name: &str, service_version: &str) {
    let startup_info = json!({
        "event": "application_startup",
        "service": service_name,
        "version": service_version,
        "pid": std::process::id(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "os": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
    });

    tracing::info!("{}", startup_info);
}

/// Log application shutdown
pub fn log_shutdown_info(service_name: &str) {
    let shutdown_info = json!({
        "event": "application_shutdown",
        "service": service_name,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    tracing::info!("{}", shutdown_info);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(LoggingConfig::production().format, LogFormat::Json);
        assert_eq!(LoggingConfig::development().format, LogFormat::Pretty);
        assert_eq!(
            LoggingConfig::test().global_fields.get("env"),
            Some(&json!("test"))
        );
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Plain);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_with_service() {
        let config = LoggingConfig::default().with_service("strata-demo", "0.1.0");
        assert_eq!(config.service_name.as_deref(), Some("strata-demo"));
        assert_eq!(config.service_version.as_deref(), Some("0.1.0"));
    }
}

//! Security configuration types and utilities

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_core::load_yaml_file;

use crate::{SecurityError, SecurityResult};

/// Global security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: Option<RateLimitConfig>,

    /// CORS configuration
    #[serde(default)]
    pub cors: Option<CorsConfig>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            rate_limiting: Some(RateLimitConfig::default()),
            cors: Some(CorsConfig::default()),
        }
    }
}

impl SecurityConfig {
    /// Load and validate a YAML configuration file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> SecurityResult<Self> {
        let config: SecurityConfig = load_yaml_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate YAML text
    pub fn from_yaml_str(yaml: &str) -> SecurityResult<Self> {
        let config: SecurityConfig = serde_yaml::from_str(yaml)
            .map_err(|e| SecurityError::config(format!("invalid security YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SecurityResult<()> {
        if let Some(rate_limiting) = &self.rate_limiting {
            rate_limiting.validate()?;
        }
        if let Some(cors) = &self.cors {
            cors.validate()?;
        }
        Ok(())
    }
}

/// Token-bucket rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Tokens added per second
    pub rate: f64,

    /// Bucket capacity, the largest admissible burst
    pub capacity: f64,

    /// Identifier strategy (IP, user ID, etc.)
    pub identifier: RateLimitIdentifier,

    /// Paths exempt from rate limiting; a trailing `*` matches a prefix
    pub exempt_paths: Vec<String>,

    /// Upper bound on tracked identifiers before idle buckets are pruned
    pub max_tracked: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: 5.0,
            capacity: 10.0,
            identifier: RateLimitIdentifier::IpAddress,
            exempt_paths: Vec::new(),
            max_tracked: 10_000,
        }
    }
}

impl RateLimitConfig {
    pub fn validate(&self) -> SecurityResult<()> {
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(SecurityError::config(format!(
                "rate_limiting.rate must be a finite, non-negative number (got {})",
                self.rate
            )));
        }
        if !self.capacity.is_finite() || self.capacity < 1.0 {
            return Err(SecurityError::config(format!(
                "rate_limiting.capacity must be at least 1 (got {})",
                self.capacity
            )));
        }
        if self.max_tracked == 0 {
            return Err(SecurityError::config(
                "rate_limiting.max_tracked must be greater than 0",
            ));
        }
        if let RateLimitIdentifier::CustomHeader(name) = &self.identifier {
            if name.trim().is_empty() {
                return Err(SecurityError::config(
                    "rate_limiting.identifier custom header name cannot be empty",
                ));
            }
        }
        Ok(())
    }
}

/// Rate limit identifier strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitIdentifier {
    /// One bucket shared by every request
    Global,
    /// Use client IP address
    IpAddress,
    /// Use authenticated user ID, falling back to `X-User-ID`
    UserId,
    /// Use `X-API-Key`
    ApiKey,
    /// Custom identifier from header
    CustomHeader(String),
}

/// CORS (Cross-Origin Resource Sharing) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `*` allows any origin
    pub allowed_origins: Vec<String>,

    /// Allowed HTTP methods
    pub allowed_methods: Vec<String>,

    /// Allowed request headers
    pub allowed_headers: Vec<String>,

    /// Headers exposed to the client
    pub exposed_headers: Vec<String>,

    /// Whether to allow credentials (cookies, authorization headers)
    pub allow_credentials: bool,

    /// Maximum age for preflight cache (seconds)
    pub max_age: Option<u32>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: [
                "Origin",
                "Content-Type",
                "Accept",
                "Authorization",
                "X-Request-ID",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            exposed_headers: vec!["X-Request-ID".to_string(), "X-Response-Time".to_string()],
            allow_credentials: false,
            max_age: Some(86400), // 24 hours
        }
    }
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    pub fn validate(&self) -> SecurityResult<()> {
        // Browsers reject a wildcard origin on credentialed requests
        if self.allow_credentials && self.allows_any_origin() {
            return Err(SecurityError::config(
                "cors.allow_credentials cannot be combined with a wildcard origin",
            ));
        }
        if self.allowed_methods.is_empty() {
            return Err(SecurityError::config("cors.allowed_methods cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SecurityConfig::default().validate().is_ok());
    }

    #[test]
    fn parses_partial_yaml_with_defaults() {
        let config = SecurityConfig::from_yaml_str(
            r#"
rate_limiting:
  rate: 2.5
  capacity: 4
  identifier: api_key
  exempt_paths: ["/health", "/public/*"]
cors:
  allowed_origins: ["https://example.com"]
  allow_credentials: true
"#,
        )
        .unwrap();

        let rate = config.rate_limiting.unwrap();
        assert_eq!(rate.rate, 2.5);
        assert_eq!(rate.capacity, 4.0);
        assert_eq!(rate.identifier, RateLimitIdentifier::ApiKey);
        assert_eq!(rate.max_tracked, 10_000);

        let cors = config.cors.unwrap();
        assert!(cors.allow_credentials);
        assert!(!cors.allows_any_origin());
        assert_eq!(cors.max_age, Some(86400));
    }

    #[test]
    fn custom_header_identifier_uses_yaml_tag() {
        let config = SecurityConfig::from_yaml_str(
            "rate_limiting:\n  identifier: !custom_header x-tenant\n",
        )
        .unwrap();

        assert_eq!(
            config.rate_limiting.unwrap().identifier,
            RateLimitIdentifier::CustomHeader("x-tenant".to_string())
        );
    }

    #[test]
    fn omitted_sections_are_disabled() {
        let config = SecurityConfig::from_yaml_str("cors:\n  max_age: 60\n").unwrap();
        assert!(config.rate_limiting.is_none());
        assert!(config.cors.is_some());
    }

    #[test]
    fn rejects_invalid_rate_limits() {
        let negative = RateLimitConfig {
            rate: -1.0,
            ..RateLimitConfig::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(SecurityError::ConfigError { .. })
        ));

        let tiny = RateLimitConfig {
            capacity: 0.5,
            ..RateLimitConfig::default()
        };
        assert!(tiny.validate().is_err());

        let unbounded = RateLimitConfig {
            max_tracked: 0,
            ..RateLimitConfig::default()
        };
        assert!(unbounded.validate().is_err());
    }

    #[test]
    fn rejects_credentials_with_wildcard_origin() {
        let cors = CorsConfig {
            allow_credentials: true,
            ..CorsConfig::default()
        };
        assert!(cors.validate().is_err());
    }

    #[test]
    fn invalid_yaml_is_a_config_error() {
        let err = SecurityConfig::from_yaml_str("rate_limiting: [not, a, map]").unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn missing_file_surfaces_core_error() {
        let err = SecurityConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, SecurityError::Config(_)));
    }
}

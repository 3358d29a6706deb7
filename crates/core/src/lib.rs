//! # strata-core
//!
//! Shared error type and configuration primitives used by every strata crate.

pub mod config;
pub mod errors;

pub use config::validation::{ConfigError, ConfigValidator, PortValidator};
pub use config::{
    get_env_or_default, load_yaml_file, parse_env_or_default, AppConfigTrait, ConfigSource,
    Environment,
};
pub use errors::{CoreError, CoreResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framework information
pub const FRAMEWORK_NAME: &str = "strata";

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}

/// Get framework name
pub fn name() -> &'static str {
    FRAMEWORK_NAME
}

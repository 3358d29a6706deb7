//! # strata
//!
//! Umbrella package for the strata request pipeline: re-exports the core,
//! HTTP and security crates and hosts the demo application served by the
//! `strata-demo` binary.

// Re-export all sub-packages as modules
pub use strata_core as core;
pub use strata_http as http;
pub use strata_security as security;

// Re-export common types at root level for convenience
pub use strata_core::{AppConfigTrait, ConfigError, Environment};
pub use strata_http::{
    HttpConfig, HttpError, HttpResult, MiddlewareChain, PipelineRouter, Request,
    RequestContext, Response, RouteGroup, Server, Stage,
};
pub use strata_security::{SecurityConfig, SecurityError, SecurityResult};

pub mod demo;

// Prelude module for convenient imports
pub mod prelude;

/// Current version of strata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

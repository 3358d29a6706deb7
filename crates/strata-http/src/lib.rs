//! # strata-http
//!
//! Onion-model request pipeline for the strata framework.
//!
//! This crate provides:
//! - [`RequestContext`], the per-request state every stage sees
//! - the [`Stage`] trait and [`MiddlewareChain`]
//! - the [`Executor`], which drives a chain plus a terminal handler and turns panics into 500s
//! - built-in stages (recovery, request id, access log, timing, cancellation)
//! - an axum bridge ([`RouteGroup`], [`PipelineRouter`]) and a [`Server`] with graceful shutdown

// Core modules
pub mod config;
pub mod errors;
pub mod foundation;
pub mod logging;
pub mod middleware;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod routing;
pub mod server;
pub mod testing;

pub use config::HttpConfig;
pub use errors::{HttpError, HttpResult};
pub use server::Server;

// Pipeline core
pub use pipeline::{
    execute, handler_fn, stage_fn, ErrorHandlerConfig, ExecutionOptions, Executor,
    MiddlewareChain, RequestContext, Stage,
};

// Request/response
pub use request::Request;
pub use response::{Response, ResponseBody};

// Built-in stages
pub use middleware::{
    AccessLogStage, CancellationStage, RecoveryStage, RequestIdStage, RequestIdStrategy,
    TimingStage,
};

// Routing
pub use routing::{respond_with, PipelineRouter, RouteGroup};

// Logging
pub use logging::{init_logging, log_shutdown_info, log_startup_info, LogFormat, LoggingConfig};

// HTTP primitives
pub use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

// Re-exported so stages can accept cancellation tokens without a direct dependency
pub use tokio_util::sync::CancellationToken;

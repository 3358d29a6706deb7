//! # Prelude
//!
//! The prelude module provides convenient imports for common strata functionality.
//!
//! ```rust
//! use strata_web::prelude::*;
//! ```

// Pipeline core
pub use strata_http::{
    execute, handler_fn, stage_fn, Executor, MiddlewareChain, RequestContext, Stage,
};

// Essential HTTP types
pub use strata_http::{HttpError, HttpResult, Request, Response, ResponseBody, StatusCode};
pub use strata_http::{HttpConfig, PipelineRouter, RouteGroup, Server};

// Built-in stages
pub use strata_http::{AccessLogStage, RecoveryStage, RequestIdStage, TimingStage};
pub use strata_security::{BearerAuthStage, CorsStage, RateLimitStage, RoleStage};

// Admission control
pub use strata_security::{Clock, TokenBucket};

// Core types
pub use strata_core::{AppConfigTrait, Environment};

// JSON helper
pub use serde_json::json;

// Common derives
pub use serde::{Deserialize, Serialize};

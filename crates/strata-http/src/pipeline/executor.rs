//! # Pipeline Executor
//!
//! Drives a [`MiddlewareChain`] plus a terminal handler to completion for one
//! request, on the calling thread. A panic anywhere in the traversal is caught
//! here once and becomes a 500 response; it never escapes to the caller.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use axum::http::StatusCode;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::chain::MiddlewareChain;
use super::context::RequestContext;
use super::stage::Stage;
use crate::foundation::CTX_REQUEST_ID;
use crate::request::Request;
use crate::response::Response;

/// Panic handling configuration
#[derive(Debug, Clone)]
pub struct ErrorHandlerConfig {
    /// Whether to include panic details in error responses (development only)
    pub include_panic_details: bool,

    /// Whether to log panics
    pub log_errors: bool,
}

impl Default for ErrorHandlerConfig {
    fn default() -> Self {
        Self {
            include_panic_details: cfg!(debug_assertions),
            log_errors: true,
        }
    }
}

impl ErrorHandlerConfig {
    /// Build the 500 response for a caught panic
    pub fn panic_response(&self, panic_message: &str) -> Response {
        let message = if self.include_panic_details {
            format!("Internal server error: {}", panic_message)
        } else {
            "Internal server error occurred".to_string()
        };

        Response::with_status(StatusCode::INTERNAL_SERVER_ERROR).json_value(json!({
            "error": {
                "code": "INTERNAL_ERROR",
                "message": message,
            }
        }))
    }
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic occurred".to_string()
    }
}

/// Per-execution cancellation signal and deadline
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    pub cancellation: Option<CancellationToken>,
    pub deadline: Option<Instant>,
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Runs chains to completion
#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: ErrorHandlerConfig,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ErrorHandlerConfig) -> Self {
        Self { config }
    }

    /// Enable panic details in responses (use only in development)
    pub fn with_panic_details(mut self, include: bool) -> Self {
        self.config.include_panic_details = include;
        self
    }

    pub fn config(&self) -> &ErrorHandlerConfig {
        &self.config
    }

    /// Execute with no cancellation signal and no deadline
    pub fn execute(
        &self,
        chain: &MiddlewareChain,
        handler: &dyn Stage,
        request: Request,
    ) -> Response {
        self.execute_with(chain, handler, request, ExecutionOptions::default())
    }

    pub fn execute_with(
        &self,
        chain: &MiddlewareChain,
        handler: &dyn Stage,
        request: Request,
        options: ExecutionOptions,
    ) -> Response {
        let mut ctx = RequestContext::new(request, chain.stages(), handler)
            .with_deadline(options.deadline);
        if let Some(token) = options.cancellation {
            ctx = ctx.with_cancellation(token);
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| ctx.next()));

        if let Err(payload) = outcome {
            let message = panic_message(payload.as_ref());
            if self.config.log_errors {
                tracing::error!(
                    method = %ctx.request().method,
                    path = ctx.request().path(),
                    request_id = ctx.get_str(CTX_REQUEST_ID).unwrap_or("-"),
                    cursor = ctx.index(),
                    panic = %message,
                    "panic while processing request"
                );
            }
            return self.config.panic_response(&message);
        }

        if let Some(stage) = ctx.halted_at() {
            tracing::debug!(
                stage,
                path = ctx.request().path(),
                written = ctx.is_written(),
                "chain halted: stage returned without calling next()"
            );
        }

        ctx.into_response()
    }
}

/// Execute `chain` and `handler` for one request with default settings
pub fn execute(chain: &MiddlewareChain, handler: &dyn Stage, request: Request) -> Response {
    Executor::default().execute(chain, handler, request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stage::{handler_fn, stage_fn};
    use crate::response::ResponseBody;
    use axum::http::{HeaderMap, Method};

    fn request() -> Request {
        Request::new(Method::GET, "/exec".parse().unwrap(), HeaderMap::new())
    }

    #[test]
    fn test_zero_stage_chain_runs_handler() {
        let handler = handler_fn("hello", |_| Response::ok().text("hello"));
        let response = execute(&MiddlewareChain::new(), &handler, request());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), &ResponseBody::Text("hello".into()));
    }

    #[test]
    fn test_unwritten_response_defaults_to_ok() {
        let chain = MiddlewareChain::new().with(stage_fn("swallow", |_| {}));
        let handler = handler_fn("unreachable", |_| {
            Response::with_status(StatusCode::IM_A_TEAPOT)
        });

        let response = execute(&chain, &handler, request());

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_panic_becomes_500() {
        let chain = MiddlewareChain::new().with(stage_fn("header", |ctx| {
            ctx.set_header("x-before-panic", "1");
            ctx.next();
        }));
        let handler = handler_fn("explode", |_| panic!("boom"));

        let executor = Executor::new().with_panic_details(true);
        let response = executor.execute(&chain, &handler, request());

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.header("x-before-panic").is_none());
        match response.body() {
            ResponseBody::Json(value) => {
                assert_eq!(value["error"]["code"], "INTERNAL_ERROR");
                assert_eq!(value["error"]["message"], "Internal server error: boom");
            }
            other => panic!("expected JSON body, got {:?}", other),
        }
    }

    #[test]
    fn test_panic_details_hidden() {
        let handler = handler_fn("explode", |_| panic!("secret detail"));
        let executor = Executor::new().with_panic_details(false);
        let response = executor.execute(&MiddlewareChain::new(), &handler, request());

        let text = response.body().as_text().unwrap();
        assert!(!text.contains("secret detail"));
    }

    #[test]
    fn test_options_reach_context() {
        let token = CancellationToken::new();
        token.cancel();
        let handler = handler_fn("check", |ctx| {
            if ctx.is_cancelled() {
                Response::with_status(StatusCode::SERVICE_UNAVAILABLE)
            } else {
                Response::ok()
            }
        });

        let options = ExecutionOptions::new().with_cancellation(token);
        let response =
            Executor::new().execute_with(&MiddlewareChain::new(), &handler, request(), options);

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

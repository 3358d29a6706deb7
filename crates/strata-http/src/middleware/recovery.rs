//! Panic recovery stage
//!
//! Catches a panic raised by any stage inward of it and aborts with a 500, so
//! the stages outward of it unwind normally (access logs still see the request).

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::foundation::CTX_REQUEST_ID;
use crate::pipeline::{panic_message, ErrorHandlerConfig, RequestContext, Stage};

#[derive(Debug, Clone, Default)]
pub struct RecoveryStage {
    config: ErrorHandlerConfig,
}

impl RecoveryStage {
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
}

impl Stage for RecoveryStage {
    fn process(&self, ctx: &mut RequestContext<'_>) {
        let outcome = catch_unwind(AssertUnwindSafe(|| ctx.next()));

        if let Err(payload) = outcome {
            let message = panic_message(payload.as_ref());
            if self.config.log_errors {
                tracing::error!(
                    path = ctx.request().path(),
                    request_id = ctx.get_str(CTX_REQUEST_ID).unwrap_or("-"),
                    panic = %message,
                    "recovered from panic in pipeline"
                );
            }
            ctx.push_error(format!("panic: {}", message));
            ctx.abort_replacing_response(self.config.panic_response(&message));
        }
    }

    fn name(&self) -> &'static str {
        "Recovery"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{execute, handler_fn, stage_fn, MiddlewareChain};
    use crate::request::Request;
    use crate::response::Response;
    use axum::http::{HeaderMap, Method, StatusCode};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_outer_stage_unwinds_after_recovered_panic() {
        let seen = Arc::new(Mutex::new(None));
        let outer_seen = seen.clone();

        let chain = MiddlewareChain::new()
            .with(stage_fn("outer", move |ctx| {
                ctx.next();
                *outer_seen.lock().unwrap() = Some(ctx.response_status());
            }))
            .with(RecoveryStage::new());
        let handler = handler_fn("explode", |_| -> Response { panic!("handler failed") });

        let request = Request::new(Method::GET, "/".parse().unwrap(), HeaderMap::new());
        let response = execute(&chain, &handler, request);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            *seen.lock().unwrap(),
            Some(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }

    #[test]
    fn test_panic_after_written_response_still_returns_500() {
        let chain = MiddlewareChain::new()
            .with(RecoveryStage::new())
            .with(stage_fn("late-failure", |ctx| {
                ctx.next();
                panic!("failed after handler");
            }));
        let handler = handler_fn("ok", |_| Response::ok());

        let request = Request::new(Method::GET, "/".parse().unwrap(), HeaderMap::new());
        let response = execute(&chain, &handler, request);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! Cooperative cancellation check
//!
//! Aborts with 503 when the request was cancelled (client gone, server shutting
//! down) or has already run past its deadline. Place it before expensive stages.

use crate::errors::HttpError;
use crate::pipeline::{RequestContext, Stage};

#[derive(Debug, Clone, Copy, Default)]
pub struct CancellationStage;

impl CancellationStage {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for CancellationStage {
    fn process(&self, ctx: &mut RequestContext<'_>) {
        if ctx.is_cancelled() {
            tracing::warn!(path = ctx.request().path(), "request cancelled before completion");
            ctx.abort_with_error(HttpError::RequestCancelled);
            return;
        }
        ctx.next();
    }

    fn name(&self) -> &'static str {
        "Cancellation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{handler_fn, ExecutionOptions, Executor, MiddlewareChain};
    use crate::request::Request;
    use crate::response::Response;
    use axum::http::{HeaderMap, Method, StatusCode};
    use std::time::{Duration, Instant};
    use tokio_util::sync::CancellationToken;

    fn get() -> Request {
        Request::new(Method::GET, "/".parse().unwrap(), HeaderMap::new())
    }

    #[test]
    fn test_live_request_passes() {
        let chain = MiddlewareChain::new().with(CancellationStage::new());
        let handler = handler_fn("ok", |_| Response::ok().text("done"));

        let response = Executor::new().execute(&chain, &handler, get());

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_cancelled_token_aborts() {
        let chain = MiddlewareChain::new().with(CancellationStage::new());
        let handler = handler_fn("ok", |_| Response::ok());
        let token = CancellationToken::new();
        token.cancel();

        let response = Executor::new().execute_with(
            &chain,
            &handler,
            get(),
            ExecutionOptions::new().with_cancellation(token),
        );

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_expired_deadline_aborts() {
        let chain = MiddlewareChain::new().with(CancellationStage::new());
        let handler = handler_fn("ok", |_| Response::ok());
        let deadline = Instant::now() - Duration::from_millis(10);

        let response = Executor::new().execute_with(
            &chain,
            &handler,
            get(),
            ExecutionOptions::new().with_deadline(deadline),
        );

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

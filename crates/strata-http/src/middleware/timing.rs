//! # Timing Stage
//!
//! Measures time spent inward of this stage and reports it in
//! `X-Response-Time`.

use std::time::{Duration, Instant};

use crate::foundation::HEADER_RESPONSE_TIME;
use crate::pipeline::{RequestContext, Stage};

#[derive(Debug, Clone)]
pub struct TimingStage {
    /// Whether to add X-Response-Time header to responses
    add_header: bool,
    /// Warning threshold for slow requests
    slow_threshold: Duration,
}

impl TimingStage {
    pub fn new() -> Self {
        Self {
            add_header: true,
            slow_threshold: Duration::from_secs(1),
        }
    }

    pub fn without_header(mut self) -> Self {
        self.add_header = false;
        self
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }
}

impl Default for TimingStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for TimingStage {
    fn process(&self, ctx: &mut RequestContext<'_>) {
        let start = Instant::now();
        ctx.next();
        let elapsed = start.elapsed();

        if self.add_header {
            let value = format!("{:.3}ms", elapsed.as_secs_f64() * 1000.0);
            ctx.set_header(HEADER_RESPONSE_TIME, &value);
        }

        if elapsed > self.slow_threshold {
            tracing::warn!(
                path = ctx.request().path(),
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.slow_threshold.as_millis() as u64,
                "slow request"
            );
        }
    }

    fn name(&self) -> &'static str {
        "Timing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{execute, handler_fn, MiddlewareChain};
    use crate::request::Request;
    use crate::response::Response;
    use axum::http::{HeaderMap, Method, StatusCode};
    use tracing_test::traced_test;

    fn get() -> Request {
        Request::new(Method::GET, "/".parse().unwrap(), HeaderMap::new())
    }

    #[test]
    fn test_header_added_even_on_abort() {
        let chain = MiddlewareChain::new().with(TimingStage::new());
        let handler = handler_fn("not_found", |_| Response::with_status(StatusCode::NOT_FOUND));

        let response = execute(&chain, &handler, get());

        let value = response.header(HEADER_RESPONSE_TIME).unwrap();
        assert!(value.ends_with("ms"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_without_header() {
        let chain = MiddlewareChain::new().with(TimingStage::new().without_header());
        let handler = handler_fn("ok", |_| Response::ok());

        let response = execute(&chain, &handler, get());

        assert!(response.header(HEADER_RESPONSE_TIME).is_none());
    }

    #[test]
    #[traced_test]
    fn test_slow_request_warning() {
        let chain = MiddlewareChain::new()
            .with(TimingStage::new().with_slow_threshold(Duration::from_millis(1)));
        let handler = handler_fn("slow", |_| {
            std::thread::sleep(Duration::from_millis(5));
            Response::ok()
        });

        execute(&chain, &handler, get());

        assert!(logs_contain("slow request"));
    }
}

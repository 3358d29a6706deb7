//! # Access Log Stage
//!
//! Logs one structured line per request on the way out: method, path, status,
//! latency, request id and any errors stages collected. 5xx logs at `error`,
//! 4xx at `warn`, everything else at `info`.

use std::time::Instant;

use tracing::{error, info, warn};

use crate::foundation::CTX_REQUEST_ID;
use crate::pipeline::{RequestContext, Stage};

#[derive(Debug, Clone, Default)]
pub struct AccessLogStage {
    skip_paths: Vec<String>,
}

impl AccessLogStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not log requests to this exact path (e.g. health checks)
    pub fn skip_path(mut self, path: impl Into<String>) -> Self {
        self.skip_paths.push(path.into());
        self
    }

    fn should_skip(&self, path: &str) -> bool {
        self.skip_paths.iter().any(|p| p == path)
    }
}

impl Stage for AccessLogStage {
    fn process(&self, ctx: &mut RequestContext<'_>) {
        if self.should_skip(ctx.request().path()) {
            ctx.next();
            return;
        }

        let start = Instant::now();
        ctx.next();
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let request = ctx.request();
        let method = request.method.as_str();
        let path = request.path();
        let status = ctx.response_status().as_u16();
        let request_id = ctx.get_str(CTX_REQUEST_ID).unwrap_or("-");
        let errors = ctx.errors().join("; ");

        if status >= 500 {
            error!(method, path, status, latency_ms, request_id, errors = %errors, "request completed");
        } else if status >= 400 {
            warn!(method, path, status, latency_ms, request_id, errors = %errors, "request completed");
        } else {
            info!(method, path, status, latency_ms, request_id, "request completed");
        }
    }

    fn name(&self) -> &'static str {
        "AccessLog"
    }
}

//! # Request ID Stage
//!
//! Reuses an inbound `X-Request-ID` or generates one, stores it in the context
//! under `request_id` and echoes it on the response.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::foundation::{CTX_REQUEST_ID, HEADER_REQUEST_ID};
use crate::pipeline::{RequestContext, Stage};

/// Request ID generation strategy
#[derive(Debug)]
pub enum RequestIdStrategy {
    /// Generate UUID v4 (random)
    UuidV4,
    /// Use custom prefix with UUID
    PrefixedUuid(String),
    /// Use incrementing counter (not suitable for distributed systems)
    Counter(AtomicU64),
}

impl Default for RequestIdStrategy {
    fn default() -> Self {
        Self::UuidV4
    }
}

impl RequestIdStrategy {
    pub fn counter() -> Self {
        Self::Counter(AtomicU64::new(0))
    }

    /// Generate a new request ID using this strategy
    pub fn generate(&self) -> String {
        match self {
            Self::UuidV4 => Uuid::new_v4().to_string(),
            Self::PrefixedUuid(prefix) => format!("{}-{}", prefix, Uuid::new_v4()),
            Self::Counter(counter) => {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                format!("req-{:016x}", count)
            }
        }
    }
}

#[derive(Debug)]
pub struct RequestIdStage {
    header_name: String,
    strategy: RequestIdStrategy,
    override_existing: bool,
    add_to_response: bool,
}

impl Default for RequestIdStage {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestIdStage {
    pub fn new() -> Self {
        Self {
            header_name: HEADER_REQUEST_ID.to_string(),
            strategy: RequestIdStrategy::default(),
            override_existing: false,
            add_to_response: true,
        }
    }

    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn strategy(mut self, strategy: RequestIdStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn prefixed(self, prefix: impl Into<String>) -> Self {
        self.strategy(RequestIdStrategy::PrefixedUuid(prefix.into()))
    }

    pub fn counter(self) -> Self {
        self.strategy(RequestIdStrategy::counter())
    }

    /// Always generate, ignoring any inbound id
    pub fn override_existing(mut self) -> Self {
        self.override_existing = true;
        self
    }

    pub fn no_response_header(mut self) -> Self {
        self.add_to_response = false;
        self
    }

    fn resolve(&self, ctx: &RequestContext<'_>) -> String {
        if !self.override_existing {
            if let Some(existing) = ctx.request().header(&self.header_name) {
                let existing = existing.trim();
                if !existing.is_empty() {
                    return existing.to_string();
                }
            }
        }
        self.strategy.generate()
    }
}

impl Stage for RequestIdStage {
    fn process(&self, ctx: &mut RequestContext<'_>) {
        let request_id = self.resolve(ctx);
        tracing::trace!(request_id = %request_id, "assigned request id");

        if self.add_to_response {
            ctx.set_header(&self.header_name, &request_id);
        }
        ctx.set(CTX_REQUEST_ID, request_id);

        ctx.next();
    }

    fn name(&self) -> &'static str {
        "RequestId"
    }
}

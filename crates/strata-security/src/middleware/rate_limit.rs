//! Rate limiting stage
//!
//! Admits a request when its token bucket has a whole token and otherwise
//! aborts with 429. Rejection never reaches inner stages or the handler.

use std::sync::Arc;

use serde_json::{json, Map};
use strata_http::{RequestContext, Stage, StatusCode};
use tracing::{debug, warn};

use super::auth::CTX_USER_ID;
use super::rejection;
use crate::bucket::{BucketRegistry, TokenBucket};
use crate::config::{RateLimitConfig, RateLimitIdentifier};

const HEADER_LIMIT: &str = "x-ratelimit-limit";
const HEADER_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_RETRY_AFTER: &str = "retry-after";

#[derive(Debug)]
enum Limiter {
    Global(Arc<TokenBucket>),
    Keyed {
        registry: Arc<BucketRegistry>,
        identifier: RateLimitIdentifier,
    },
}

/// Token-bucket admission control
#[derive(Debug)]
pub struct RateLimitStage {
    limiter: Limiter,
    exempt_paths: Vec<String>,
    include_headers: bool,
}

impl RateLimitStage {
    /// One bucket shared by every request through this stage
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self::from_bucket(Arc::new(TokenBucket::new(rate, capacity)))
    }

    /// Use an existing bucket, e.g. one driven by a manual clock or shared with another chain
    pub fn from_bucket(bucket: Arc<TokenBucket>) -> Self {
        Self {
            limiter: Limiter::Global(bucket),
            exempt_paths: Vec::new(),
            include_headers: true,
        }
    }

    /// One bucket per identifier
    pub fn keyed(registry: Arc<BucketRegistry>, identifier: RateLimitIdentifier) -> Self {
        let limiter = match identifier {
            RateLimitIdentifier::Global => {
                Limiter::Global(Arc::new(TokenBucket::new(registry.rate(), registry.capacity())))
            }
            identifier => Limiter::Keyed {
                registry,
                identifier,
            },
        };
        Self {
            limiter,
            exempt_paths: Vec::new(),
            include_headers: true,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        let registry = Arc::new(
            BucketRegistry::new(config.rate, config.capacity).with_max_entries(config.max_tracked),
        );
        let mut stage = Self::keyed(registry, config.identifier.clone());
        stage.exempt_paths = config.exempt_paths.clone();
        stage
    }

    /// Skip rate limiting for a path; a trailing `*` matches any path with that prefix
    pub fn exempt_path(mut self, path: impl Into<String>) -> Self {
        self.exempt_paths.push(path.into());
        self
    }

    /// Do not emit `X-RateLimit-*` headers on admitted requests
    pub fn without_headers(mut self) -> Self {
        self.include_headers = false;
        self
    }

    fn is_exempt_path(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|exempt| match exempt.strip_suffix('*') {
            Some(prefix) => path.starts_with(prefix),
            None => path == exempt,
        })
    }

    fn extract_identifier(
        identifier: &RateLimitIdentifier,
        ctx: &RequestContext<'_>,
    ) -> Option<String> {
        let request = ctx.request();
        match identifier {
            RateLimitIdentifier::Global => Some("global".to_string()),
            RateLimitIdentifier::IpAddress => request.client_ip(),
            RateLimitIdentifier::UserId => ctx
                .get_str(CTX_USER_ID)
                .or_else(|| request.header("x-user-id"))
                .map(str::to_string),
            RateLimitIdentifier::ApiKey => request.header("x-api-key").map(str::to_string),
            RateLimitIdentifier::CustomHeader(name) => request.header(name).map(str::to_string),
        }
    }

    /// Resolve the bucket for this request, or `None` when the request cannot be identified
    fn bucket_for(&self, ctx: &RequestContext<'_>) -> Option<(Arc<TokenBucket>, String)> {
        match &self.limiter {
            Limiter::Global(bucket) => Some((Arc::clone(bucket), "global".to_string())),
            Limiter::Keyed {
                registry,
                identifier,
            } => Self::extract_identifier(identifier, ctx)
                .map(|key| (registry.bucket(&key), key)),
        }
    }
}

impl Stage for RateLimitStage {
    fn process(&self, ctx: &mut RequestContext<'_>) {
        if self.is_exempt_path(ctx.request().path()) {
            ctx.next();
            return;
        }

        let Some((bucket, identifier)) = self.bucket_for(ctx) else {
            // Unidentifiable requests pass through unthrottled
            warn!(path = ctx.request().path(), "rate limiting: could not identify request");
            ctx.next();
            return;
        };

        let limit = bucket.capacity().floor().to_string();

        if bucket.allow() {
            if self.include_headers {
                let remaining = bucket.tokens().floor().to_string();
                ctx.set_header(HEADER_LIMIT, &limit);
                ctx.set_header(HEADER_REMAINING, &remaining);
            }
            debug!(identifier = %identifier, "rate limit admitted");
            ctx.next();
            return;
        }

        let retry_after = bucket
            .time_until_available()
            .map(|wait| wait.as_secs_f64().ceil().max(1.0) as u64);

        warn!(
            identifier = %identifier,
            path = ctx.request().path(),
            retry_after = ?retry_after,
            "rate limit exceeded"
        );

        let mut extra = Map::new();
        extra.insert("retry_after".to_string(), json!(retry_after));
        let mut response = rejection(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limit_exceeded",
            "rate limited",
            Some(extra),
        )
        .with_header(HEADER_LIMIT, &limit)
        .with_header(HEADER_REMAINING, "0");
        if let Some(seconds) = retry_after {
            response = response.with_header(HEADER_RETRY_AFTER, &seconds.to_string());
        }

        ctx.push_error(format!("rate limited: {}", identifier));
        ctx.abort_with_response(response);
    }

    fn name(&self) -> &'static str {
        "RateLimit"
    }
}

//! Demo application
//!
//! Global stages: Recovery, RequestId, Cors, AccessLog, Timing.
//! `/ping` is open, `/api` needs a bearer token, `/admin` additionally
//! needs the `admin` role and `/limited` sits behind a token bucket.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use strata_http::{
    handler_fn, AccessLogStage, MiddlewareChain, PipelineRouter, RecoveryStage, RequestIdStage,
    Response, RouteGroup, TimingStage,
};
use strata_security::middleware::auth::{CTX_CLAIMS, CTX_USER_ID, CTX_USERNAME};
use strata_security::{
    BearerAuthStage, Claims, CorsStage, RateLimitConfig, RateLimitStage, RoleStage,
    SecurityConfig, StaticTokenVerifier, TokenVerifier,
};

pub const DEMO_ADMIN_TOKEN: &str = "demo-admin-token";
pub const DEMO_USER_TOKEN: &str = "demo-user-token";

/// Tokens accepted by the demo server
pub fn demo_verifier() -> StaticTokenVerifier {
    StaticTokenVerifier::new()
        .with_token(DEMO_ADMIN_TOKEN, Claims::new("1", "admin", "admin"))
        .with_token(
            DEMO_USER_TOKEN,
            Claims::new("1001", "test_user", "user").with_extra("plan", json!("free")),
        )
}

/// Global chain shared by every route, including the 404 fallback
pub fn global_chain(security: &SecurityConfig, health_path: &str) -> MiddlewareChain {
    let mut chain = MiddlewareChain::new()
        .with(RecoveryStage::new())
        .with(RequestIdStage::new());
    if let Some(cors) = &security.cors {
        chain.push(CorsStage::new(cors.clone()));
    }
    chain
        .with(AccessLogStage::new().skip_path(health_path))
        .with(TimingStage::new().with_slow_threshold(Duration::from_secs(1)))
}

/// Build the demo routes
pub fn demo_router(security: &SecurityConfig, health_path: &str) -> PipelineRouter {
    let verifier: Arc<dyn TokenVerifier> = Arc::new(demo_verifier());

    let api = RouteGroup::new("/api")
        .middleware(BearerAuthStage::shared(verifier.clone()))
        .get(
            "/profile",
            handler_fn("profile", |ctx| match ctx.get::<Claims>(CTX_CLAIMS) {
                Some(claims) => Response::ok().json(claims),
                None => Response::ok().json(&json!({ "user_id": ctx.get_str(CTX_USER_ID) })),
            }),
        );

    let admin = RouteGroup::new("/admin")
        .middleware(BearerAuthStage::shared(verifier))
        .middleware(RoleStage::single("admin"))
        .get(
            "/dashboard",
            handler_fn("dashboard", |ctx| {
                Response::ok().json(&json!({
                    "message": "welcome to the admin dashboard",
                    "username": ctx.get_str(CTX_USERNAME),
                }))
            }),
        );

    let rate_limiting = security
        .rate_limiting
        .clone()
        .unwrap_or_else(RateLimitConfig::default);
    let limited = RouteGroup::new("/limited")
        .middleware(RateLimitStage::from_config(&rate_limiting))
        .get(
            "/",
            handler_fn("limited", |_| {
                Response::ok().json(&json!({ "message": "request admitted" }))
            }),
        );

    PipelineRouter::new()
        .global_chain(global_chain(security, health_path))
        .get(
            "/ping",
            handler_fn("ping", |_| Response::ok().json(&json!({ "message": "pong" }))),
        )
        .group(api)
        .group(admin)
        .group(limited)
}

//! End-to-end pipeline scenarios combining logging, admission control and auth.

use std::sync::Arc;

use strata_http::testing::{body_json, EventLog, RecordingStage, TestRequest};
use strata_http::{
    execute, handler_fn, MiddlewareChain, PipelineRouter, RequestContext, Response,
    ResponseBody, RouteGroup, Stage, StatusCode,
};
use strata_security::{
    BearerAuthStage, BucketRegistry, Claims, ManualClock, RateLimitIdentifier, RateLimitStage,
    RoleStage, StaticTokenVerifier, TokenBucket,
};
use tower::ServiceExt;

/// Records enter/exit around a real stage
struct Traced<S> {
    name: &'static str,
    inner: S,
    log: EventLog,
}

impl<S: Stage> Stage for Traced<S> {
    fn process(&self, ctx: &mut RequestContext<'_>) {
        self.log.record(format!("enter:{}", self.name));
        self.inner.process(ctx);
        self.log.record(format!("exit:{}", self.name));
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

fn traced<S: Stage>(name: &'static str, inner: S, log: &EventLog) -> Traced<S> {
    Traced {
        name,
        inner,
        log: log.clone(),
    }
}

fn verifier() -> StaticTokenVerifier {
    StaticTokenVerifier::new()
        .with_token("alice-token", Claims::new("1001", "alice", "admin"))
        .with_token("bob-token", Claims::new("1002", "bob", "viewer"))
}

fn exits(log: &EventLog) -> Vec<String> {
    log.events()
        .into_iter()
        .filter(|event| event.starts_with("exit:"))
        .collect()
}

#[test]
fn rate_limited_second_request_skips_auth_and_handler() {
    let log = EventLog::new();
    let clock = ManualClock::new();
    let bucket = Arc::new(TokenBucket::new(1.0, 1.0).with_clock(Arc::new(clock)));

    let chain = MiddlewareChain::new()
        .with(RecordingStage::new("Logger", &log))
        .with(traced("RateLimit", RateLimitStage::from_bucket(bucket), &log))
        .with(traced("Auth", BearerAuthStage::new(verifier()), &log));
    let handler_log = log.clone();
    let handler = handler_fn("Handler", move |_| {
        handler_log.record("enter:Handler");
        handler_log.record("exit:Handler");
        Response::ok().text("hello")
    });

    let first = execute(
        &chain,
        &handler,
        TestRequest::get("/").bearer("alice-token").build(),
    );

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(
        exits(&log),
        vec!["exit:Handler", "exit:Auth", "exit:RateLimit", "exit:Logger"]
    );

    log.clear();
    let second = execute(
        &chain,
        &handler,
        TestRequest::get("/").bearer("alice-token").build(),
    );

    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    match second.body() {
        ResponseBody::Json(body) => assert_eq!(body["error"]["message"], "rate limited"),
        other => panic!("expected JSON body, got {:?}", other),
    }
    assert_eq!(
        log.events(),
        vec![
            "enter:Logger",
            "enter:RateLimit",
            "exit:RateLimit",
            "exit:Logger"
        ]
    );
    assert!(!log.contains("enter:Auth"));
    assert!(!log.contains("enter:Handler"));
}

#[test]
fn auth_failure_happens_after_admission() {
    let log = EventLog::new();
    let bucket = Arc::new(TokenBucket::new(0.0, 2.0));
    let chain = MiddlewareChain::new()
        .with(RateLimitStage::from_bucket(Arc::clone(&bucket)))
        .with(traced("Auth", BearerAuthStage::new(verifier()), &log));
    let handler = handler_fn("Handler", |_| Response::ok());

    let response = execute(&chain, &handler, TestRequest::get("/").build());

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(bucket.tokens() < 2.0);
}

#[test]
fn user_keyed_limits_follow_authenticated_identity() {
    let registry = Arc::new(BucketRegistry::new(0.0, 1.0));
    let chain = MiddlewareChain::new()
        .with(BearerAuthStage::new(verifier()))
        .with(RateLimitStage::keyed(registry, RateLimitIdentifier::UserId));
    let handler = handler_fn("Handler", |_| Response::ok());
    let as_user = |token: &str| TestRequest::get("/").bearer(token).build();

    assert_eq!(execute(&chain, &handler, as_user("alice-token")).status(), StatusCode::OK);
    assert_eq!(
        execute(&chain, &handler, as_user("alice-token")).status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(execute(&chain, &handler, as_user("bob-token")).status(), StatusCode::OK);
}

fn admin_router(limit_capacity: f64) -> PipelineRouter {
    let admin = RouteGroup::new("/admin")
        .middleware(BearerAuthStage::new(verifier()))
        .middleware(RoleStage::single("admin"))
        .get(
            "/stats",
            handler_fn("stats", |ctx| {
                Response::ok().json(&serde_json::json!({
                    "viewer": ctx.get_str("username").unwrap_or("?")
                }))
            }),
        );
    let limited = RouteGroup::new("/limited")
        .middleware(RateLimitStage::new(0.0, limit_capacity))
        .get("/", handler_fn("limited", |_| Response::ok().text("ok")));

    PipelineRouter::new().group(admin).group(limited)
}

#[tokio::test]
async fn admin_group_enforces_auth_then_role() {
    let app = admin_router(1.0).into_router();

    let anonymous = app
        .clone()
        .oneshot(TestRequest::get("/admin/stats").into_axum())
        .await
        .unwrap();
    let viewer = app
        .clone()
        .oneshot(TestRequest::get("/admin/stats").bearer("bob-token").into_axum())
        .await
        .unwrap();
    let admin = app
        .oneshot(TestRequest::get("/admin/stats").bearer("alice-token").into_axum())
        .await
        .unwrap();

    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(anonymous).await["error"]["code"], "missing_token");
    assert_eq!(viewer.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(viewer).await["error"]["code"], "permission_denied");
    assert_eq!(admin.status(), StatusCode::OK);
    assert_eq!(body_json(admin).await["viewer"], "alice");
}

#[tokio::test]
async fn limited_group_returns_429_with_retry_after_over_http() {
    let app = admin_router(1.0).into_router();

    let first = app
        .clone()
        .oneshot(TestRequest::get("/limited").into_axum())
        .await
        .unwrap();
    let second = app
        .oneshot(TestRequest::get("/limited").into_axum())
        .await
        .unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers().get("x-ratelimit-limit").unwrap(), "1");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    // A zero-rate bucket never refills, so there is no retry hint
    assert!(second.headers().get("retry-after").is_none());
    assert_eq!(
        body_json(second).await["error"]["code"],
        "rate_limit_exceeded"
    );
}

//! Security Attack Simulation Tests
//!
//! Spoofed origins, malformed credentials and limiter evasion attempts
//! against the security stages.

use std::sync::Arc;

use strata_http::testing::{EventLog, RecordingHandler, TestRequest};
use strata_http::{execute, MiddlewareChain, ResponseBody, StatusCode};
use strata_security::{
    BearerAuthStage, BucketRegistry, Claims, CorsStage, RateLimitIdentifier, RateLimitStage,
    StaticTokenVerifier,
};

fn error_code(body: &ResponseBody) -> String {
    match body {
        ResponseBody::Json(value) => value["error"]["code"].as_str().unwrap_or("").to_string(),
        other => panic!("expected JSON body, got {:?}", other),
    }
}

#[test]
fn test_cors_origin_header_spoofing_attack() {
    let chain = MiddlewareChain::new().with(CorsStage::default().allow_origin("https://trusted.com"));
    let handler = RecordingHandler::new(&EventLog::new());

    let spoofed = [
        "null",
        "http://trusted.com",
        "https://malicious.trusted.com",
        "https://trusted.com.evil.com",
        "https://TRUSTED.com",
    ];

    for origin in spoofed {
        let response = execute(
            &chain,
            &handler,
            TestRequest::get("/api/sensitive").header("origin", origin).build(),
        );
        assert!(
            response.header("access-control-allow-origin").is_none(),
            "origin {} should not be allowed",
            origin
        );
    }
}

#[test]
fn test_authorization_header_bypass_attempts() {
    let log = EventLog::new();
    let verifier =
        StaticTokenVerifier::new().with_token("real-token", Claims::new("1", "alice", "admin"));
    let chain = MiddlewareChain::new().with(BearerAuthStage::new(verifier));
    let handler = RecordingHandler::new(&log);

    let attempts = [
        ("bearer real-token", "invalid_token_format"),
        ("BEARER real-token", "invalid_token_format"),
        ("Token real-token", "invalid_token_format"),
        ("Bearer", "invalid_token_format"),
        ("Bearer real-token-but-longer", "invalid_token"),
        ("Bearer REAL-TOKEN", "invalid_token"),
        ("   ", "missing_token"),
    ];

    for (header, expected) in attempts {
        let response = execute(
            &chain,
            &handler,
            TestRequest::get("/api/me").header("authorization", header).build(),
        );
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", header);
        assert_eq!(error_code(response.body()), expected, "{}", header);
    }

    assert!(!log.contains("handler"));
}

#[test]
fn test_rate_limit_key_is_first_forwarded_address() {
    let registry = Arc::new(BucketRegistry::new(0.0, 1.0));
    let chain = MiddlewareChain::new().with(RateLimitStage::keyed(
        Arc::clone(&registry),
        RateLimitIdentifier::IpAddress,
    ));
    let handler = RecordingHandler::new(&EventLog::new());

    let first = execute(
        &chain,
        &handler,
        TestRequest::get("/").client_ip("203.0.113.9").build(),
    );
    // Appending proxies does not mint a new identity
    let second = execute(
        &chain,
        &handler,
        TestRequest::get("/")
            .client_ip("203.0.113.9, 10.0.0.1, 10.0.0.2")
            .build(),
    );

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_identifier_flood_keeps_registry_bounded() {
    let registry = Arc::new(BucketRegistry::new(0.0, 1.0).with_max_entries(32));
    let chain = MiddlewareChain::new().with(RateLimitStage::keyed(
        Arc::clone(&registry),
        RateLimitIdentifier::ApiKey,
    ));
    let handler = RecordingHandler::new(&EventLog::new());

    for i in 0..500 {
        execute(
            &chain,
            &handler,
            TestRequest::get("/").header("x-api-key", &format!("key-{}", i)).build(),
        );
    }

    assert!(registry.len() <= 32);
}

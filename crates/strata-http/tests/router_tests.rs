//! axum bridge: route groups, path params, body limits, fallback and health.

use std::collections::HashMap;

use serde::Deserialize;
use strata_http::testing::{body_bytes, body_json, TestRequest};
use strata_http::{
    handler_fn, stage_fn, HttpConfig, HttpError, PipelineRouter, RequestIdStage, Response,
    RouteGroup, Server, StatusCode,
};
use tower::ServiceExt;

fn api_router() -> PipelineRouter {
    let users = RouteGroup::new("/users")
        .get(
            "/:id",
            handler_fn("show_user", |ctx| {
                let id = ctx.request().path_param("id").unwrap_or("?").to_string();
                Response::ok().json(&serde_json::json!({ "id": id }))
            }),
        )
        .post(
            "/",
            handler_fn("create_user", |ctx| {
                #[derive(Deserialize)]
                struct NewUser {
                    name: String,
                }
                match ctx.request().json::<NewUser>() {
                    Ok(user) => Response::with_status(StatusCode::CREATED).text(user.name),
                    Err(e) => e.to_response(),
                }
            }),
        );

    let api = RouteGroup::new("/api")
        .middleware(stage_fn("api_marker", |ctx| {
            ctx.set_header("x-api", "1");
            ctx.next();
        }))
        .group(users);

    PipelineRouter::new()
        .middleware(RequestIdStage::new().counter())
        .get("/ping", handler_fn("ping", |_| Response::ok().text("pong")))
        .group(api)
}

#[tokio::test]
async fn serves_root_route_through_global_chain() {
    let app = api_router().into_router();

    let response = app
        .oneshot(TestRequest::get("/ping").into_axum())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(!response.headers().contains_key("x-api"));
    assert_eq!(&body_bytes(response).await[..], b"pong");
}

#[tokio::test]
async fn nested_group_gets_path_params_and_parent_stages() {
    let app = api_router().into_router();

    let response = app
        .oneshot(TestRequest::get("/api/users/42").into_axum())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-api").unwrap(), "1");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_json(response).await["id"], "42");
}

#[tokio::test]
async fn json_body_reaches_handler() {
    let app = api_router().into_router();

    let response = app
        .oneshot(
            TestRequest::post("/api/users")
                .json(&serde_json::json!({ "name": "ada" }))
                .into_axum(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(&body_bytes(response).await[..], b"ada");
}

#[tokio::test]
async fn oversized_body_is_rejected_with_413() {
    let app = api_router().max_request_size(8).into_router();

    let response = app
        .oneshot(
            TestRequest::post("/api/users")
                .json(&serde_json::json!({ "name": "a name longer than eight bytes" }))
                .into_axum(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["error"]["code"], "REQUEST_TOO_LARGE");
}

#[tokio::test]
async fn unmatched_path_runs_global_chain_and_returns_404() {
    let app = api_router().into_router();

    let response = app
        .oneshot(TestRequest::get("/nowhere").into_axum())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        body_json(response).await["error"]["code"],
        "RESOURCE_NOT_FOUND"
    );
}

#[tokio::test]
async fn stage_errors_render_uniform_json() {
    let app = PipelineRouter::new()
        .middleware(stage_fn("deny", |ctx| {
            ctx.abort_with_error(HttpError::forbidden("tenant suspended"))
        }))
        .get("/", handler_fn("never", |_| Response::ok()))
        .into_router();

    let response = app.oneshot(TestRequest::get("/").into_axum()).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "ACCESS_FORBIDDEN");
    assert_eq!(body["error"]["message"], "Access forbidden: tenant suspended");
}

#[tokio::test]
async fn server_mounts_health_endpoint() {
    let server = Server::new(HttpConfig {
        enable_tracing: false,
        ..HttpConfig::default()
    });
    let app = server.build_router(api_router());

    let response = app
        .oneshot(TestRequest::get("/health").into_axum())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["framework"], "strata");
}

#[tokio::test]
async fn shutdown_token_cancels_request_context() {
    let server = Server::new(HttpConfig::default());
    let token = server.shutdown_token();
    let router = PipelineRouter::new().get(
        "/work",
        handler_fn("work", |ctx| {
            if ctx.is_cancelled() {
                Response::with_status(StatusCode::SERVICE_UNAVAILABLE)
            } else {
                Response::ok()
            }
        }),
    );
    let app = server.build_router(router);
    token.cancel();

    let response = app
        .oneshot(TestRequest::get("/work").into_axum())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn describe_lists_effective_chains() {
    let routes: HashMap<String, Vec<&'static str>> = api_router()
        .describe()
        .into_iter()
        .map(|(method, path, stages)| (format!("{} {}", method, path), stages))
        .collect();

    assert_eq!(routes["GET /ping"], vec!["RequestId"]);
    assert_eq!(routes["GET /api/users/:id"], vec!["RequestId", "api_marker"]);
    assert_eq!(routes["POST /api/users"], vec!["RequestId", "api_marker"]);
}

#[tokio::test]
async fn wrong_method_runs_global_chain_and_returns_405() {
    let app = api_router().into_router();

    let response = app
        .oneshot(TestRequest::post("/ping").into_axum())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers().get("allow").unwrap(), "GET");
    assert_eq!(
        body_json(response).await["error"]["code"],
        "METHOD_NOT_ALLOWED"
    );
}

#[tokio::test]
async fn global_stage_can_answer_options_on_get_route() {
    let app = PipelineRouter::new()
        .middleware(stage_fn("preflight", |ctx| {
            if ctx.request().method == strata_http::Method::OPTIONS {
                ctx.abort_with_status(StatusCode::NO_CONTENT);
                return;
            }
            ctx.next();
        }))
        .get("/items", handler_fn("items", |_| Response::ok()))
        .into_router();

    let response = app
        .oneshot(TestRequest::options("/items").into_axum())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

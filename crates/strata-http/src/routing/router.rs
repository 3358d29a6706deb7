//! # Pipeline Router
//!
//! Turns route groups into an `axum::Router`. Path matching is axum's; every
//! matched request is converted into a [`Request`], run through its group's
//! chain by the [`Executor`] on the request task, and the resulting
//! [`Response`] is serialized back.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Path},
    http::{header::CONTENT_LENGTH, Method},
    response::IntoResponse,
    routing::{MethodFilter, MethodRouter},
    Router,
};
use tokio_util::sync::CancellationToken;

use super::group::{ResolvedRoute, RouteGroup};
use crate::config::HttpConfig;
use crate::errors::HttpError;
use crate::pipeline::{handler_fn, ExecutionOptions, Executor, MiddlewareChain, Stage};
use crate::request::Request;
use crate::response::Response;

/// Settings shared by every route of one router
#[derive(Debug, Clone)]
struct BridgeSettings {
    executor: Executor,
    max_request_size: usize,
    request_timeout: Option<Duration>,
    shutdown: CancellationToken,
}

/// One axum endpoint: the effective chain and terminal handler of a route
struct Endpoint {
    chain: MiddlewareChain,
    handler: Arc<dyn Stage>,
    settings: Arc<BridgeSettings>,
}

impl Endpoint {
    async fn dispatch(
        &self,
        path_params: HashMap<String, String>,
        request: axum::extract::Request,
    ) -> axum::response::Response {
        let limit = self.settings.max_request_size;
        let (parts, body) = request.into_parts();

        let declared_length = parts
            .headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        if declared_length.is_some_and(|len| len > limit) {
            return HttpError::payload_too_large(limit).to_response().into_response();
        }

        let body = match axum::body::to_bytes(body, limit).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, limit, "failed to read request body");
                return HttpError::payload_too_large(limit).to_response().into_response();
            }
        };

        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let mut request = Request::new(parts.method, parts.uri, parts.headers)
            .with_path_params(path_params)
            .with_body(body);
        if let Some(addr) = remote_addr {
            request = request.with_remote_addr(addr);
        }

        let mut options =
            ExecutionOptions::new().with_cancellation(self.settings.shutdown.child_token());
        if let Some(timeout) = self.settings.request_timeout {
            options = options.with_deadline(Instant::now() + timeout);
        }

        self.settings
            .executor
            .execute_with(&self.chain, self.handler.as_ref(), request, options)
            .into_response()
    }

    fn into_method_router(self, filter: MethodFilter, existing: Option<MethodRouter>) -> MethodRouter {
        let endpoint = Arc::new(self);
        let handler = move |params: Option<Path<HashMap<String, String>>>,
                            request: axum::extract::Request| {
            let endpoint = Arc::clone(&endpoint);
            async move {
                let params = params.map(|Path(p)| p).unwrap_or_default();
                endpoint.dispatch(params, request).await
            }
        };

        match existing {
            Some(router) => router.on(filter, handler),
            None => axum::routing::on(filter, handler),
        }
    }
}

/// Collects route groups and produces an `axum::Router`
pub struct PipelineRouter {
    global: MiddlewareChain,
    root: RouteGroup,
    groups: Vec<RouteGroup>,
    settings: BridgeSettings,
}

impl Default for PipelineRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRouter {
    pub fn new() -> Self {
        let defaults = HttpConfig::default();
        Self {
            global: MiddlewareChain::new(),
            root: RouteGroup::new(""),
            groups: Vec::new(),
            settings: BridgeSettings {
                executor: Executor::default(),
                max_request_size: defaults.max_request_size,
                request_timeout: Some(defaults.request_timeout()),
                shutdown: CancellationToken::new(),
            },
        }
    }

    /// Body limit and request deadline taken from `config`
    pub fn from_config(config: &HttpConfig) -> Self {
        Self::new()
            .max_request_size(config.max_request_size)
            .request_timeout(config.request_timeout())
    }

    /// Stage run before every group's own stages, including for unmatched paths
    pub fn middleware<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.global.push(stage);
        self
    }

    pub fn global_chain(mut self, chain: MiddlewareChain) -> Self {
        self.global = chain;
        self
    }

    pub fn group(mut self, group: RouteGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn get<H: Stage + 'static>(mut self, path: &str, handler: H) -> Self {
        self.root = self.root.get(path, handler);
        self
    }

    pub fn post<H: Stage + 'static>(mut self, path: &str, handler: H) -> Self {
        self.root = self.root.post(path, handler);
        self
    }

    pub fn route<H: Stage + 'static>(mut self, method: Method, path: &str, handler: H) -> Self {
        self.root = self.root.route(method, path, handler);
        self
    }

    pub fn executor(mut self, executor: Executor) -> Self {
        self.settings.executor = executor;
        self
    }

    pub fn max_request_size(mut self, bytes: usize) -> Self {
        self.settings.max_request_size = bytes;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.settings.request_timeout = Some(timeout);
        self
    }

    pub fn without_request_timeout(mut self) -> Self {
        self.settings.request_timeout = None;
        self
    }

    /// Parent of every per-request cancellation token
    pub fn shutdown_token(mut self, token: CancellationToken) -> Self {
        self.settings.shutdown = token;
        self
    }

    /// All routes with full paths and effective chains
    pub(crate) fn resolved_routes(&self) -> Vec<ResolvedRoute> {
        let mut routes = self.root.resolve("", &self.global);
        for group in &self.groups {
            routes.extend(group.resolve("", &self.global));
        }
        routes
    }

    /// `(method, path, stage names)` for every route
    pub fn describe(&self) -> Vec<(Method, String, Vec<&'static str>)> {
        self.resolved_routes()
            .into_iter()
            .map(|r| (r.method, r.path, r.chain.names()))
            .collect()
    }

    pub fn into_router(self) -> Router {
        let settings = Arc::new(self.settings.clone());
        let mut by_path: BTreeMap<String, (MethodRouter, Vec<Method>)> = BTreeMap::new();

        for route in self.resolved_routes() {
            let filter = match MethodFilter::try_from(route.method.clone()) {
                Ok(filter) => filter,
                Err(_) => {
                    tracing::warn!(method = %route.method, path = %route.path, "unsupported method, route skipped");
                    continue;
                }
            };

            tracing::debug!(
                method = %route.method,
                path = %route.path,
                stages = ?route.chain.names(),
                "registering route"
            );

            let endpoint = Endpoint {
                chain: route.chain,
                handler: route.handler,
                settings: Arc::clone(&settings),
            };
            let (existing, mut methods) = match by_path.remove(&route.path) {
                Some((router, methods)) => (Some(router), methods),
                None => (None, Vec::new()),
            };
            methods.push(route.method.clone());
            let method_router = endpoint.into_method_router(filter, existing);
            by_path.insert(route.path, (method_router, methods));
        }

        let mut router = Router::new();
        for (path, (method_router, methods)) in by_path {
            // Wrong method on a known path still runs the global chain, so CORS preflights work
            let not_allowed = Arc::new(Endpoint {
                chain: self.global.clone(),
                handler: method_not_allowed(&methods),
                settings: Arc::clone(&settings),
            });
            let method_router = method_router.fallback(move |request: axum::extract::Request| {
                let endpoint = Arc::clone(&not_allowed);
                async move { endpoint.dispatch(HashMap::new(), request).await }
            });
            router = router.route(&path, method_router);
        }

        let not_found = Endpoint {
            chain: self.global,
            handler: Arc::new(handler_fn("not_found", |ctx| {
                HttpError::not_found(ctx.request().path()).to_response()
            })),
            settings,
        };
        let not_found = Arc::new(not_found);
        router.fallback(move |request: axum::extract::Request| {
            let endpoint = Arc::clone(&not_found);
            async move { endpoint.dispatch(HashMap::new(), request).await }
        })
    }
}

/// 405 terminal listing the methods a path does accept
fn method_not_allowed(methods: &[Method]) -> Arc<dyn Stage> {
    let allow = methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Arc::new(handler_fn("method_not_allowed", move |ctx| {
        HttpError::method_not_allowed(ctx.request().method.as_str())
            .to_response()
            .with_header("allow", &allow)
    }))
}

/// Shorthand for a handler that ignores the context
pub fn respond_with(name: &'static str, response: Response) -> impl Stage {
    handler_fn(name, move |_| response.clone())
}

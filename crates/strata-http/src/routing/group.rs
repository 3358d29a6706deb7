//! Route groups: a path prefix plus the chain every route inside it runs.
//!
//! Nested groups inherit their parent's chain; the parent's stages run first.

use std::sync::Arc;

use axum::http::Method;

use crate::pipeline::{MiddlewareChain, Stage};

/// A route registered in a group, before prefixes and chains are resolved
#[derive(Clone)]
pub(crate) struct RouteDef {
    pub method: Method,
    pub path: String,
    pub handler: Arc<dyn Stage>,
}

/// A route with its full path and effective chain
#[derive(Clone)]
pub(crate) struct ResolvedRoute {
    pub method: Method,
    pub path: String,
    pub chain: MiddlewareChain,
    pub handler: Arc<dyn Stage>,
}

/// Prefix + chain + routes, optionally nested
#[derive(Clone)]
pub struct RouteGroup {
    prefix: String,
    chain: MiddlewareChain,
    routes: Vec<RouteDef>,
    groups: Vec<RouteGroup>,
}

impl RouteGroup {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            chain: MiddlewareChain::new(),
            routes: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Append a stage to this group's chain
    pub fn middleware<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.chain.push(stage);
        self
    }

    /// Append a prebuilt chain to this group's chain
    pub fn chain(mut self, chain: &MiddlewareChain) -> Self {
        self.chain = self.chain.extend(chain);
        self
    }

    pub fn get<H: Stage + 'static>(self, path: &str, handler: H) -> Self {
        self.route(Method::GET, path, handler)
    }

    pub fn post<H: Stage + 'static>(self, path: &str, handler: H) -> Self {
        self.route(Method::POST, path, handler)
    }

    pub fn put<H: Stage + 'static>(self, path: &str, handler: H) -> Self {
        self.route(Method::PUT, path, handler)
    }

    pub fn patch<H: Stage + 'static>(self, path: &str, handler: H) -> Self {
        self.route(Method::PATCH, path, handler)
    }

    pub fn delete<H: Stage + 'static>(self, path: &str, handler: H) -> Self {
        self.route(Method::DELETE, path, handler)
    }

    /// Register `handler` for `method` at `path` (axum syntax, e.g. `/users/:id`)
    pub fn route<H: Stage + 'static>(mut self, method: Method, path: &str, handler: H) -> Self {
        self.routes.push(RouteDef {
            method,
            path: path.to_string(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Nest a group under this one
    pub fn group(mut self, group: RouteGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// This group's own stages, excluding inherited ones
    pub fn own_chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    /// Flatten into routes with full paths and effective chains
    pub(crate) fn resolve(&self, parent_prefix: &str, parent_chain: &MiddlewareChain) -> Vec<ResolvedRoute> {
        let prefix = join_paths(parent_prefix, &self.prefix);
        let chain = parent_chain.extend(&self.chain);

        let mut resolved: Vec<ResolvedRoute> = self
            .routes
            .iter()
            .map(|route| ResolvedRoute {
                method: route.method.clone(),
                path: join_paths(&prefix, &route.path),
                chain: chain.clone(),
                handler: Arc::clone(&route.handler),
            })
            .collect();

        for group in &self.groups {
            resolved.extend(group.resolve(&prefix, &chain));
        }
        resolved
    }
}

/// Join two path segments with exactly one slash between them
pub(crate) fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    match (base.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", path),
        (false, true) => ensure_leading_slash(base),
        (false, false) => format!("{}/{}", ensure_leading_slash(base), path),
    }
}

fn ensure_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

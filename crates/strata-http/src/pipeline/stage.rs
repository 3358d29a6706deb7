//! # Stage
//!
//! A stage is one layer of the onion. It receives the per-request context,
//! may inspect or mutate it, and decides whether to call [`RequestContext::next`]
//! (continue inward) or [`RequestContext::abort`] (short-circuit). Code after
//! `next()` runs on the way back out.
//!
//! Terminal handlers are stages too: they sit after the last middleware and
//! normally write the response.

use std::fmt;

use super::context::RequestContext;
use crate::response::Response;

/// A single processing step in a [`MiddlewareChain`](super::MiddlewareChain)
pub trait Stage: Send + Sync {
    /// Process the request, calling `ctx.next()` to continue inward
    fn process(&self, ctx: &mut RequestContext<'_>);

    /// Stage name for logs and chain introspection
    fn name(&self) -> &'static str {
        "Stage"
    }
}

/// Stage backed by a closure, see [`stage_fn`]
pub struct FnStage<F> {
    name: &'static str,
    f: F,
}

impl<F> fmt::Debug for FnStage<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

impl<F> Stage for FnStage<F>
where
    F: Fn(&mut RequestContext<'_>) + Send + Sync,
{
    fn process(&self, ctx: &mut RequestContext<'_>) {
        (self.f)(ctx)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Build a stage from a closure.
///
/// ```ignore
/// let auth = stage_fn("auth", |ctx| {
///     if ctx.request().header("authorization").is_none() {
///         ctx.abort(StatusCode::UNAUTHORIZED, "unauthorized");
///         return;
///     }
///     ctx.next();
/// });
/// ```
pub fn stage_fn<F>(name: &'static str, f: F) -> FnStage<F>
where
    F: Fn(&mut RequestContext<'_>) + Send + Sync,
{
    FnStage { name, f }
}

/// Terminal handler backed by a closure returning a [`Response`], see [`handler_fn`]
pub struct FnHandler<F> {
    name: &'static str,
    f: F,
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("name", &self.name).finish()
    }
}

impl<F> Stage for FnHandler<F>
where
    F: Fn(&RequestContext<'_>) -> Response + Send + Sync,
{
    fn process(&self, ctx: &mut RequestContext<'_>) {
        let response = (self.f)(ctx);
        ctx.respond(response);
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Build a terminal handler whose returned response is written to the context
pub fn handler_fn<F>(name: &'static str, f: F) -> FnHandler<F>
where
    F: Fn(&RequestContext<'_>) -> Response + Send + Sync,
{
    FnHandler { name, f }
}

//! CORS (Cross-Origin Resource Sharing) stage
//!
//! Adds `Access-Control-*` headers for allowed origins and answers every
//! `OPTIONS` request with `204 No Content` without reaching the handler.

use strata_http::{Method, RequestContext, Stage, StatusCode};
use tracing::debug;

pub use crate::config::CorsConfig;

#[derive(Debug, Clone)]
pub struct CorsStage {
    config: CorsConfig,
}

impl Default for CorsStage {
    fn default() -> Self {
        Self::new(CorsConfig::default())
    }
}

impl CorsStage {
    pub fn new(config: CorsConfig) -> Self {
        Self { config }
    }

    /// Any origin, no credentials
    pub fn permissive() -> Self {
        Self::new(CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: false,
            ..CorsConfig::default()
        })
    }

    /// Builder method to add an allowed origin; replaces the wildcard default
    pub fn allow_origin(mut self, origin: &str) -> Self {
        self.config.allowed_origins.retain(|o| o != "*");
        self.config.allowed_origins.push(origin.to_string());
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.config.allow_credentials = allow;
        self
    }

    pub fn max_age(mut self, seconds: u32) -> Self {
        self.config.max_age = Some(seconds);
        self
    }

    pub fn config(&self) -> &CorsConfig {
        &self.config
    }

    fn is_origin_allowed(&self, origin: &str) -> bool {
        self.config
            .allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }

    fn apply_headers(&self, ctx: &mut RequestContext<'_>, origin: &str) {
        // Credentialed responses must echo the concrete origin
        let allow_origin = if self.config.allows_any_origin() && !self.config.allow_credentials {
            "*"
        } else {
            origin
        };

        ctx.set_header("access-control-allow-origin", allow_origin);
        if allow_origin != "*" {
            ctx.set_header("vary", "Origin");
        }
        ctx.set_header(
            "access-control-allow-methods",
            &self.config.allowed_methods.join(", "),
        );
        ctx.set_header(
            "access-control-allow-headers",
            &self.config.allowed_headers.join(", "),
        );
        if !self.config.exposed_headers.is_empty() {
            ctx.set_header(
                "access-control-expose-headers",
                &self.config.exposed_headers.join(", "),
            );
        }
        if self.config.allow_credentials {
            ctx.set_header("access-control-allow-credentials", "true");
        }
        if let Some(max_age) = self.config.max_age {
            ctx.set_header("access-control-max-age", &max_age.to_string());
        }
    }
}

impl Stage for CorsStage {
    fn process(&self, ctx: &mut RequestContext<'_>) {
        if let Some(origin) = ctx.request().header("origin").map(str::to_string) {
            if self.is_origin_allowed(&origin) {
                self.apply_headers(ctx, &origin);
            } else {
                debug!(origin = %origin, "CORS origin not allowed");
            }
        }

        if ctx.request().method == Method::OPTIONS {
            ctx.abort_with_status(StatusCode::NO_CONTENT);
            return;
        }

        ctx.next();
    }

    fn name(&self) -> &'static str {
        "Cors"
    }
}

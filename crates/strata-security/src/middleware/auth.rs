//! Bearer token authentication
//!
//! Token verification is delegated to a [`TokenVerifier`]; the stage only
//! parses the `Authorization` header and publishes the verified claims to
//! the context under `user_id`, `username`, `role` and `claims`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_http::{RequestContext, Response, Stage, StatusCode};
use tracing::debug;

use super::rejection;
use crate::{SecurityError, SecurityResult};

pub const CTX_USER_ID: &str = "user_id";
pub const CTX_USERNAME: &str = "username";
pub const CTX_ROLE: &str = "role";
pub const CTX_CLAIMS: &str = "claims";

/// Identity attached to a verified token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    pub role: String,
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            role: role.into(),
            extra: HashMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Turns a bearer token into claims, or explains why it cannot
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> SecurityResult<Claims>;
}

/// Fixed token table, for development and tests
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Claims>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, claims: Claims) -> Self {
        self.insert(token, claims);
        self
    }

    pub fn insert(&mut self, token: impl Into<String>, claims: Claims) {
        self.tokens.insert(token.into(), claims);
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> SecurityResult<Claims> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| SecurityError::invalid_token("unknown token"))
    }
}

/// Requires `Authorization: Bearer <token>` and a token the verifier accepts
#[derive(Clone)]
pub struct BearerAuthStage {
    verifier: Arc<dyn TokenVerifier>,
}

impl std::fmt::Debug for BearerAuthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuthStage").finish_non_exhaustive()
    }
}

impl BearerAuthStage {
    pub fn new<V: TokenVerifier + 'static>(verifier: V) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    pub fn shared(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    fn unauthorized(code: &str, message: &str) -> Response {
        rejection(StatusCode::UNAUTHORIZED, code, message, None)
            .with_header("www-authenticate", "Bearer")
    }
}

impl Stage for BearerAuthStage {
    fn process(&self, ctx: &mut RequestContext<'_>) {
        let header = match ctx.request().authorization() {
            Some(header) if !header.trim().is_empty() => header.to_string(),
            _ => {
                ctx.push_error("missing bearer token");
                ctx.abort_with_response(Self::unauthorized(
                    "missing_token",
                    "Authorization header is required",
                ));
                return;
            }
        };

        let token = match header.split_once(' ') {
            Some(("Bearer", token)) if !token.trim().is_empty() => token.trim(),
            _ => {
                ctx.push_error("malformed authorization header");
                ctx.abort_with_response(Self::unauthorized(
                    "invalid_token_format",
                    "Authorization header must be: Bearer <token>",
                ));
                return;
            }
        };

        let claims = match self.verifier.verify(token) {
            Ok(claims) => claims,
            Err(err) => {
                debug!(error = %err, "bearer token rejected");
                ctx.push_error(err.to_string());
                ctx.abort_with_response(Self::unauthorized(
                    "invalid_token",
                    "Token is invalid or expired",
                ));
                return;
            }
        };

        ctx.set(CTX_USER_ID, claims.user_id.clone());
        ctx.set(CTX_USERNAME, claims.username.clone());
        ctx.set(CTX_ROLE, claims.role.clone());
        ctx.set(CTX_CLAIMS, claims);
        ctx.next();
    }

    fn name(&self) -> &'static str {
        "BearerAuth"
    }
}

//! Role-based access control
//!
//! Runs after [`BearerAuthStage`](super::auth::BearerAuthStage) and checks the
//! `role` it published against an allow-list.

use strata_http::{RequestContext, Stage, StatusCode};
use tracing::debug;

use super::auth::CTX_ROLE;
use super::rejection;

#[derive(Debug, Clone)]
pub struct RoleStage {
    allowed: Vec<String>,
}

impl RoleStage {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn single(role: impl Into<String>) -> Self {
        Self::new([role])
    }

    pub fn allowed_roles(&self) -> &[String] {
        &self.allowed
    }
}

impl Stage for RoleStage {
    fn process(&self, ctx: &mut RequestContext<'_>) {
        let role = match ctx.get_str(CTX_ROLE) {
            Some(role) => role.to_string(),
            None => {
                ctx.push_error("role check without authenticated user");
                ctx.abort_with_response(rejection(
                    StatusCode::UNAUTHORIZED,
                    "unauthenticated",
                    "Authentication required",
                    None,
                ));
                return;
            }
        };

        if !self.allowed.iter().any(|allowed| *allowed == role) {
            debug!(role = %role, allowed = ?self.allowed, "role not permitted");
            ctx.push_error(format!("role '{}' not permitted", role));
            ctx.abort_with_response(rejection(
                StatusCode::FORBIDDEN,
                "permission_denied",
                "Permission denied",
                None,
            ));
            return;
        }

        ctx.next();
    }

    fn name(&self) -> &'static str {
        "Role"
    }
}

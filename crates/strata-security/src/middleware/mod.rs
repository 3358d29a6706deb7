//! Security stages
//!
//! Each stage either calls `next()` or rejects with a JSON body in the
//! same `{"error": {"code", "message"}}` shape strata-http uses for its
//! own errors.

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod role;

use serde_json::{json, Map, Value};
use strata_http::{Response, StatusCode};

/// Error response with a stage-specific code and optional extra fields
pub(crate) fn rejection(
    status: StatusCode,
    code: &str,
    message: &str,
    extra: Option<Map<String, Value>>,
) -> Response {
    let mut error = Map::new();
    error.insert("code".to_string(), json!(code));
    error.insert("message".to_string(), json!(message));
    if let Some(extra) = extra {
        error.extend(extra);
    }

    Response::with_status(status).json_value(json!({ "error": error }))
}

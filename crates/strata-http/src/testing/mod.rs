//! Test helpers shared by the strata crates
//!
//! [`RecordingStage`] and [`EventLog`] capture the enter/exit order of a
//! traversal; [`TestRequest`] builds requests for the executor or for axum.

pub mod recording;
pub mod request;

pub use recording::{EventLog, RecordingHandler, RecordingStage};
pub use request::TestRequest;

use axum::body::Bytes;

/// Collect an axum response body
pub async fn body_bytes(response: axum::response::Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default()
}

/// Collect an axum response body as JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

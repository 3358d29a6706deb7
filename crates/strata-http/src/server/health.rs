//! Health check endpoint implementation

use axum::Json;
use serde::Serialize;

/// Health check response structure
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub framework: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy",
            framework: strata_core::FRAMEWORK_NAME,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Default health check handler; bypasses the pipeline
pub async fn health_check_handler() -> Json<HealthStatus> {
    Json(HealthStatus::default())
}

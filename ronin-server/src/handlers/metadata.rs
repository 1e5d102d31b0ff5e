use axum::response::{IntoResponse, Json};
use ronin_core::SUPPORTED_RESOURCE_TYPES;
use serde_json::json;

/// Health check (GET /health)
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "resourceTypes": SUPPORTED_RESOURCE_TYPES,
    }))
}

//! ronin-server - clinical data normalization service
//!
//! Hosts the normalization engine over HTTP: tenant resources are posted to
//! `$normalize` and come back in canonical Ronin form with an OperationOutcome.

pub mod audit;
pub mod config;
pub mod handlers;
pub mod http_source;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use ronin_core::ResourceNormalizer;
use ronin_store::IssueLog;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Application state
pub struct AppState {
    pub normalizer: ResourceNormalizer,
    pub issue_log: Arc<Mutex<IssueLog>>,
    pub config: config::ServerConfig,
}

/// Build the application router with all routes and middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::metadata::health_check))
        // Registry
        .route("/$registry", get(handlers::registry::status))
        .route("/{tenant}/$reload", post(handlers::registry::reload))
        // Issue log
        .route("/{tenant}/$issues", get(handlers::registry::issues))
        // Normalization
        .route(
            "/{tenant}/{resource_type}/$normalize",
            post(handlers::normalize::normalize),
        )
        // Middleware
        .layer(RequestBodyLimitLayer::new(16 * 1024 * 1024)) // 16MB
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use ronin_core::{operation_outcome::IssueType, RegistryStatus};
use ronin_store::IssueLogEntry;
use serde::Deserialize;
use std::sync::Arc;

use super::{error_response, parse_tenant, ErrorResponse};
use crate::AppState;

const DEFAULT_ISSUE_LIMIT: usize = 50;
const MAX_ISSUE_LIMIT: usize = 500;

/// Registry status summary (GET /$registry)
pub async fn status(State(state): State<Arc<AppState>>) -> Json<RegistryStatus> {
    Json(state.normalizer.registry().cache().status())
}

/// Force a registry reload for a tenant (POST /{tenant}/$reload)
pub async fn reload(
    State(state): State<Arc<AppState>>,
    Path(tenant): Path<String>,
) -> Result<Json<RegistryStatus>, ErrorResponse> {
    let tenant = parse_tenant(&tenant)?;

    let worker_state = Arc::clone(&state);
    tokio::task::spawn_blocking(move || {
        let cache = worker_state.normalizer.registry().cache();
        cache.reload(Some(tenant.mnemonic()));
        cache.status()
    })
    .await
    .map(Json)
    .map_err(|e| {
        tracing::error!(error = %e, "Registry reload task failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, IssueType::Exception, e.to_string())
    })
}

#[derive(Debug, Deserialize)]
pub struct IssuesParams {
    pub limit: Option<usize>,
}

/// Recent issue log rows for a tenant (GET /{tenant}/$issues?limit=N)
pub async fn issues(
    State(state): State<Arc<AppState>>,
    Path(tenant): Path<String>,
    Query(params): Query<IssuesParams>,
) -> Result<Json<Vec<IssueLogEntry>>, ErrorResponse> {
    let tenant = parse_tenant(&tenant)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_ISSUE_LIMIT)
        .min(MAX_ISSUE_LIMIT);

    let log = state.issue_log.lock().await;
    log.recent_for_tenant(tenant.mnemonic(), limit)
        .map(Json)
        .map_err(|e| {
            tracing::error!(tenant = %tenant, error = %e, "Failed to read issue log");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, IssueType::Exception, e.to_string())
        })
}

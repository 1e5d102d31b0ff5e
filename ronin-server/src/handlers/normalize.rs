use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use http_body_util::BodyExt;
use ronin_core::{operation_outcome::IssueType, OperationOutcome, RoninError, Validation};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{error_response, parse_tenant, ErrorResponse};
use crate::audit::{record_outcome, NormalizationRecord};
use crate::AppState;

/// $normalize operation (POST /{tenant}/{resource_type}/$normalize)
///
/// 200 with the canonical resource when accepted, 422 with a null resource
/// when rejected. Both carry an OperationOutcome listing every issue.
pub async fn normalize(
    State(state): State<Arc<AppState>>,
    Path((tenant, resource_type)): Path<(String, String)>,
    request: Request,
) -> Result<Response, ErrorResponse> {
    let tenant = parse_tenant(&tenant)?;

    let bytes = request
        .into_body()
        .collect()
        .await
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, IssueType::Invalid, e.to_string()))?
        .to_bytes();

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, IssueType::Invalid, e.to_string()))?;

    // If wrapped in Parameters, extract the resource parameter
    let resource = if value.get("resourceType").and_then(|v| v.as_str()) == Some("Parameters") {
        extract_resource_from_parameters(&value).unwrap_or(value)
    } else {
        value
    };

    // Check resourceType matches the URL
    let body_type = resource
        .get("resourceType")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if !body_type.is_empty() && body_type != resource_type {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            IssueType::Invalid,
            format!(
                "Resource type in body ({}) does not match URL ({})",
                body_type, resource_type
            ),
        ));
    }
    let source_id = resource.get("id").and_then(|v| v.as_str()).map(str::to_string);

    // Registry reloads fetch documents synchronously
    let worker_state = Arc::clone(&state);
    let worker_tenant = tenant.clone();
    let result = tokio::task::spawn_blocking(move || {
        worker_state.normalizer.normalize(resource, &worker_tenant)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Normalization task failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, IssueType::Exception, e.to_string())
    })?;

    let normalized = match result {
        Ok(normalized) => normalized,
        Err(e) => return Err(engine_error(e)),
    };

    let outcome = OperationOutcome::from_validation(&normalized.validation);
    let accepted = normalized.is_accepted();
    let resource_id = normalized
        .resource
        .as_ref()
        .and_then(|r| r.get("id"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or(source_id);

    record_outcome(
        NormalizationRecord {
            tenant: tenant.mnemonic().to_string(),
            resource_type: normalized.resource_type.clone(),
            resource_id,
            accepted,
            validation: normalized.validation,
        },
        &state.issue_log,
    )
    .await;

    let status = if accepted {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    let body = json!({
        "resource": normalized.resource,
        "outcome": outcome,
    });
    Ok((status, Json(body)).into_response())
}

fn engine_error(error: RoninError) -> ErrorResponse {
    match error {
        RoninError::UnsupportedResourceType(_) => {
            error_response(StatusCode::BAD_REQUEST, IssueType::NotSupported, error.to_string())
        }
        RoninError::MissingResourceType | RoninError::InvalidJson(_) => {
            error_response(StatusCode::BAD_REQUEST, IssueType::Structure, error.to_string())
        }
        RoninError::Validation(failure) => {
            let outcome = OperationOutcome::from_validation(&Validation::from(failure));
            (StatusCode::UNPROCESSABLE_ENTITY, Json(json!(outcome)))
        }
    }
}

/// Extract a resource from a FHIR Parameters wrapper.
/// Looks for parameter with name "resource".
fn extract_resource_from_parameters(params: &Value) -> Option<Value> {
    params
        .get("parameter")
        .and_then(|p| p.as_array())
        .and_then(|arr| {
            arr.iter()
                .find(|p| p.get("name").and_then(|n| n.as_str()) == Some("resource"))
        })
        .and_then(|p| p.get("resource"))
        .cloned()
}

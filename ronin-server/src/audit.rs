use ronin_core::Validation;
use ronin_store::IssueLog;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One normalization attempt to be written to the issue log
#[derive(Debug, Clone)]
pub struct NormalizationRecord {
    pub tenant: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub accepted: bool,
    pub validation: Validation,
}

/// Log a normalization outcome and persist it.
///
/// Write failures are logged and never fail the request.
pub async fn record_outcome(record: NormalizationRecord, issue_log: &Arc<Mutex<IssueLog>>) {
    tracing::info!(
        tenant = %record.tenant,
        resource_type = %record.resource_type,
        resource_id = record.resource_id.as_deref().unwrap_or("<none>"),
        accepted = record.accepted,
        errors = record.validation.errors().count(),
        warnings = record.validation.warnings().count(),
        "Normalization: {} {}",
        if record.accepted { "accepted" } else { "rejected" },
        record.resource_type
    );

    let log = issue_log.lock().await;
    if let Err(e) = log.record(
        &record.tenant,
        &record.resource_type,
        record.resource_id.as_deref(),
        record.accepted,
        &record.validation,
    ) {
        tracing::error!(tenant = %record.tenant, error = %e, "Failed to write issue log entry");
    }
}

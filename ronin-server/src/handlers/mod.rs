pub mod metadata;
pub mod normalize;
pub mod registry;

use axum::{
    http::StatusCode,
    response::Json,
};
use ronin_core::{
    operation_outcome::IssueType,
    OperationOutcome, Tenant,
};
use serde_json::{json, Value};

pub type ErrorResponse = (StatusCode, Json<Value>);

/// Build an error response carrying a single-issue OperationOutcome
pub fn error_response(status: StatusCode, code: IssueType, diagnostics: impl Into<String>) -> ErrorResponse {
    (status, Json(json!(OperationOutcome::error(code, diagnostics))))
}

/// Tenant mnemonics are short lowercase alphanumerics
pub fn parse_tenant(mnemonic: &str) -> Result<Tenant, ErrorResponse> {
    let valid = !mnemonic.is_empty()
        && mnemonic.len() <= 32
        && mnemonic
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());

    if valid {
        Ok(Tenant::new(mnemonic))
    } else {
        Err(error_response(
            StatusCode::BAD_REQUEST,
            IssueType::Invalid,
            format!("Invalid tenant mnemonic: {}", mnemonic),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tenant() {
        assert_eq!(parse_tenant("test").unwrap().mnemonic(), "test");
        assert_eq!(parse_tenant("ab12").unwrap().mnemonic(), "ab12");
        assert!(parse_tenant("").is_err());
        assert!(parse_tenant("Bad-Tenant").is_err());
        assert!(parse_tenant("a/b").is_err());
    }
}

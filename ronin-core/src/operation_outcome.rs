use serde::{Deserialize, Serialize};

use crate::model::{CodeableConcept, Coding};
use crate::validation::{Issue, IssueSeverity, Validation, issues};

/// Code system for Ronin validation issue codes in `issue.details`.
pub const ISSUE_CODE_SYSTEM: &str = "http://projectronin.com/validation-issue";

/// FHIR OperationOutcome resource for reporting normalization results
/// See: https://www.hl7.org/fhir/operationoutcome.html
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub issue: Vec<OperationOutcomeIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcomeIssue {
    pub severity: OutcomeSeverity,
    pub code: IssueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeSeverity {
    Error,
    Warning,
    Information,
}

impl From<IssueSeverity> for OutcomeSeverity {
    fn from(severity: IssueSeverity) -> Self {
        match severity {
            IssueSeverity::Error => Self::Error,
            IssueSeverity::Warning => Self::Warning,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Structure,
    Required,
    Invariant,
    Processing,
    NotSupported,
    MultipleMatches,
    CodeInvalid,
    Exception,
    Informational,
}

impl IssueType {
    /// FHIR issue type for a validation issue code.
    pub fn for_code(code: &str) -> Self {
        match code {
            issues::REQUIRED_FIELD => Self::Required,
            issues::CONCEPT_MAP_LOOKUP | issues::INVALID_VALUE_SET => Self::CodeInvalid,
            issues::PROFILE_NO_MATCH => Self::Processing,
            issues::PROFILE_AMBIGUOUS => Self::MultipleMatches,
            _ => Self::Invariant,
        }
    }
}

impl From<&Issue> for OperationOutcomeIssue {
    fn from(issue: &Issue) -> Self {
        Self {
            severity: issue.severity.into(),
            code: IssueType::for_code(&issue.code),
            diagnostics: Some(issue.message.clone()),
            details: Some(CodeableConcept::from_coding(Coding::new(
                ISSUE_CODE_SYSTEM,
                issue.code.clone(),
            ))),
            expression: (!issue.location.is_empty()).then(|| vec![issue.location.to_string()]),
        }
    }
}

impl OperationOutcome {
    /// Create a new OperationOutcome with a single issue
    pub fn new(severity: OutcomeSeverity, code: IssueType, diagnostics: impl Into<String>) -> Self {
        Self {
            resource_type: "OperationOutcome".to_string(),
            id: None,
            issue: vec![OperationOutcomeIssue {
                severity,
                code,
                diagnostics: Some(diagnostics.into()),
                details: None,
                expression: None,
            }],
        }
    }

    /// Create a success OperationOutcome (normalization raised no issues)
    pub fn success() -> Self {
        Self::new(OutcomeSeverity::Information, IssueType::Informational, "All OK")
    }

    /// Create an error OperationOutcome
    pub fn error(code: IssueType, diagnostics: impl Into<String>) -> Self {
        Self::new(OutcomeSeverity::Error, code, diagnostics)
    }

    /// Create an invalid resource error
    pub fn invalid_resource(diagnostics: impl Into<String>) -> Self {
        Self::error(IssueType::Invalid, diagnostics)
    }

    /// One issue per validation issue, in order. An empty validation reports success.
    pub fn from_validation(validation: &Validation) -> Self {
        if !validation.has_issues() {
            return Self::success();
        }
        Self {
            resource_type: "OperationOutcome".to_string(),
            id: None,
            issue: validation.issues().iter().map(OperationOutcomeIssue::from).collect(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.issue
            .iter()
            .any(|i| i.severity == OutcomeSeverity::Error)
    }

    /// Add an issue with expression (path to the problematic element)
    pub fn with_expression(mut self, expression: Vec<String>) -> Self {
        if let Some(issue) = self.issue.last_mut() {
            issue.expression = Some(expression);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{IssueTemplate, LocationPath};

    #[test]
    fn test_operation_outcome_serialization() {
        let outcome = OperationOutcome::error(IssueType::NotSupported, "Unsupported resource type: Foo");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("OperationOutcome"));
        assert!(json.contains("error"));
        assert!(json.contains("not-supported"));
    }

    #[test]
    fn test_success_helper() {
        let outcome = OperationOutcome::from_validation(&Validation::new());
        assert_eq!(outcome.issue.len(), 1);
        assert_eq!(outcome.issue[0].severity, OutcomeSeverity::Information);
        assert_eq!(outcome.issue[0].code, IssueType::Informational);
        assert!(!outcome.has_errors());
    }

    #[test]
    fn test_from_validation() {
        let location = LocationPath::new("Patient").element("telecom", 0).field("system");
        let mut validation = Validation::new();
        validation.add(issues::concept_map_lookup("Patient.telecom.system", "xyz", "test"), &location);
        validation.add(IssueTemplate::warning("RONIN_CNTCTPT_007", "removed"), &LocationPath::new("Patient"));

        let outcome = OperationOutcome::from_validation(&validation);

        assert_eq!(outcome.issue.len(), 2);
        assert!(outcome.has_errors());
        let first = &outcome.issue[0];
        assert_eq!(first.severity, OutcomeSeverity::Error);
        assert_eq!(first.code, IssueType::CodeInvalid);
        assert_eq!(first.expression.as_ref().unwrap()[0], "Patient.telecom[0].system");
        assert_eq!(
            first.details.as_ref().unwrap().coding[0].code.as_deref(),
            Some(issues::CONCEPT_MAP_LOOKUP)
        );
        assert_eq!(outcome.issue[1].severity, OutcomeSeverity::Warning);
        assert_eq!(outcome.issue[1].code, IssueType::Invariant);
    }

    #[test]
    fn test_severity_follows_validation() {
        let mut validation = Validation::new();
        validation.add(IssueTemplate::warning("RONIN_CNTCTPT_007", "removed"), &LocationPath::new("Patient"));
        let outcome = OperationOutcome::from_validation(&validation);
        assert!(!outcome.has_errors());

        let severities: Vec<_> = [
            OutcomeSeverity::from(IssueSeverity::Error),
            OutcomeSeverity::from(IssueSeverity::Warning),
            OutcomeSeverity::Information,
        ]
        .iter()
        .map(|s| serde_json::to_value(s).unwrap())
        .collect();
        assert_eq!(severities, vec!["error", "warning", "information"]);
        assert!(serde_json::from_value::<OutcomeSeverity>(serde_json::json!("fatal")).is_err());
    }

    #[test]
    fn test_with_expression() {
        let outcome = OperationOutcome::invalid_resource("Invalid name")
            .with_expression(vec!["Patient.name[0]".to_string()]);
        assert_eq!(
            outcome.issue[0].expression.as_ref().unwrap()[0],
            "Patient.name[0]"
        );
    }
}

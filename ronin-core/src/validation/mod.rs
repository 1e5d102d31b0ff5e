//! Issue accumulation for profile transforms
//!
//! A [`Validation`] collects typed issues while a resource is transformed and
//! validated. Warnings are reported but never block; any error fails the
//! resource once the caller escalates with [`Validation::raise_if_errors`].

pub mod issues;
pub mod location;

pub use location::{LocationFrame, LocationPath};

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSeverity::Error => f.write_str("ERROR"),
            IssueSeverity::Warning => f.write_str("WARNING"),
        }
    }
}

/// An issue that has not yet been tied to a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueTemplate {
    pub severity: IssueSeverity,
    pub code: Cow<'static, str>,
    pub description: String,
}

impl IssueTemplate {
    pub fn error(code: impl Into<Cow<'static, str>>, description: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code: code.into(),
            description: description.into(),
        }
    }

    pub fn warning(code: impl Into<Cow<'static, str>>, description: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            code: code.into(),
            description: description.into(),
        }
    }

    pub fn at(self, location: &LocationPath) -> Issue {
        Issue {
            severity: self.severity,
            code: self.code.into_owned(),
            message: self.description,
            location: location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub severity: IssueSeverity,
    pub code: String,
    pub message: String,
    pub location: LocationPath,
}

impl Issue {
    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} @ {}",
            self.severity, self.code, self.message, self.location
        )
    }
}

/// Raised by [`Validation::raise_if_errors`] when at least one error is present.
#[derive(Error, Debug, Clone)]
#[error("Encountered validation error(s):\n{}", format_issues(.issues))]
pub struct ValidationFailure {
    pub issues: Vec<Issue>,
}

fn format_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ordered, append-only collection of issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Validation {
    issues: Vec<Issue>,
}

impl Validation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `issue` at `location` unless `condition` holds. Returns `condition`.
    pub fn check_true(
        &mut self,
        condition: bool,
        issue: IssueTemplate,
        location: &LocationPath,
    ) -> bool {
        if !condition {
            self.issues.push(issue.at(location));
        }
        condition
    }

    /// Records `issue` at `location` when `value` is `None`. Returns whether a value was present.
    pub fn check_not_null<T>(
        &mut self,
        value: Option<&T>,
        issue: IssueTemplate,
        location: &LocationPath,
    ) -> bool {
        self.check_true(value.is_some(), issue, location)
    }

    pub fn add(&mut self, issue: IssueTemplate, location: &LocationPath) {
        self.issues.push(issue.at(location));
    }

    pub fn merge(&mut self, other: Validation) {
        self.issues.extend(other.issues);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Fails only when an error is present; warnings never block.
    pub fn raise_if_errors(&self) -> Result<(), ValidationFailure> {
        if self.has_errors() {
            Err(ValidationFailure {
                issues: self.issues.clone(),
            })
        } else {
            Ok(())
        }
    }
}

impl From<ValidationFailure> for Validation {
    fn from(failure: ValidationFailure) -> Self {
        Self {
            issues: failure.issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> LocationPath {
        LocationPath::new("Patient").field("gender")
    }

    #[test]
    fn test_check_true_records_only_on_failure() {
        let mut validation = Validation::new();

        assert!(validation.check_true(true, issues::required_field("gender"), &location()));
        assert!(!validation.has_issues());

        assert!(!validation.check_true(false, issues::required_field("gender"), &location()));
        assert_eq!(validation.issues().len(), 1);
        assert_eq!(validation.issues()[0].code, "REQ_FIELD");
        assert_eq!(validation.issues()[0].location.to_string(), "Patient.gender");
    }

    #[test]
    fn test_check_not_null() {
        let mut validation = Validation::new();
        let missing: Option<&String> = None;

        assert!(!validation.check_not_null(missing, issues::required_field("gender"), &location()));
        assert!(validation.has_errors());
    }

    #[test]
    fn test_warnings_do_not_raise() {
        let mut validation = Validation::new();
        validation.add(IssueTemplate::warning("WARN_001", "just a warning"), &location());

        assert!(validation.has_issues());
        assert!(!validation.has_errors());
        assert!(validation.raise_if_errors().is_ok());
    }

    #[test]
    fn test_raise_if_errors_carries_every_issue() {
        let mut validation = Validation::new();
        validation.add(IssueTemplate::warning("WARN_001", "just a warning"), &location());
        validation.add(issues::required_field("gender"), &location());

        let failure = validation.raise_if_errors().unwrap_err();
        assert_eq!(failure.issues.len(), 2);
        assert!(failure.to_string().contains("ERROR REQ_FIELD"));
        assert!(failure.to_string().contains("WARNING WARN_001"));
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut first = Validation::new();
        first.add(IssueTemplate::error("A", "first"), &location());
        let mut second = Validation::new();
        second.add(IssueTemplate::warning("B", "second"), &location());

        first.merge(second);
        let codes: Vec<_> = first.issues().iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert_eq!(first.errors().count(), 1);
        assert_eq!(first.warnings().count(), 1);
    }
}

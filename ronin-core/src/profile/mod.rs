//! Ronin profiles
//!
//! A profile turns a tenant resource into its canonical Ronin form in two
//! steps: `transform_internal` maps and localizes fields, then `validate`
//! checks the canonical invariants. Element-level problems inside a list may
//! only drop the item with a warning, but any error in the combined
//! validation rejects the whole resource.

pub mod condition;
pub mod contact_point;
pub mod observation;
pub mod patient;
pub mod selector;

pub use condition::ConditionProfile;
pub use contact_point::ContactPointProfile;
pub use observation::{
    observation_selector, LaboratoryResultProfile, SocialHistoryProfile, VitalSignsProfile,
};
pub use patient::PatientProfile;
pub use selector::ProfileSelector;

use crate::model::ronin::system;
use crate::model::{DomainResource, Identifier, Meta, Reference};
use crate::registry::RegistryClient;
use crate::tenant::Tenant;
use crate::validation::{IssueTemplate, LocationPath, Validation, ValidationFailure};

/// Per-call inputs shared by every profile in a transform.
#[derive(Clone, Copy)]
pub struct TransformContext<'a> {
    pub tenant: &'a Tenant,
    pub registry: &'a RegistryClient,
}

impl<'a> TransformContext<'a> {
    pub fn new(tenant: &'a Tenant, registry: &'a RegistryClient) -> Self {
        Self { tenant, registry }
    }
}

/// The transformed resource, or `None` when rejected, plus every issue found.
#[derive(Debug, Clone)]
pub struct TransformOutcome<T> {
    pub resource: Option<T>,
    pub validation: Validation,
}

impl<T> TransformOutcome<T> {
    pub fn accepted(resource: T, validation: Validation) -> Self {
        Self {
            resource: Some(resource),
            validation,
        }
    }

    pub fn rejected(validation: Validation) -> Self {
        Self {
            resource: None,
            validation,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.resource.is_some()
    }

    /// Escalates accumulated errors. Warnings stay with the returned validation.
    pub fn into_result(self) -> Result<(T, Validation), ValidationFailure> {
        self.validation.raise_if_errors()?;
        match self.resource {
            Some(resource) => Ok((resource, self.validation)),
            None => Err(ValidationFailure {
                issues: self.validation.into_issues(),
            }),
        }
    }
}

pub trait BaseProfile<T: DomainResource>: Send + Sync {
    /// Short display name, used in selection diagnostics.
    fn name(&self) -> &'static str;

    fn profile_url(&self) -> &'static str;

    /// Whether `resource` has the shape this profile handles. Must be pure.
    fn qualifies(&self, _resource: &T) -> bool {
        true
    }

    fn transform_internal(&self, original: &T, ctx: &TransformContext<'_>) -> (Option<T>, Validation);

    fn validate(&self, resource: &T, ctx: &TransformContext<'_>, validation: &mut Validation);

    fn transform(&self, original: &T, ctx: &TransformContext<'_>) -> TransformOutcome<T> {
        let (transformed, mut validation) = self.transform_internal(original, ctx);

        if validation.has_errors() {
            log_rejection::<T>(self.name(), original.id(), ctx.tenant, &validation);
            return TransformOutcome::rejected(validation);
        }
        let Some(transformed) = transformed else {
            return TransformOutcome::rejected(validation);
        };

        self.validate(&transformed, ctx, &mut validation);
        if validation.has_errors() {
            log_rejection::<T>(self.name(), original.id(), ctx.tenant, &validation);
            return TransformOutcome::rejected(validation);
        }

        TransformOutcome::accepted(transformed, validation)
    }
}

fn log_rejection<T: DomainResource>(
    profile: &str,
    id: Option<&str>,
    tenant: &Tenant,
    validation: &Validation,
) {
    tracing::warn!(
        tenant = %tenant,
        resource_type = T::RESOURCE_TYPE,
        id = id.unwrap_or("<none>"),
        profile,
        errors = validation.errors().count(),
        "Resource rejected by profile"
    );
}

/// `meta` of a canonical resource: the source meta with its profiles replaced.
pub fn ronin_meta(original: Option<&Meta>, profile_url: &str) -> Meta {
    Meta {
        profile: vec![profile_url.to_string()],
        ..original.cloned().unwrap_or_default()
    }
}

/// Source identifiers followed by the Ronin tenant, FHIR id and data authority identifiers.
pub fn with_ronin_identifiers(
    identifiers: &[Identifier],
    source_id: Option<&str>,
    tenant: &Tenant,
) -> Vec<Identifier> {
    let mut all = identifiers.to_vec();
    all.extend(crate::localization::ronin_identifiers(source_id, tenant));
    all
}

pub fn validate_ronin_identifiers(
    identifiers: &[Identifier],
    location: &LocationPath,
    validation: &mut Validation,
) {
    let location = location.field("identifier");
    let has = |system: &str| {
        identifiers
            .iter()
            .any(|i| i.system.as_deref() == Some(system) && i.value.is_some())
    };

    validation.check_true(
        has(system::TENANT),
        IssueTemplate::error("RONIN_TNNT_ID_001", "Tenant identifier is required"),
        &location,
    );
    validation.check_true(
        has(system::FHIR_ID),
        IssueTemplate::error("RONIN_FHIR_ID_001", "FHIR identifier is required"),
        &location,
    );
    validation.check_true(
        has(system::DATA_AUTHORITY),
        IssueTemplate::error("RONIN_DAUTH_ID_001", "Data Authority identifier required"),
        &location,
    );
}

pub fn validate_meta_profile(
    meta: Option<&Meta>,
    profile_url: &str,
    location: &LocationPath,
    validation: &mut Validation,
) {
    validation.check_true(
        meta.is_some_and(|m| m.profile.iter().any(|p| p == profile_url)),
        IssueTemplate::error(
            "RONIN_META_001",
            format!("meta.profile must declare {}", profile_url),
        ),
        &location.field("meta").field("profile"),
    );
}

pub fn validate_reference_type(
    reference: Option<&Reference>,
    allowed: &[&str],
    location: &LocationPath,
    validation: &mut Validation,
) {
    let Some(reference) = reference else {
        return;
    };
    validation.check_true(
        reference.target_type().is_some_and(|t| allowed.contains(&t)),
        IssueTemplate::error(
            "RONIN_INV_REF_TYPE",
            format!("The referenced resource type was not one of {}", allowed.join(", ")),
        ),
        location,
    );
}

/// Resolves the source id and records `REQ_FIELD` when it is missing.
pub(crate) fn require_id<'r, T: DomainResource>(
    original: &'r T,
    validation: &mut Validation,
) -> Option<&'r str> {
    let id = original.id();
    validation.check_not_null(
        id.as_ref(),
        crate::validation::issues::required_field("id"),
        &LocationPath::new(T::RESOURCE_TYPE).field("id"),
    );
    id
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::Patient;
    use crate::registry::client::tests::client_with;
    use crate::validation::issues;
    use serde_json::json;

    /// Profile whose stages can be forced to fail.
    struct StubProfile {
        internal_error: bool,
        internal_none: bool,
        validate_error: bool,
        validated: std::sync::atomic::AtomicBool,
    }

    impl StubProfile {
        fn new(internal_error: bool, internal_none: bool, validate_error: bool) -> Self {
            Self {
                internal_error,
                internal_none,
                validate_error,
                validated: std::sync::atomic::AtomicBool::new(false),
            }
        }

        fn was_validated(&self) -> bool {
            self.validated.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    impl BaseProfile<Patient> for StubProfile {
        fn name(&self) -> &'static str {
            "Stub"
        }

        fn profile_url(&self) -> &'static str {
            "http://example.com/stub"
        }

        fn transform_internal(
            &self,
            original: &Patient,
            _ctx: &TransformContext<'_>,
        ) -> (Option<Patient>, Validation) {
            let mut validation = Validation::new();
            validation.add(
                IssueTemplate::warning("STUB_WARN", "internal warning"),
                &LocationPath::new("Patient"),
            );
            if self.internal_error {
                validation.add(issues::required_field("id"), &LocationPath::new("Patient"));
            }
            let resource = (!self.internal_none).then(|| original.clone());
            (resource, validation)
        }

        fn validate(&self, _resource: &Patient, _ctx: &TransformContext<'_>, validation: &mut Validation) {
            self.validated.store(true, std::sync::atomic::Ordering::SeqCst);
            if self.validate_error {
                validation.add(issues::required_field("name"), &LocationPath::new("Patient"));
            }
        }
    }

    pub(crate) fn patient() -> Patient {
        serde_json::from_value(json!({"resourceType": "Patient", "id": "123"})).unwrap()
    }

    #[test]
    fn test_accepts_with_warnings() {
        let client = client_with(vec![], vec![]);
        let tenant = Tenant::new("test");
        let profile = StubProfile::new(false, false, false);

        let outcome = profile.transform(&patient(), &TransformContext::new(&tenant, &client));
        assert!(outcome.is_accepted());
        assert!(profile.was_validated());
        assert_eq!(outcome.validation.warnings().count(), 1);
    }

    #[test]
    fn test_internal_errors_skip_validate() {
        let client = client_with(vec![], vec![]);
        let tenant = Tenant::new("test");
        let profile = StubProfile::new(true, false, false);

        let outcome = profile.transform(&patient(), &TransformContext::new(&tenant, &client));
        assert!(outcome.resource.is_none());
        assert!(!profile.was_validated());
    }

    #[test]
    fn test_null_payload_skips_validate() {
        let client = client_with(vec![], vec![]);
        let tenant = Tenant::new("test");
        let profile = StubProfile::new(false, true, false);

        let outcome = profile.transform(&patient(), &TransformContext::new(&tenant, &client));
        assert!(outcome.resource.is_none());
        assert!(!outcome.validation.has_errors());
        assert!(!profile.was_validated());
    }

    #[test]
    fn test_validate_error_fails_closed() {
        let client = client_with(vec![], vec![]);
        let tenant = Tenant::new("test");
        let profile = StubProfile::new(false, false, true);

        let outcome = profile.transform(&patient(), &TransformContext::new(&tenant, &client));
        assert!(profile.was_validated());
        assert!(outcome.resource.is_none());
        assert_eq!(outcome.validation.errors().count(), 1);

        let failure = outcome.into_result().unwrap_err();
        assert_eq!(failure.issues.len(), 2);
    }

    #[test]
    fn test_ronin_identifier_validation() {
        let tenant = Tenant::new("test");
        let location = LocationPath::new("Patient");

        let mut missing = Validation::new();
        validate_ronin_identifiers(&[], &location, &mut missing);
        let codes: Vec<_> = missing.issues().iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["RONIN_TNNT_ID_001", "RONIN_FHIR_ID_001", "RONIN_DAUTH_ID_001"]);

        let mut present = Validation::new();
        validate_ronin_identifiers(
            &with_ronin_identifiers(&[], Some("123"), &tenant),
            &location,
            &mut present,
        );
        assert!(!present.has_issues());
    }

    #[test]
    fn test_reference_type_validation() {
        let location = LocationPath::new("Condition").field("subject");
        let mut validation = Validation::new();

        validate_reference_type(Some(&Reference::new("Patient/1")), &["Patient"], &location, &mut validation);
        assert!(!validation.has_issues());

        validate_reference_type(Some(&Reference::new("Group/1")), &["Patient"], &location, &mut validation);
        assert_eq!(validation.issues()[0].code, "RONIN_INV_REF_TYPE");
    }

    #[test]
    fn test_ronin_meta_replaces_profiles() {
        let original = Meta {
            source: Some("ehr".to_string()),
            profile: vec!["http://hl7.org/fhir/us/core/StructureDefinition/us-core-patient".to_string()],
            ..Default::default()
        };
        let meta = ronin_meta(Some(&original), "http://example.com/ronin");
        assert_eq!(meta.profile, vec!["http://example.com/ronin".to_string()]);
        assert_eq!(meta.source.as_deref(), Some("ehr"));
    }
}

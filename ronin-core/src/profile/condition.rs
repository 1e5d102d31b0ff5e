use super::{
    BaseProfile, TransformContext, require_id, ronin_meta, validate_meta_profile,
    validate_reference_type, validate_ronin_identifiers, with_ronin_identifiers,
};
use crate::localization::{Localizable, localize};
use crate::model::ronin::{profile_url, system};
use crate::model::{Abatement, CodedEnum, Condition, ConditionClinicalStatus, Onset, Period};
use crate::validation::issues;
use crate::validation::{IssueTemplate, LocationPath, Validation};

const CATEGORY_ELEMENT: &str = "Condition.category";

/// Ronin problem list and health concern conditions.
pub struct ConditionProfile;

fn onset_field(onset: &Onset) -> &'static str {
    match onset {
        Onset::DateTime(_) => "onsetDateTime",
        Onset::Age(_) => "onsetAge",
        Onset::Period(_) => "onsetPeriod",
        Onset::Range(_) => "onsetRange",
        Onset::String(_) => "onsetString",
    }
}

fn abatement_field(abatement: &Abatement) -> &'static str {
    match abatement {
        Abatement::DateTime(_) => "abatementDateTime",
        Abatement::Age(_) => "abatementAge",
        Abatement::Period(_) => "abatementPeriod",
        Abatement::Range(_) => "abatementRange",
        Abatement::String(_) => "abatementString",
    }
}

fn period_in_order(period: &Period) -> bool {
    match (period.start.as_deref(), period.end.as_deref()) {
        (Some(start), Some(end)) => start <= end,
        _ => true,
    }
}

fn clinical_status(condition: &Condition) -> Option<ConditionClinicalStatus> {
    condition
        .clinical_status
        .as_ref()?
        .coding
        .iter()
        .filter(|c| c.system.as_deref() == Some(system::CONDITION_CLINICAL))
        .find_map(|c| c.code.as_deref().and_then(ConditionClinicalStatus::from_code))
}

impl BaseProfile<Condition> for ConditionProfile {
    fn name(&self) -> &'static str {
        "RoninConditionProblemsAndHealthConcerns"
    }

    fn profile_url(&self) -> &'static str {
        profile_url::CONDITION
    }

    fn transform_internal(&self, original: &Condition, ctx: &TransformContext<'_>) -> (Option<Condition>, Validation) {
        let mut validation = Validation::new();
        let Some(id) = require_id(original, &mut validation) else {
            return (None, validation);
        };

        let transformed = Condition {
            id: Some(localize(id, ctx.tenant)),
            meta: Some(ronin_meta(original.meta.as_ref(), profile_url::CONDITION)),
            identifier: with_ronin_identifiers(&original.identifier, Some(id), ctx.tenant),
            subject: original.subject.localize(ctx.tenant),
            encounter: original.encounter.localize(ctx.tenant),
            other: original.other.localize(ctx.tenant),
            ..original.clone()
        };

        (Some(transformed), validation)
    }

    fn validate(&self, resource: &Condition, ctx: &TransformContext<'_>, validation: &mut Validation) {
        let location = LocationPath::new("Condition");

        validate_ronin_identifiers(&resource.identifier, &location, validation);
        validate_meta_profile(resource.meta.as_ref(), profile_url::CONDITION, &location, validation);

        validation.check_not_null(resource.code.as_ref(), issues::required_field("code"), &location.field("code"));
        validation.check_true(
            !resource.category.is_empty(),
            issues::required_field("category"),
            &location.field("category"),
        );
        if validation.check_not_null(
            resource.subject.as_ref(),
            issues::required_field("subject"),
            &location.field("subject"),
        ) {
            validate_reference_type(resource.subject.as_ref(), &["Patient"], &location.field("subject"), validation);
        }

        if let Some(allowed) = ctx
            .registry
            .resolve_value_set(None, CATEGORY_ELEMENT, Some(profile_url::CONDITION))
        {
            for (index, category) in resource.category.iter().enumerate() {
                let listed = category
                    .coding
                    .iter()
                    .any(|coding| allowed.iter().any(|a| a.same_code(coding)));
                let value = category
                    .coding
                    .iter()
                    .filter_map(|c| c.code.as_deref())
                    .collect::<Vec<_>>()
                    .join(", ");
                validation.check_true(
                    listed,
                    issues::invalid_value_set(CATEGORY_ELEMENT, &value),
                    &location.element("category", index),
                );
            }
        }

        match &resource.onset {
            Some(onset @ Onset::Period(period)) => {
                validation.check_true(
                    period_in_order(period),
                    IssueTemplate::error("RONIN_CND_002", "Period start must not be after its end"),
                    &location.field(onset_field(onset)),
                );
            }
            Some(Onset::DateTime(_) | Onset::Age(_) | Onset::Range(_) | Onset::String(_)) | None => {}
        }

        if let Some(abatement) = &resource.abatement {
            let location = location.field(abatement_field(abatement));
            validation.check_true(
                clinical_status(resource).is_some_and(|s| s.is_abated()),
                IssueTemplate::error(
                    "RONIN_CND_001",
                    "If condition is abated, then clinicalStatus must be either inactive, resolved or remission",
                ),
                &location,
            );
            match abatement {
                Abatement::Period(period) => {
                    validation.check_true(
                        period_in_order(period),
                        IssueTemplate::error("RONIN_CND_002", "Period start must not be after its end"),
                        &location,
                    );
                }
                Abatement::DateTime(_) | Abatement::Age(_) | Abatement::Range(_) | Abatement::String(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryClient;
    use crate::registry::client::tests::{client_with, row};
    use crate::tenant::Tenant;
    use serde_json::json;

    fn category_value_set() -> serde_json::Value {
        json!({
            "resourceType": "ValueSet",
            "expansion": {"contains": [{
                "system": system::CONDITION_CATEGORY,
                "version": "4.0.1",
                "code": "problem-list-item",
                "display": "Problem List Item"
            }]}
        })
    }

    fn client() -> RegistryClient {
        client_with(
            vec![row("cat", CATEGORY_ELEMENT, "value_set", None, Some(profile_url::CONDITION))],
            vec![("cat", category_value_set())],
        )
    }

    fn condition(extra: serde_json::Value) -> Condition {
        let mut value = json!({
            "resourceType": "Condition",
            "id": "c1",
            "category": [{"coding": [{"system": system::CONDITION_CATEGORY, "code": "problem-list-item"}]}],
            "code": {"coding": [{"system": "http://snomed.info/sct", "code": "38341003"}]},
            "subject": {"reference": "Patient/p1"},
            "encounter": {"reference": "Encounter/e1"}
        });
        if let (Some(target), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
            target.extend(extra.clone());
        }
        serde_json::from_value(value).unwrap()
    }

    fn clinical(code: &str) -> serde_json::Value {
        json!({"coding": [{"system": system::CONDITION_CLINICAL, "code": code}]})
    }

    #[test]
    fn test_condition_localized() {
        let client = client();
        let tenant = Tenant::new("test");
        let outcome = ConditionProfile.transform(&condition(json!({})), &TransformContext::new(&tenant, &client));

        let condition = outcome.resource.unwrap();
        assert_eq!(condition.id.as_deref(), Some("test-c1"));
        assert_eq!(condition.subject.unwrap().reference.as_deref(), Some("Patient/test-p1"));
        assert_eq!(condition.encounter.unwrap().reference.as_deref(), Some("Encounter/test-e1"));
    }

    #[test]
    fn test_category_outside_value_set() {
        let client = client();
        let tenant = Tenant::new("test");
        let original = condition(json!({
            "category": [{"coding": [{"system": system::CONDITION_CATEGORY, "code": "encounter-diagnosis"}]}]
        }));

        let outcome = ConditionProfile.transform(&original, &TransformContext::new(&tenant, &client));

        assert!(outcome.resource.is_none());
        let error = outcome.validation.errors().next().unwrap();
        assert_eq!(error.code, issues::INVALID_VALUE_SET);
        assert_eq!(error.location.to_string(), "Condition.category[0]");
    }

    #[test]
    fn test_category_unchecked_without_value_set() {
        let client = client_with(vec![], vec![]);
        let tenant = Tenant::new("test");
        let original = condition(json!({
            "category": [{"coding": [{"system": system::CONDITION_CATEGORY, "code": "encounter-diagnosis"}]}]
        }));

        let outcome = ConditionProfile.transform(&original, &TransformContext::new(&tenant, &client));
        assert!(outcome.is_accepted());
    }

    #[test]
    fn test_abated_condition_requires_abated_status() {
        let client = client();
        let tenant = Tenant::new("test");
        let ctx = TransformContext::new(&tenant, &client);

        let active = condition(json!({"abatementDateTime": "2024-01-01", "clinicalStatus": clinical("active")}));
        let outcome = ConditionProfile.transform(&active, &ctx);
        let error = outcome.validation.errors().next().unwrap();
        assert_eq!(error.code, "RONIN_CND_001");
        assert_eq!(error.location.to_string(), "Condition.abatementDateTime");

        let resolved = condition(json!({"abatementDateTime": "2024-01-01", "clinicalStatus": clinical("resolved")}));
        assert!(ConditionProfile.transform(&resolved, &ctx).is_accepted());
    }

    #[test]
    fn test_onset_period_order() {
        let client = client();
        let tenant = Tenant::new("test");
        let original = condition(json!({"onsetPeriod": {"start": "2024-02-01", "end": "2024-01-01"}}));

        let outcome = ConditionProfile.transform(&original, &TransformContext::new(&tenant, &client));
        assert_eq!(outcome.validation.errors().next().unwrap().location.to_string(), "Condition.onsetPeriod");
    }

    #[test]
    fn test_missing_required_elements() {
        let client = client_with(vec![], vec![]);
        let tenant = Tenant::new("test");
        let mut original = condition(json!({}));
        original.code = None;
        original.category.clear();
        original.subject = None;

        let outcome = ConditionProfile.transform(&original, &TransformContext::new(&tenant, &client));
        let locations: Vec<_> = outcome.validation.errors().map(|i| i.location.to_string()).collect();
        assert_eq!(locations, vec!["Condition.code", "Condition.category", "Condition.subject"]);
    }
}

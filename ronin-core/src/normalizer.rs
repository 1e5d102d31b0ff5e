//! Entry point from raw JSON to a canonical resource.

use serde_json::Value;

use crate::error::{Result, RoninError};
use crate::model::{Condition, DomainResource, Observation, Patient};
use crate::profile::{
    BaseProfile, ConditionProfile, PatientProfile, ProfileSelector, TransformContext,
    TransformOutcome, observation_selector,
};
use crate::registry::RegistryClient;
use crate::tenant::Tenant;
use crate::validation::{Validation, ValidationFailure};

pub const SUPPORTED_RESOURCE_TYPES: &[&str] = &["Patient", "Condition", "Observation"];

/// Result of normalizing one resource. `resource` is `None` when rejected.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub resource_type: String,
    pub resource: Option<Value>,
    pub validation: Validation,
}

impl Normalized {
    pub fn is_accepted(&self) -> bool {
        self.resource.is_some()
    }
}

pub struct ResourceNormalizer {
    registry: RegistryClient,
    patient: PatientProfile,
    condition: ConditionProfile,
    observation: ProfileSelector<Observation>,
}

impl ResourceNormalizer {
    pub fn new(registry: RegistryClient) -> Self {
        Self {
            registry,
            patient: PatientProfile::new(),
            condition: ConditionProfile,
            observation: observation_selector(),
        }
    }

    pub fn registry(&self) -> &RegistryClient {
        &self.registry
    }

    /// Transforms and validates `resource` for `tenant`.
    ///
    /// Validation problems are reported in the returned [`Normalized`]; an
    /// `Err` means the input could not be read as a supported resource.
    pub fn normalize(&self, resource: Value, tenant: &Tenant) -> Result<Normalized> {
        let resource_type = resource
            .get("resourceType")
            .and_then(Value::as_str)
            .ok_or(RoninError::MissingResourceType)?
            .to_string();
        let ctx = TransformContext::new(tenant, &self.registry);

        let normalized = match resource_type.as_str() {
            "Patient" => {
                let patient: Patient = serde_json::from_value(resource)?;
                finish(self.patient.transform(&patient, &ctx))?
            }
            "Condition" => {
                let condition: Condition = serde_json::from_value(resource)?;
                finish(self.condition.transform(&condition, &ctx))?
            }
            "Observation" => {
                let observation: Observation = serde_json::from_value(resource)?;
                finish(self.observation.transform(&observation, &ctx))?
            }
            other => return Err(RoninError::UnsupportedResourceType(other.to_string())),
        };

        tracing::info!(
            tenant = %tenant,
            resource_type = %normalized.resource_type,
            accepted = normalized.is_accepted(),
            errors = normalized.validation.errors().count(),
            warnings = normalized.validation.warnings().count(),
            "Normalized resource"
        );
        Ok(normalized)
    }

    /// Like [`normalize`](Self::normalize), but a rejected resource is an
    /// `Err(RoninError::Validation)` and warnings are discarded.
    pub fn normalize_strict(&self, resource: Value, tenant: &Tenant) -> Result<Value> {
        let normalized = self.normalize(resource, tenant)?;
        normalized.validation.raise_if_errors()?;
        normalized.resource.ok_or_else(|| {
            RoninError::Validation(ValidationFailure {
                issues: normalized.validation.into_issues(),
            })
        })
    }
}

fn finish<T: DomainResource>(outcome: TransformOutcome<T>) -> Result<Normalized> {
    let resource = outcome.resource.map(|r| serde_json::to_value(&r)).transpose()?;
    Ok(Normalized {
        resource_type: T::RESOURCE_TYPE.to_string(),
        resource,
        validation: outcome.validation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ronin::extension_url::TENANT_SOURCE_TELECOM_SYSTEM;
    use crate::registry::client::tests::{client_with, row, telecom_map};
    use crate::validation::issues;
    use serde_json::json;

    fn normalizer() -> ResourceNormalizer {
        let mut row = row("sys", "Patient.telecom.system", "concept_map", None, None);
        row["source_extension_url"] = json!(TENANT_SOURCE_TELECOM_SYSTEM);
        ResourceNormalizer::new(client_with(vec![row], vec![("sys", telecom_map(&[("abc", "phone")]))]))
    }

    fn patient_json(system: &str) -> Value {
        json!({
            "resourceType": "Patient",
            "id": "12345",
            "identifier": [{
                "type": {"coding": [{"system": "http://terminology.hl7.org/CodeSystem/v2-0203", "code": "MR"}]},
                "value": "MRN-1"
            }],
            "name": [{"family": "Doe"}],
            "gender": "female",
            "birthDate": "1970-01-01",
            "telecom": [{"system": system, "value": "8675309"}]
        })
    }

    #[test]
    fn test_normalize_patient() {
        let normalized = normalizer().normalize(patient_json("abc"), &Tenant::new("test")).unwrap();

        assert!(normalized.is_accepted());
        let resource = normalized.resource.unwrap();
        assert_eq!(resource["id"], "test-12345");
        assert_eq!(resource["resourceType"], "Patient");
        assert_eq!(resource["telecom"][0]["system"], "phone");
        assert_eq!(
            resource["telecom"][0]["_system"]["extension"][0]["valueCoding"]["code"],
            "abc"
        );
    }

    #[test]
    fn test_normalize_keeps_unmodelled_elements() {
        let normalizer = normalizer();
        let tenant = Tenant::new("test");

        let mut patient = patient_json("abc");
        patient["address"] = json!([{"line": ["1 Main St"], "city": "Springfield"}]);
        patient["maritalStatus"] = json!({"text": "Married"});
        patient["deceasedBoolean"] = json!(false);
        patient["name"] = json!([{"family": "Doe", "prefix": ["Dr."]}]);

        let resource = normalizer.normalize(patient, &tenant).unwrap().resource.unwrap();
        assert_eq!(resource["address"][0]["city"], "Springfield");
        assert_eq!(resource["maritalStatus"]["text"], "Married");
        assert_eq!(resource["deceasedBoolean"], false);
        assert_eq!(resource["name"][0]["prefix"][0], "Dr.");

        let observation = json!({
            "resourceType": "Observation",
            "id": "o1",
            "status": "final",
            "category": [{"coding": [{"system": "http://terminology.hl7.org/CodeSystem/observation-category", "code": "vital-signs"}]}],
            "code": {"coding": [{"system": "http://loinc.org", "code": "85354-9"}]},
            "subject": {"reference": "Patient/p1"},
            "effectiveDateTime": "2024-01-01T00:00:00Z",
            "component": [
                {"code": {"text": "systolic"}, "valueQuantity": {"value": 120.0}},
                {"code": {"text": "diastolic"}, "valueQuantity": {"value": 80.0}}
            ],
            "referenceRange": [{"text": "normal"}],
            "performer": [{"reference": "Practitioner/p1"}]
        });

        let normalized = normalizer.normalize(observation, &tenant).unwrap();
        assert!(normalized.is_accepted());
        let resource = normalized.resource.unwrap();
        assert_eq!(resource["component"][1]["valueQuantity"]["value"], 80.0);
        assert_eq!(resource["referenceRange"][0]["text"], "normal");
        assert_eq!(resource["performer"][0]["reference"], "Practitioner/test-p1");
        assert_eq!(resource["subject"]["reference"], "Patient/test-p1");
        assert_eq!(resource["effectiveDateTime"], "2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_normalize_rejects_unmapped() {
        let normalized = normalizer().normalize(patient_json("xyz"), &Tenant::new("test")).unwrap();

        assert!(!normalized.is_accepted());
        assert_eq!(normalized.validation.issues()[0].code, issues::CONCEPT_MAP_LOOKUP);
    }

    #[test]
    fn test_normalize_strict() {
        let normalizer = normalizer();
        let tenant = Tenant::new("test");

        let resource = normalizer.normalize_strict(patient_json("abc"), &tenant).unwrap();
        assert_eq!(resource["id"], "test-12345");

        match normalizer.normalize_strict(patient_json("xyz"), &tenant) {
            Err(RoninError::Validation(failure)) => {
                assert_eq!(failure.issues[0].code, issues::CONCEPT_MAP_LOOKUP);
            }
            other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unsupported_and_missing_type() {
        let normalizer = normalizer();
        let tenant = Tenant::new("test");

        assert!(matches!(
            normalizer.normalize(json!({"resourceType": "Medication"}), &tenant),
            Err(RoninError::UnsupportedResourceType(t)) if t == "Medication"
        ));
        assert!(matches!(
            normalizer.normalize(json!({"id": "1"}), &tenant),
            Err(RoninError::MissingResourceType)
        ));
    }

    #[test]
    fn test_malformed_resource_is_invalid_json() {
        let result = normalizer().normalize(
            json!({"resourceType": "Patient", "telecom": "not-a-list"}),
            &Tenant::new("test"),
        );
        assert!(matches!(result, Err(RoninError::InvalidJson(_))));
    }

    #[test]
    fn test_observation_without_profile() {
        let observation = json!({
            "resourceType": "Observation",
            "id": "o1",
            "status": "final",
            "category": [{"coding": [{"system": "http://terminology.hl7.org/CodeSystem/observation-category", "code": "exam"}]}],
            "code": {"text": "exam"},
            "subject": {"reference": "Patient/p1"}
        });

        let normalized = normalizer().normalize(observation, &Tenant::new("test")).unwrap();
        assert!(normalized.resource.is_none());
        assert_eq!(normalized.validation.issues()[0].code, issues::PROFILE_NO_MATCH);
    }
}

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::datatypes::{
    CodeableConcept, ContactPoint, Extension, HumanName, Identifier, Meta, Period, Quantity, Range,
    Reference,
};

/// Behaviour shared by every clinical resource the profiles handle.
pub trait DomainResource: Clone + Serialize + DeserializeOwned + Send + Sync {
    const RESOURCE_TYPE: &'static str;

    fn id(&self) -> Option<&str>;

    fn identifiers(&self) -> &[Identifier];

    fn meta(&self) -> Option<&Meta>;
}

fn default_patient_type() -> String {
    "Patient".to_string()
}

fn default_condition_type() -> String {
    "Condition".to_string()
}

fn default_observation_type() -> String {
    "Observation".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default = "default_patient_type")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub general_practitioner: Vec<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managing_organization: Option<Reference>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl DomainResource for Patient {
    const RESOURCE_TYPE: &'static str = "Patient";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn identifiers(&self) -> &[Identifier] {
        &self.identifier
    }

    fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }
}

/// `Condition.onset[x]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Onset {
    #[serde(rename = "onsetDateTime")]
    DateTime(String),
    #[serde(rename = "onsetAge")]
    Age(Quantity),
    #[serde(rename = "onsetPeriod")]
    Period(Period),
    #[serde(rename = "onsetRange")]
    Range(Range),
    #[serde(rename = "onsetString")]
    String(String),
}

/// `Condition.abatement[x]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Abatement {
    #[serde(rename = "abatementDateTime")]
    DateTime(String),
    #[serde(rename = "abatementAge")]
    Age(Quantity),
    #[serde(rename = "abatementPeriod")]
    Period(Period),
    #[serde(rename = "abatementRange")]
    Range(Range),
    #[serde(rename = "abatementString")]
    String(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default = "default_condition_type")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,
    #[serde(flatten)]
    pub onset: Option<Onset>,
    #[serde(flatten)]
    pub abatement: Option<Abatement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_date: Option<String>,
    /// Elements the profiles do not model, carried through unchanged.
    /// Declared after the `[x]` unions so their keys are claimed first.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl DomainResource for Condition {
    const RESOURCE_TYPE: &'static str = "Condition";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn identifiers(&self) -> &[Identifier] {
        &self.identifier
    }

    fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }
}

/// `Observation.effective[x]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effective {
    #[serde(rename = "effectiveDateTime")]
    DateTime(String),
    #[serde(rename = "effectivePeriod")]
    Period(Period),
    #[serde(rename = "effectiveInstant")]
    Instant(String),
}

/// `Observation.value[x]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObservationValue {
    #[serde(rename = "valueQuantity")]
    Quantity(Quantity),
    #[serde(rename = "valueCodeableConcept")]
    CodeableConcept(CodeableConcept),
    #[serde(rename = "valueString")]
    String(String),
    #[serde(rename = "valueBoolean")]
    Boolean(bool),
    #[serde(rename = "valueInteger")]
    Integer(i64),
    #[serde(rename = "valueRange")]
    Range(Range),
    #[serde(rename = "valuePeriod")]
    Period(Period),
    #[serde(rename = "valueDateTime")]
    DateTime(String),
    #[serde(rename = "valueTime")]
    Time(String),
}

impl ObservationValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Quantity(_) => "Quantity",
            Self::CodeableConcept(_) => "CodeableConcept",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Range(_) => "Range",
            Self::Period(_) => "Period",
            Self::DateTime(_) => "dateTime",
            Self::Time(_) => "time",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(default = "default_observation_type")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,
    #[serde(flatten)]
    pub effective: Option<Effective>,
    #[serde(flatten)]
    pub value: Option<ObservationValue>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Observation {
    pub fn has_category(&self, system: &str, code: &str) -> bool {
        self.category.iter().any(|c| c.has_coding(system, code))
    }
}

impl DomainResource for Observation {
    const RESOURCE_TYPE: &'static str = "Observation";

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn identifiers(&self) -> &[Identifier] {
        &self.identifier
    }

    fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_patient() {
        let patient: Patient = serde_json::from_value(json!({
            "resourceType": "Patient",
            "id": "123",
            "name": [{"family": "Doe", "given": ["Jane"]}],
            "telecom": [{"system": "phone", "value": "8675309"}],
            "birthDate": "1990-01-01"
        }))
        .unwrap();

        assert_eq!(patient.id(), Some("123"));
        assert_eq!(patient.telecom.len(), 1);
        assert_eq!(patient.birth_date.as_deref(), Some("1990-01-01"));
    }

    #[test]
    fn test_condition_choice_types() {
        let condition: Condition = serde_json::from_value(json!({
            "resourceType": "Condition",
            "onsetDateTime": "2020-01-01",
            "abatementAge": {"value": 42.0, "unit": "a"}
        }))
        .unwrap();

        assert_eq!(condition.onset, Some(Onset::DateTime("2020-01-01".to_string())));
        assert!(matches!(condition.abatement, Some(Abatement::Age(_))));

        let back = serde_json::to_value(&condition).unwrap();
        assert_eq!(back["onsetDateTime"], "2020-01-01");
        assert_eq!(back["abatementAge"]["value"], 42.0);
    }

    #[test]
    fn test_choice_keys_stay_out_of_other() {
        let condition: Condition = serde_json::from_value(json!({
            "resourceType": "Condition",
            "onsetDateTime": "2020-01-01",
            "abatementString": "resolved in spring",
            "note": [{"text": "follow up"}],
            "recorder": {"reference": "Practitioner/p1"}
        }))
        .unwrap();

        assert!(condition.onset.is_some());
        assert!(condition.abatement.is_some());
        let mut keys: Vec<_> = condition.other.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["note", "recorder"]);

        let text = serde_json::to_string(&condition).unwrap();
        assert_eq!(text.matches("\"onsetDateTime\"").count(), 1);
        assert_eq!(text.matches("\"abatementString\"").count(), 1);

        let observation: Observation = serde_json::from_value(json!({
            "resourceType": "Observation",
            "effectiveDateTime": "2020-01-01",
            "valueQuantity": {"value": 72.0},
            "component": [{"code": {"text": "systolic"}}]
        }))
        .unwrap();
        assert_eq!(observation.other.len(), 1);
        assert!(observation.other.contains_key("component"));
    }

    #[test]
    fn test_observation_without_value() {
        let observation: Observation = serde_json::from_value(json!({
            "resourceType": "Observation",
            "status": "final",
            "effectivePeriod": {"start": "2020-01-01"}
        }))
        .unwrap();

        assert!(observation.value.is_none());
        assert!(matches!(observation.effective, Some(Effective::Period(_))));
    }

    #[test]
    fn test_observation_value_quantity() {
        let observation: Observation = serde_json::from_value(json!({
            "resourceType": "Observation",
            "valueQuantity": {"value": 72.0, "unit": "/min"}
        }))
        .unwrap();

        assert_eq!(observation.value.as_ref().map(|v| v.type_name()), Some("Quantity"));
    }
}

//! Tenant-scoped identifier namespacing.
//!
//! `localize` prefixes a value with `{tenant}-`; it is deliberately not
//! idempotent, so a transform must localize each value exactly once.
//! [`ensure_localized`] is the idempotent variant for regenerating sample data.

use crate::model::{Identifier, Reference, ronin::system};
use crate::tenant::Tenant;
use serde_json::{Map, Value};

pub fn localize(id: &str, tenant: &Tenant) -> String {
    format!("{}-{}", tenant.mnemonic(), id)
}

/// Strips exactly one `{tenant}-` prefix; values without it are returned unchanged.
pub fn unlocalize(id: &str, tenant: &Tenant) -> String {
    id.strip_prefix(tenant.mnemonic())
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(id)
        .to_string()
}

pub fn is_localized(id: &str, tenant: &Tenant) -> bool {
    id.strip_prefix(tenant.mnemonic())
        .is_some_and(|rest| rest.starts_with('-'))
}

/// Localizes `id` unless it already carries the tenant prefix.
pub fn ensure_localized(id: &str, tenant: &Tenant) -> String {
    if is_localized(id, tenant) {
        id.to_string()
    } else {
        localize(id, tenant)
    }
}

/// Localizes the id segment of a relative `Type/id` reference. Contained
/// (`#id`), absolute and malformed references are returned unchanged.
pub fn localize_reference_string(reference: &str, tenant: &Tenant) -> String {
    if reference.starts_with('#') || reference.contains("://") {
        return reference.to_string();
    }

    match reference.split_once('/') {
        Some((resource_type, id)) if !resource_type.is_empty() && !id.is_empty() => {
            match id.split_once("/_history/") {
                Some((id, version)) => format!(
                    "{}/{}/_history/{}",
                    resource_type,
                    localize(id, tenant),
                    version
                ),
                None => format!("{}/{}", resource_type, localize(id, tenant)),
            }
        }
        _ => reference.to_string(),
    }
}

/// Elements carrying identifiers or references that need tenant namespacing.
pub trait Localizable {
    fn localize(&self, tenant: &Tenant) -> Self;
}

impl Localizable for Reference {
    fn localize(&self, tenant: &Tenant) -> Self {
        Reference {
            reference: self
                .reference
                .as_deref()
                .map(|r| localize_reference_string(r, tenant)),
            ..self.clone()
        }
    }
}

impl<T: Localizable> Localizable for Option<T> {
    fn localize(&self, tenant: &Tenant) -> Self {
        self.as_ref().map(|v| v.localize(tenant))
    }
}

impl<T: Localizable> Localizable for Vec<T> {
    fn localize(&self, tenant: &Tenant) -> Self {
        self.iter().map(|v| v.localize(tenant)).collect()
    }
}

/// Localizes every nested `reference` string in elements the typed model does not declare.
impl Localizable for Map<String, Value> {
    fn localize(&self, tenant: &Tenant) -> Self {
        self.iter()
            .map(|(key, value)| (key.clone(), localize_value(key, value, tenant)))
            .collect()
    }
}

fn localize_value(key: &str, value: &Value, tenant: &Tenant) -> Value {
    match value {
        Value::String(reference) if key == "reference" => {
            Value::String(localize_reference_string(reference, tenant))
        }
        Value::Object(map) => Value::Object(map.localize(tenant)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| localize_value(key, item, tenant))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// The identifiers every canonical resource carries: tenant, source FHIR id
/// and data authority.
pub fn ronin_identifiers(source_id: Option<&str>, tenant: &Tenant) -> Vec<Identifier> {
    let mut identifiers = vec![Identifier::new(system::TENANT, tenant.mnemonic())];
    if let Some(id) = source_id {
        identifiers.push(Identifier::new(system::FHIR_ID, id));
    }
    identifiers.push(Identifier::new(
        system::DATA_AUTHORITY,
        crate::model::ronin::DATA_AUTHORITY_VALUE,
    ));
    identifiers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let tenant = Tenant::new("test");
        for id in ["12345", "test-12345", "a-b-c", "eFs2zvgmbGfQ"] {
            assert_eq!(unlocalize(&localize(id, &tenant), &tenant), id);
        }
    }

    #[test]
    fn test_localize_twice_double_prefixes() {
        let tenant = Tenant::new("test");
        let once = localize("123", &tenant);
        assert_eq!(once, "test-123");
        assert_eq!(localize(&once, &tenant), "test-test-123");
    }

    #[test]
    fn test_ensure_localized_is_idempotent() {
        let tenant = Tenant::new("test");
        assert_eq!(ensure_localized("123", &tenant), "test-123");
        assert_eq!(ensure_localized("test-123", &tenant), "test-123");
        // Shares the mnemonic but not the separator.
        assert_eq!(ensure_localized("testing", &tenant), "test-testing");
    }

    #[test]
    fn test_unlocalize_other_tenant_unchanged() {
        let tenant = Tenant::new("test");
        assert_eq!(unlocalize("other-123", &tenant), "other-123");
    }

    #[test]
    fn test_reference_localization() {
        let tenant = Tenant::new("test");
        assert_eq!(localize_reference_string("Patient/123", &tenant), "Patient/test-123");
        assert_eq!(
            localize_reference_string("Patient/123/_history/2", &tenant),
            "Patient/test-123/_history/2"
        );
        assert_eq!(localize_reference_string("#contained", &tenant), "#contained");
        assert_eq!(
            localize_reference_string("http://example.com/fhir/Patient/123", &tenant),
            "http://example.com/fhir/Patient/123"
        );
        assert_eq!(localize_reference_string("Patient", &tenant), "Patient");
    }

    #[test]
    fn test_localizable_collections() {
        let tenant = Tenant::new("test");
        let references = vec![Reference::new("Practitioner/1"), Reference::new("Practitioner/2")];
        let localized = references.localize(&tenant);
        assert_eq!(localized[1].reference.as_deref(), Some("Practitioner/test-2"));

        let none: Option<Reference> = None;
        assert_eq!(none.localize(&tenant), None);
    }

    #[test]
    fn test_localize_untyped_elements() {
        let tenant = Tenant::new("test");
        let Value::Object(elements) = serde_json::json!({
            "performer": [{"reference": "Practitioner/p1"}, {"display": "Nurse"}],
            "hasMember": [{"reference": "#contained"}],
            "note": [{"text": "reference Patient/p1"}],
            "reference": "Device/d1"
        }) else {
            unreachable!()
        };

        let localized = elements.localize(&tenant);
        assert_eq!(localized["performer"][0]["reference"], "Practitioner/test-p1");
        assert_eq!(localized["performer"][1]["display"], "Nurse");
        assert_eq!(localized["hasMember"][0]["reference"], "#contained");
        assert_eq!(localized["note"][0]["text"], "reference Patient/p1");
        assert_eq!(localized["reference"], "Device/test-d1");
    }

    #[test]
    fn test_ronin_identifiers() {
        let identifiers = ronin_identifiers(Some("123"), &Tenant::new("test"));
        assert_eq!(identifiers.len(), 3);
        assert_eq!(identifiers[0].value.as_deref(), Some("test"));
        assert_eq!(identifiers[1].value.as_deref(), Some("123"));
    }
}

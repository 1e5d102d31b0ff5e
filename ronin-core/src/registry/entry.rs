use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use super::lookup::LookupTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    ConceptMap,
    ValueSet,
}

impl RegistryKind {
    fn from_entry_type(entry_type: &str) -> Option<Self> {
        match entry_type {
            "concept_map" => Some(RegistryKind::ConceptMap),
            "value_set" => Some(RegistryKind::ValueSet),
            _ => None,
        }
    }
}

/// One mapping or value set from the registry, with its applicability and
/// (once fetched) its squashed lookup table.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub id: String,
    pub data_element: String,
    pub kind: RegistryKind,
    pub version: String,
    pub filename: String,
    pub name: Option<String>,
    /// `None` applies to every tenant.
    pub tenant_id: Option<String>,
    /// `None` applies regardless of profile.
    pub profile_url: Option<String>,
    pub source_extension_url: Option<String>,
    pub lookup: Option<Arc<LookupTable>>,
}

impl RegistryEntry {
    /// Universal entries apply to every tenant; a `None` tenant matches only universal entries.
    pub fn applies_to_tenant(&self, tenant: Option<&str>) -> bool {
        match &self.tenant_id {
            None => true,
            Some(owner) => Some(owner.as_str()) == tenant,
        }
    }

    pub fn applies_to_profile(&self, profile_url: Option<&str>) -> bool {
        match &self.profile_url {
            None => true,
            Some(url) => Some(url.as_str()) == profile_url,
        }
    }

    pub fn matches(
        &self,
        tenant: Option<&str>,
        data_element: &str,
        kind: RegistryKind,
        profile_url: Option<&str>,
    ) -> bool {
        self.kind == kind
            && self.data_element == data_element
            && self.applies_to_tenant(tenant)
            && self.applies_to_profile(profile_url)
    }

    /// Selection rank: tenant-specific beats universal, then profile-scoped beats profile-agnostic.
    pub fn specificity(&self) -> (bool, bool) {
        (self.tenant_id.is_some(), self.profile_url.is_some())
    }
}

/// A row of the registry index document.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryIndexRow {
    pub registry_uuid: String,
    pub data_element: String,
    pub filename: String,
    pub registry_entry_type: String,
    #[serde(deserialize_with = "string_or_number")]
    pub version: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub source_extension_url: Option<String>,
    #[serde(default)]
    pub concept_map_name: Option<String>,
    #[serde(default)]
    pub value_set_name: Option<String>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Version {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Version::deserialize(deserializer)? {
        Version::Text(s) => s,
        Version::Number(n) => n.to_string(),
    })
}

impl RegistryIndexRow {
    fn into_entry(self) -> Option<RegistryEntry> {
        let Some(kind) = RegistryKind::from_entry_type(&self.registry_entry_type) else {
            tracing::warn!(
                registry_uuid = %self.registry_uuid,
                entry_type = %self.registry_entry_type,
                "Skipping registry row with unknown entry type"
            );
            return None;
        };

        let name = match kind {
            RegistryKind::ConceptMap => self.concept_map_name,
            RegistryKind::ValueSet => self.value_set_name,
        };

        Some(RegistryEntry {
            id: self.registry_uuid,
            data_element: self.data_element,
            kind,
            version: self.version,
            filename: self.filename,
            name,
            tenant_id: self.tenant_id.filter(|t| !t.is_empty()),
            profile_url: self.profile_url.filter(|p| !p.is_empty()),
            source_extension_url: self.source_extension_url.filter(|u| !u.is_empty()),
            lookup: None,
        })
    }
}

/// Parses the registry index into entries without lookup payloads.
pub fn parse_index(bytes: &[u8]) -> Result<Vec<RegistryEntry>, serde_json::Error> {
    let rows: Vec<RegistryIndexRow> = serde_json::from_slice(bytes)?;
    Ok(rows.into_iter().filter_map(RegistryIndexRow::into_entry).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_index() {
        let index = json!([
            {
                "registry_uuid": "1",
                "data_element": "Patient.telecom.system",
                "filename": "maps/telecom-system.json",
                "registry_entry_type": "concept_map",
                "version": 3,
                "tenant_id": "test",
                "source_extension_url": "http://example.com/ext",
                "concept_map_name": "TelecomSystem"
            },
            {
                "registry_uuid": "2",
                "data_element": "Observation.code",
                "filename": "sets/vitals.json",
                "registry_entry_type": "value_set",
                "version": "1",
                "profile_url": "",
                "value_set_name": "Vitals"
            },
            {
                "registry_uuid": "3",
                "data_element": "Observation.code",
                "filename": "x.json",
                "registry_entry_type": "structure_definition",
                "version": "1"
            }
        ]);

        let entries = parse_index(index.to_string().as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].kind, RegistryKind::ConceptMap);
        assert_eq!(entries[0].version, "3");
        assert_eq!(entries[0].tenant_id.as_deref(), Some("test"));
        assert_eq!(entries[0].name.as_deref(), Some("TelecomSystem"));

        assert_eq!(entries[1].kind, RegistryKind::ValueSet);
        assert_eq!(entries[1].profile_url, None);
        assert!(entries[1].lookup.is_none());
    }

    #[test]
    fn test_applicability() {
        let mut entry = parse_index(
            json!([{
                "registry_uuid": "1",
                "data_element": "Patient.telecom.system",
                "filename": "a.json",
                "registry_entry_type": "concept_map",
                "version": "1"
            }])
            .to_string()
            .as_bytes(),
        )
        .unwrap()
        .remove(0);

        assert!(entry.applies_to_tenant(Some("test")));
        assert!(entry.applies_to_tenant(None));

        entry.tenant_id = Some("test".to_string());
        assert!(entry.applies_to_tenant(Some("test")));
        assert!(!entry.applies_to_tenant(Some("other")));
        assert!(!entry.applies_to_tenant(None));

        entry.profile_url = Some("http://example.com/profile".to_string());
        assert!(entry.matches(
            Some("test"),
            "Patient.telecom.system",
            RegistryKind::ConceptMap,
            Some("http://example.com/profile")
        ));
        assert!(!entry.matches(Some("test"), "Patient.telecom.system", RegistryKind::ConceptMap, None));
        assert_eq!(entry.specificity(), (true, true));
    }
}

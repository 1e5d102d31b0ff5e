//! Flat lookup tables squashed from ConceptMap and ValueSet documents.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::code_system::CodeSystemAliases;
use super::entry::RegistryKind;
use super::source::DocumentSource;
use crate::model::Coding;

/// Lookup key: a source code under its tenant-agnostic code system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub code: String,
    pub system: String,
}

impl SourceKey {
    pub fn new(code: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            system: system.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetValue {
    pub code: String,
    pub system: String,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl TargetValue {
    pub fn to_coding(&self) -> Coding {
        Coding {
            system: Some(self.system.clone()),
            version: self.version.clone(),
            code: Some(self.code.clone()),
            display: Some(self.display.clone()),
            user_selected: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupTable {
    ConceptMap(HashMap<SourceKey, TargetValue>),
    ValueSet(Vec<TargetValue>),
}

impl LookupTable {
    pub fn empty(kind: RegistryKind) -> Self {
        match kind {
            RegistryKind::ConceptMap => LookupTable::ConceptMap(HashMap::new()),
            RegistryKind::ValueSet => LookupTable::ValueSet(Vec::new()),
        }
    }

    /// Fetches and squashes `filename`. Fetch and parse failures are logged
    /// and produce an empty table.
    pub fn load(
        source: &dyn DocumentSource,
        filename: &str,
        kind: RegistryKind,
        aliases: &CodeSystemAliases,
    ) -> Self {
        let Some(bytes) = source.fetch(filename) else {
            tracing::warn!(filename, ?kind, "Registry document unavailable, using empty table");
            return Self::empty(kind);
        };

        let squashed = match kind {
            RegistryKind::ConceptMap => {
                squash_concept_map(&bytes, aliases).map(LookupTable::ConceptMap)
            }
            RegistryKind::ValueSet => squash_value_set(&bytes).map(LookupTable::ValueSet),
        };

        match squashed {
            Ok(table) => {
                tracing::debug!(filename, ?kind, size = table.len(), "Squashed registry document");
                table
            }
            Err(e) => {
                tracing::warn!(filename, ?kind, error = %e, "Failed to parse registry document, using empty table");
                Self::empty(kind)
            }
        }
    }

    pub fn kind(&self) -> RegistryKind {
        match self {
            LookupTable::ConceptMap(_) => RegistryKind::ConceptMap,
            LookupTable::ValueSet(_) => RegistryKind::ValueSet,
        }
    }

    /// Concept map target for `key`. Always `None` for value sets.
    pub fn get(&self, key: &SourceKey) -> Option<&TargetValue> {
        match self {
            LookupTable::ConceptMap(map) => map.get(key),
            LookupTable::ValueSet(_) => None,
        }
    }

    /// Value set members. Always `None` for concept maps.
    pub fn values(&self) -> Option<&[TargetValue]> {
        match self {
            LookupTable::ConceptMap(_) => None,
            LookupTable::ValueSet(values) => Some(values),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LookupTable::ConceptMap(map) => map.len(),
            LookupTable::ValueSet(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConceptMapDocument {
    #[serde(default)]
    group: Vec<ConceptMapGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConceptMapGroup {
    source: Option<String>,
    target: Option<String>,
    target_version: Option<String>,
    #[serde(default)]
    element: Vec<ConceptMapElement>,
}

#[derive(Debug, Deserialize)]
struct ConceptMapElement {
    code: Option<String>,
    #[serde(default)]
    target: Vec<ConceptMapTarget>,
}

#[derive(Debug, Deserialize)]
struct ConceptMapTarget {
    code: Option<String>,
    display: Option<String>,
}

/// Squashes ConceptMap groups into `SourceKey -> TargetValue`.
///
/// Only the first target of each element is kept. Elements missing a source
/// or target system, code or target display are skipped.
pub fn squash_concept_map(
    bytes: &[u8],
    aliases: &CodeSystemAliases,
) -> Result<HashMap<SourceKey, TargetValue>, serde_json::Error> {
    let document: ConceptMapDocument = serde_json::from_slice(bytes)?;
    let mut table = HashMap::new();

    for group in document.group {
        let (Some(source_system), Some(target_system)) = (group.source, group.target) else {
            continue;
        };
        let source_system = aliases.canonicalize(&source_system);

        for element in group.element {
            let Some(source_code) = element.code else {
                continue;
            };
            if element.target.len() > 1 {
                tracing::warn!(
                    source_code = %source_code,
                    source_system = %source_system,
                    targets = element.target.len(),
                    "ConceptMap element has multiple targets, only the first is used"
                );
            }
            let Some(ConceptMapTarget {
                code: Some(code),
                display: Some(display),
            }) = element.target.into_iter().next()
            else {
                continue;
            };

            table.insert(
                SourceKey::new(source_code, source_system.clone()),
                TargetValue {
                    code,
                    system: target_system.clone(),
                    display,
                    version: group.target_version.clone(),
                },
            );
        }
    }

    Ok(table)
}

#[derive(Debug, Deserialize)]
struct ValueSetDocument {
    expansion: Option<ValueSetExpansion>,
}

#[derive(Debug, Deserialize)]
struct ValueSetExpansion {
    #[serde(default)]
    contains: Vec<ValueSetContains>,
}

#[derive(Debug, Deserialize)]
struct ValueSetContains {
    system: Option<String>,
    version: Option<String>,
    code: Option<String>,
    display: Option<String>,
}

/// Flattens `expansion.contains`, dropping entries missing system, version, code or display.
pub fn squash_value_set(bytes: &[u8]) -> Result<Vec<TargetValue>, serde_json::Error> {
    let document: ValueSetDocument = serde_json::from_slice(bytes)?;

    Ok(document
        .expansion
        .map(|e| e.contains)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| match c {
            ValueSetContains {
                system: Some(system),
                version: Some(version),
                code: Some(code),
                display: Some(display),
            } => Some(TargetValue {
                code,
                system,
                display,
                version: Some(version),
            }),
            _ => None,
        })
        .collect())
}

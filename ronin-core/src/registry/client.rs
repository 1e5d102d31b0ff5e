use serde::Serialize;
use std::sync::Arc;

use super::cache::RegistryCache;
use super::entry::{RegistryEntry, RegistryKind};
use super::lookup::SourceKey;
use crate::model::{CodedEnum, Coding, Extension, ExtensionValue};
use crate::tenant::Tenant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingMetadata {
    pub registry_entry_id: String,
    pub data_element: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&RegistryEntry> for MappingMetadata {
    fn from(entry: &RegistryEntry) -> Self {
        Self {
            registry_entry_id: entry.id.clone(),
            data_element: entry.data_element.clone(),
            version: entry.version.clone(),
            name: entry.name.clone(),
        }
    }
}

/// A resolved mapping. `extension` always carries the original source coding.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingResult {
    pub coding: Coding,
    pub extension: Extension,
    pub metadata: Vec<MappingMetadata>,
}

/// Resolves codes and value sets against the registry cache with
/// tenant → universal fallback and profile scoping.
#[derive(Clone)]
pub struct RegistryClient {
    cache: Arc<RegistryCache>,
}

impl RegistryClient {
    pub fn new(cache: Arc<RegistryCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<RegistryCache> {
        &self.cache
    }

    /// Maps `coding` through the concept map registered for `data_element`.
    ///
    /// `None` when the coding lacks a code or system, no concept map applies,
    /// or the concept map has no target for the code.
    pub fn resolve_concept_mapping(
        &self,
        tenant: &Tenant,
        data_element: &str,
        coding: &Coding,
        profile_url: Option<&str>,
    ) -> Option<MappingResult> {
        let (Some(code), Some(system)) = (coding.code.as_deref(), coding.system.as_deref()) else {
            return None;
        };

        let generation = self.cache.generation_for(Some(tenant.mnemonic()));
        let Some(entry) = select_entry(
            &generation.entries,
            Some(tenant.mnemonic()),
            data_element,
            RegistryKind::ConceptMap,
            profile_url,
        ) else {
            tracing::debug!(tenant = %tenant, data_element, "No concept map registered");
            return None;
        };

        let key = SourceKey::new(code, self.cache.aliases().canonicalize(system));
        let target = entry.lookup.as_deref().and_then(|table| table.get(&key));
        let (Some(target), Some(extension_url)) = (target, entry.source_extension_url.as_deref())
        else {
            tracing::debug!(
                tenant = %tenant,
                data_element,
                entry_id = %entry.id,
                code,
                system = %key.system,
                "Concept map has no target for source code"
            );
            return None;
        };

        Some(MappingResult {
            coding: target.to_coding(),
            extension: Extension::new(extension_url, ExtensionValue::Coding(coding.clone())),
            metadata: vec![MappingMetadata::from(entry)],
        })
    }

    /// Like [`resolve_concept_mapping`](Self::resolve_concept_mapping), but a
    /// code that is already a member of `E` resolves to itself when the
    /// registry has no target for it.
    pub fn resolve_concept_mapping_for_enum<E: CodedEnum>(
        &self,
        tenant: &Tenant,
        data_element: &str,
        coding: &Coding,
        source_extension_url: &str,
        profile_url: Option<&str>,
    ) -> Option<MappingResult> {
        if let Some(result) = self.resolve_concept_mapping(tenant, data_element, coding, profile_url)
        {
            return Some(result);
        }

        let code = coding.code.as_deref()?;
        if !E::is_member(code) {
            return None;
        }

        Some(MappingResult {
            coding: coding.clone(),
            extension: Extension::new(
                source_extension_url,
                ExtensionValue::Coding(coding.clone()),
            ),
            metadata: Vec::new(),
        })
    }

    /// Members of the value set registered for `data_element`. A `None` tenant
    /// resolves universal entries only.
    pub fn resolve_value_set(
        &self,
        tenant: Option<&Tenant>,
        data_element: &str,
        profile_url: Option<&str>,
    ) -> Option<Vec<Coding>> {
        let tenant = tenant.map(Tenant::mnemonic);
        let generation = self.cache.generation_for(tenant);
        let entry = select_entry(
            &generation.entries,
            tenant,
            data_element,
            RegistryKind::ValueSet,
            profile_url,
        )?;

        let values = entry.lookup.as_deref()?.values()?;
        Some(values.iter().map(|v| v.to_coding()).collect())
    }
}

/// Most specific matching entry; ties resolve to index order.
fn select_entry<'a>(
    entries: &'a [RegistryEntry],
    tenant: Option<&str>,
    data_element: &str,
    kind: RegistryKind,
    profile_url: Option<&str>,
) -> Option<&'a RegistryEntry> {
    entries
        .iter()
        .rev()
        .filter(|e| e.matches(tenant, data_element, kind, profile_url))
        .max_by_key(|e| e.specificity())
}

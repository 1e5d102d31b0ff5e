//! Process-wide registry cache
//!
//! The current [`CacheGeneration`] is an immutable snapshot behind an
//! `ArcSwap`. Readers load it without locking. A reload builds a complete new
//! generation off to the side and publishes it with a single store, so no
//! reader ever sees a half-built registry. Reloads are serialised by a mutex;
//! a tenant whose stamp is fresh never touches it.

use arc_swap::ArcSwap;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use super::code_system::CodeSystemAliases;
use super::entry::{parse_index, RegistryEntry, RegistryKind};
use super::lookup::LookupTable;
use super::source::DocumentSource;

pub const DEFAULT_INDEX_FILENAME: &str = "DataNormalizationRegistry/v2/registry.json";
pub const DEFAULT_TTL_MINUTES: i64 = 120;

/// Stamp key used for reloads that are not on behalf of a tenant.
pub const UNIVERSAL_KEY: &str = "*";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub index_filename: String,
    pub ttl_minutes: i64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            index_filename: DEFAULT_INDEX_FILENAME.to_string(),
            ttl_minutes: DEFAULT_TTL_MINUTES,
        }
    }
}

impl RegistryConfig {
    pub fn ttl(&self) -> TimeDelta {
        TimeDelta::minutes(self.ttl_minutes)
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Immutable registry snapshot.
#[derive(Debug, Clone, Default)]
pub struct CacheGeneration {
    pub entries: Vec<RegistryEntry>,
    pub last_reloaded: HashMap<String, DateTime<Utc>>,
}

impl CacheGeneration {
    /// Due when the tenant was never reloaded or more than `ttl` has elapsed.
    pub fn is_due(&self, key: &str, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        match self.last_reloaded.get(key) {
            Some(stamp) => now - *stamp > ttl,
            None => true,
        }
    }

    pub fn entry(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryStatus {
    pub entries: usize,
    pub loaded_entries: usize,
    pub concept_maps: usize,
    pub value_sets: usize,
    pub last_reloaded: BTreeMap<String, DateTime<Utc>>,
}

pub struct RegistryCache {
    current: ArcSwap<CacheGeneration>,
    reload_lock: Mutex<()>,
    source: Arc<dyn DocumentSource>,
    aliases: CodeSystemAliases,
    clock: Arc<dyn Clock>,
    config: RegistryConfig,
}

impl RegistryCache {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        aliases: CodeSystemAliases,
        config: RegistryConfig,
    ) -> Self {
        Self {
            current: ArcSwap::from_pointee(CacheGeneration::default()),
            reload_lock: Mutex::new(()),
            source,
            aliases,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn aliases(&self) -> &CodeSystemAliases {
        &self.aliases
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Latest published snapshot. Never blocks.
    pub fn current_generation(&self) -> Arc<CacheGeneration> {
        self.current.load_full()
    }

    pub fn is_due(&self, tenant: Option<&str>) -> bool {
        self.current
            .load()
            .is_due(stamp_key(tenant), self.clock.now(), self.config.ttl())
    }

    /// Snapshot to serve `tenant` from, reloading first when its stamp has expired.
    pub fn generation_for(&self, tenant: Option<&str>) -> Arc<CacheGeneration> {
        let current = self.current.load_full();
        if !current.is_due(stamp_key(tenant), self.clock.now(), self.config.ttl()) {
            return current;
        }

        let _guard = self.reload_lock.lock().unwrap_or_else(|e| e.into_inner());
        // Another caller may have finished the reload while we waited.
        let current = self.current.load_full();
        if !current.is_due(stamp_key(tenant), self.clock.now(), self.config.ttl()) {
            return current;
        }
        self.publish(tenant, current)
    }

    /// Unconditional reload on behalf of `tenant`.
    pub fn reload(&self, tenant: Option<&str>) -> Arc<CacheGeneration> {
        let _guard = self.reload_lock.lock().unwrap_or_else(|e| e.into_inner());
        let current = self.current.load_full();
        self.publish(tenant, current)
    }

    pub fn status(&self) -> RegistryStatus {
        let generation = self.current.load();
        RegistryStatus {
            entries: generation.entries.len(),
            loaded_entries: generation
                .entries
                .iter()
                .filter(|e| e.lookup.is_some())
                .count(),
            concept_maps: generation
                .entries
                .iter()
                .filter(|e| e.kind == RegistryKind::ConceptMap)
                .count(),
            value_sets: generation
                .entries
                .iter()
                .filter(|e| e.kind == RegistryKind::ValueSet)
                .count(),
            last_reloaded: generation
                .last_reloaded
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }

    /// Must be called with `reload_lock` held.
    fn publish(&self, tenant: Option<&str>, current: Arc<CacheGeneration>) -> Arc<CacheGeneration> {
        match self.rebuild(tenant, &current) {
            Some(generation) => {
                let generation = Arc::new(generation);
                self.current.store(generation.clone());
                generation
            }
            None => current,
        }
    }

    fn rebuild(&self, tenant: Option<&str>, prior: &CacheGeneration) -> Option<CacheGeneration> {
        let key = stamp_key(tenant);
        tracing::info!(tenant = key, "Reloading normalization registry");

        let Some(bytes) = self.source.fetch(&self.config.index_filename) else {
            tracing::warn!(
                index = %self.config.index_filename,
                "Registry index unavailable, keeping current generation"
            );
            return None;
        };
        let metadata = match parse_index(&bytes) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(
                    index = %self.config.index_filename,
                    error = %e,
                    "Registry index could not be parsed, keeping current generation"
                );
                return None;
            }
        };

        let prior_by_id: HashMap<&str, &RegistryEntry> =
            prior.entries.iter().map(|e| (e.id.as_str(), e)).collect();
        let mut last_reloaded = prior.last_reloaded.clone();
        let (mut fetched, mut reused, mut deferred) = (0usize, 0usize, 0usize);

        let entries: Vec<RegistryEntry> = metadata
            .into_iter()
            .map(|mut entry| {
                let carried = prior_by_id
                    .get(entry.id.as_str())
                    .filter(|p| p.version == entry.version)
                    .and_then(|p| p.lookup.clone());

                match (entry.applies_to_tenant(tenant), carried) {
                    (_, Some(lookup)) => {
                        reused += 1;
                        tracing::debug!(entry_id = %entry.id, version = %entry.version, "Reusing lookup table");
                        entry.lookup = Some(lookup);
                    }
                    (true, None) => {
                        fetched += 1;
                        entry.lookup = Some(Arc::new(LookupTable::load(
                            self.source.as_ref(),
                            &entry.filename,
                            entry.kind,
                            &self.aliases,
                        )));
                    }
                    (false, None) => {
                        // Left for the owning tenant; clearing its stamp makes its next call reload.
                        deferred += 1;
                        if let Some(owner) = &entry.tenant_id {
                            last_reloaded.remove(owner);
                        }
                    }
                }
                entry
            })
            .collect();

        last_reloaded.insert(key.to_string(), self.clock.now());

        tracing::info!(
            tenant = key,
            entries = entries.len(),
            fetched,
            reused,
            deferred,
            "Normalization registry reloaded"
        );

        Some(CacheGeneration {
            entries,
            last_reloaded,
        })
    }
}

fn stamp_key(tenant: Option<&str>) -> &str {
    tenant.unwrap_or(UNIVERSAL_KEY)
}

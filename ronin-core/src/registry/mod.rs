//! Normalization registry
//!
//! The registry index lists every ConceptMap and ValueSet used to normalize
//! tenant data. Each entry is squashed into a flat [`LookupTable`] and held
//! in a process-wide [`RegistryCache`]; [`RegistryClient`] resolves codes
//! against it.

pub mod cache;
pub mod client;
pub mod code_system;
pub mod entry;
pub mod lookup;
pub mod source;

pub use cache::{CacheGeneration, Clock, RegistryCache, RegistryConfig, RegistryStatus, SystemClock};
pub use client::{MappingMetadata, MappingResult, RegistryClient};
pub use code_system::CodeSystemAliases;
pub use entry::{RegistryEntry, RegistryKind};
pub use lookup::{LookupTable, SourceKey, TargetValue};
pub use source::{DirectorySource, DocumentSource, MemorySource};

//! Registry document sources.
//!
//! The engine reads the registry index and every ConceptMap/ValueSet document
//! through [`DocumentSource`]. A missing or unreadable document is `None`;
//! sources never fail the caller.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

pub trait DocumentSource: Send + Sync {
    /// Raw bytes of `filename`, or `None` when it is absent or cannot be read.
    fn fetch(&self, filename: &str) -> Option<Vec<u8>>;
}

impl<T: DocumentSource + ?Sized> DocumentSource for Arc<T> {
    fn fetch(&self, filename: &str) -> Option<Vec<u8>> {
        (**self).fetch(filename)
    }
}

/// Documents stored as files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let relative = Path::new(filename);
        // Only plain relative paths; no `..`, no absolute paths.
        if relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            Some(self.root.join(relative))
        } else {
            None
        }
    }
}

impl DocumentSource for DirectorySource {
    fn fetch(&self, filename: &str) -> Option<Vec<u8>> {
        let Some(path) = self.resolve(filename) else {
            tracing::warn!(filename, "Rejected registry document path");
            return None;
        };

        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("Failed to read registry document {:?}: {}", path, e);
                None
            }
        }
    }
}

/// In-process document map.
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, filename: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        documents.insert(filename.into(), bytes.into());
    }

    pub fn insert_json(&self, filename: impl Into<String>, document: &serde_json::Value) {
        self.insert(filename, document.to_string());
    }

    pub fn remove(&self, filename: &str) -> Option<Vec<u8>> {
        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        documents.remove(filename)
    }
}

impl DocumentSource for MemorySource {
    fn fetch(&self, filename: &str) -> Option<Vec<u8>> {
        let documents = self.documents.read().unwrap_or_else(|e| e.into_inner());
        documents.get(filename).cloned()
    }
}

//! ReDB-backed registry document store
//!
//! Keys are registry filenames exactly as the index names them, e.g.
//! `DataNormalizationRegistry/v2/registry.json`. Values are raw document bytes.

use crate::error::{Result, StoreError};
use redb::{Database, TableDefinition};
use ronin_core::registry::DocumentSource;
use std::path::Path;

const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("registry_documents");

/// Registry documents persisted in a single redb file
pub struct RedbDocumentStore {
    db: Database,
}

#[allow(clippy::result_large_err)]
impl RedbDocumentStore {
    /// Open the store (create if not exists)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DOCUMENTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub fn get(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS)?;

        match table.get(filename)? {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    /// Insert or replace a document
    pub fn put(&self, filename: &str, data: &[u8]) -> Result<()> {
        check_key(filename)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(DOCUMENTS)?;
            table.insert(filename, data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn delete(&self, filename: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(DOCUMENTS)?;
            table.remove(filename)?.is_some()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Filenames starting with `prefix`, in key order
    pub fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS)?;

        let mut filenames = Vec::new();
        for entry in table.range::<&str>(prefix..)? {
            let (key, _) = entry?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            filenames.push(key.to_string());
        }

        Ok(filenames)
    }

    /// Copies every file under `root` into the store, keyed by its relative
    /// path with `/` separators. Returns the number of documents written.
    pub fn import_dir(&self, root: impl AsRef<Path>) -> Result<usize> {
        let root = root.as_ref();
        let mut pending = vec![root.to_path_buf()];
        let mut imported = 0;

        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                self.put(&key, &std::fs::read(&path)?)?;
                imported += 1;
            }
        }

        tracing::info!(root = %root.display(), imported, "Imported registry documents");
        Ok(imported)
    }
}

/// Keys are relative `/`-separated paths with no empty, `.` or `..` segments.
fn check_key(filename: &str) -> Result<()> {
    let valid = !filename.is_empty()
        && filename
            .split('/')
            .all(|segment| !matches!(segment, "" | "." | ".."));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(filename.to_string()))
    }
}

impl DocumentSource for RedbDocumentStore {
    fn fetch(&self, filename: &str) -> Option<Vec<u8>> {
        match self.get(filename) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(filename, error = %e, "Failed to read registry document");
                None
            }
        }
    }
}

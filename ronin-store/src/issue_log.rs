//! SQLite-based issue log
//!
//! One row per normalization attempt with the issues it raised. Kept in a
//! separate file so it can be rotated independently of the registry store.

use crate::error::Result;
use chrono::Utc;
use ronin_core::validation::Validation;
use rusqlite::{Connection, Row, params};
use serde::Serialize;
use std::path::Path;

/// A recorded normalization attempt
#[derive(Debug, Clone, Serialize)]
pub struct IssueLogEntry {
    pub id: i64,
    pub timestamp: String,
    pub tenant: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub accepted: bool,
    pub error_count: i64,
    pub warning_count: i64,
    pub issues: serde_json::Value,
}

impl IssueLogEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let issues: String = row.get(8)?;
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            tenant: row.get(2)?,
            resource_type: row.get(3)?,
            resource_id: row.get(4)?,
            accepted: row.get(5)?,
            error_count: row.get(6)?,
            warning_count: row.get(7)?,
            issues: serde_json::from_str(&issues).unwrap_or(serde_json::Value::Null),
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, timestamp, tenant, resource_type, resource_id, accepted, \
                              error_count, warning_count, issues FROM issue_log";

pub struct IssueLog {
    conn: Connection,
    max_entries: Option<usize>,
}

#[allow(clippy::result_large_err)]
impl IssueLog {
    /// Open the issue log (create if not exists)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let log = Self {
            conn,
            max_entries: None,
        };
        log.initialize()?;
        Ok(log)
    }

    /// Keep at most `max_entries` rows, dropping the oldest after each insert.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS issue_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                tenant TEXT NOT NULL,
                resource_type TEXT NOT NULL,
                resource_id TEXT,
                accepted INTEGER NOT NULL,
                error_count INTEGER NOT NULL,
                warning_count INTEGER NOT NULL,
                issues TEXT NOT NULL
            )
            "#,
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_issue_log_tenant ON issue_log(tenant, id)",
            [],
        )?;

        Ok(())
    }

    /// Record one normalization attempt. Returns the row id.
    pub fn record(
        &self,
        tenant: &str,
        resource_type: &str,
        resource_id: Option<&str>,
        accepted: bool,
        validation: &Validation,
    ) -> Result<i64> {
        let issues = serde_json::to_string(validation.issues())?;

        self.conn.execute(
            r#"
            INSERT INTO issue_log
            (timestamp, tenant, resource_type, resource_id, accepted,
             error_count, warning_count, issues)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                Utc::now().to_rfc3339(),
                tenant,
                resource_type,
                resource_id,
                accepted,
                validation.errors().count() as i64,
                validation.warnings().count() as i64,
                issues,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        if let Some(max_entries) = self.max_entries {
            self.prune(max_entries)?;
        }
        Ok(id)
    }

    /// Delete all but the newest `keep` entries. Returns the number removed.
    pub fn prune(&self, keep: usize) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM issue_log WHERE id <= (SELECT MAX(id) FROM issue_log) - ?1",
            params![keep as i64],
        )?;
        if removed > 0 {
            tracing::debug!(removed, keep, "Pruned issue log");
        }
        Ok(removed)
    }

    /// Most recent entries for `tenant`, newest first
    pub fn recent_for_tenant(&self, tenant: &str, limit: usize) -> Result<Vec<IssueLogEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE tenant = ?1 ORDER BY id DESC LIMIT ?2",
            SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![tenant, limit as i64], IssueLogEntry::from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Most recent entries across all tenants, newest first
    pub fn recent_entries(&self, limit: usize) -> Result<Vec<IssueLogEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY id DESC LIMIT ?1", SELECT_COLUMNS))?;

        let rows = stmt.query_map(params![limit as i64], IssueLogEntry::from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ronin_core::validation::issues;
    use ronin_core::validation::{IssueTemplate, LocationPath};

    fn rejected() -> Validation {
        let mut validation = Validation::new();
        validation.add(
            issues::concept_map_lookup("Patient.telecom.system", "xyz", "test"),
            &LocationPath::new("Patient").element("telecom", 0).field("system"),
        );
        validation.add(
            IssueTemplate::warning("RONIN_CNTCTPT_007", "removed"),
            &LocationPath::new("Patient").element("telecom", 1).field("value"),
        );
        validation
    }

    #[test]
    fn test_record_and_read_back() {
        let log = IssueLog::open(":memory:").unwrap();

        log.record("test", "Patient", Some("test-1"), false, &rejected()).unwrap();

        let entries = log.recent_entries(10).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.tenant, "test");
        assert!(!entry.accepted);
        assert_eq!(entry.error_count, 1);
        assert_eq!(entry.warning_count, 1);
        assert_eq!(entry.issues[0]["code"], issues::CONCEPT_MAP_LOOKUP);
        assert_eq!(entry.issues[0]["location"], "Patient.telecom[0].system");
    }

    #[test]
    fn test_recent_for_tenant() {
        let log = IssueLog::open(":memory:").unwrap();

        log.record("a", "Patient", Some("a-1"), true, &Validation::new()).unwrap();
        log.record("b", "Condition", None, false, &rejected()).unwrap();
        log.record("a", "Observation", Some("a-2"), true, &Validation::new()).unwrap();

        let entries = log.recent_for_tenant("a", 10).unwrap();
        assert_eq!(entries.len(), 2);
        // Most recent first
        assert_eq!(entries[0].resource_type, "Observation");
        assert_eq!(entries[1].resource_id.as_deref(), Some("a-1"));

        assert_eq!(log.recent_for_tenant("a", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_max_entries_drops_oldest() {
        let log = IssueLog::open(":memory:").unwrap().with_max_entries(3);

        for i in 0..5 {
            log.record("test", "Patient", Some(&format!("test-{i}")), true, &Validation::new())
                .unwrap();
        }

        let entries = log.recent_entries(10).unwrap();
        let ids: Vec<_> = entries.iter().filter_map(|e| e.resource_id.as_deref()).collect();
        assert_eq!(ids, vec!["test-4", "test-3", "test-2"]);
    }

    #[test]
    fn test_prune() {
        let log = IssueLog::open(":memory:").unwrap();
        for _ in 0..4 {
            log.record("a", "Patient", None, false, &rejected()).unwrap();
        }

        assert_eq!(log.prune(10).unwrap(), 0);
        assert_eq!(log.prune(1).unwrap(), 3);
        assert_eq!(log.recent_for_tenant("a", 10).unwrap().len(), 1);
        assert_eq!(log.prune(0).unwrap(), 1);
        assert!(log.recent_entries(10).unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.db");

        IssueLog::open(&path)
            .unwrap()
            .record("test", "Patient", None, true, &Validation::new())
            .unwrap();

        assert_eq!(IssueLog::open(&path).unwrap().recent_entries(5).unwrap().len(), 1);
    }
}

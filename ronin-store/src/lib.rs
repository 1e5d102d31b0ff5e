pub mod error;
pub mod issue_log;
pub mod redb_store;

pub use error::{Result, StoreError};
pub use issue_log::{IssueLog, IssueLogEntry};
pub use redb_store::RedbDocumentStore;

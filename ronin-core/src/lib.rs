pub mod error;
pub mod localization;
pub mod model;
pub mod normalizer;
pub mod operation_outcome;
pub mod profile;
pub mod registry;
pub mod tenant;
pub mod validation;

pub use error::{Result, RoninError};
pub use normalizer::{Normalized, ResourceNormalizer, SUPPORTED_RESOURCE_TYPES};
pub use operation_outcome::{IssueType, OperationOutcome, OperationOutcomeIssue, OutcomeSeverity};
pub use registry::{
    CodeSystemAliases, DirectorySource, DocumentSource, MemorySource, RegistryCache,
    RegistryClient, RegistryConfig, RegistryStatus,
};
pub use tenant::Tenant;
pub use validation::{Issue, IssueSeverity, LocationPath, Validation, ValidationFailure};

use thiserror::Error;

use crate::validation::ValidationFailure;

#[derive(Error, Debug)]
pub enum RoninError {
    #[error("Unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    #[error("Missing resourceType")]
    MissingResourceType,

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RoninError>;

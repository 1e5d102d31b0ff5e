use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only tenant context passed into every engine call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenant {
    pub mnemonic: String,
}

impl Tenant {
    pub fn new(mnemonic: impl Into<String>) -> Self {
        Self {
            mnemonic: mnemonic.into(),
        }
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mnemonic)
    }
}

use std::collections::HashMap;

use crate::model::ronin::system::CODE_SYSTEM_BASE;

/// Maps tenant specific code system URIs onto the tenant-agnostic URI used
/// as the lookup key.
///
/// Explicit aliases win. Otherwise a Ronin code system of the form
/// `{CODE_SYSTEM_BASE}/{tenant}/{name}` is rewritten to `{CODE_SYSTEM_BASE}/{name}`,
/// and any other URI is returned unchanged.
#[derive(Debug, Clone, Default)]
pub struct CodeSystemAliases {
    aliases: HashMap<String, String>,
}

impl CodeSystemAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    pub fn with_alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.insert(from, to);
        self
    }

    pub fn insert(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.aliases.insert(from.into(), to.into());
    }

    pub fn canonicalize(&self, system: &str) -> String {
        if let Some(canonical) = self.aliases.get(system) {
            return canonical.clone();
        }

        if let Some(rest) = system
            .strip_prefix(CODE_SYSTEM_BASE)
            .and_then(|r| r.strip_prefix('/'))
            && let Some((_tenant, name)) = rest.split_once('/')
            && !name.is_empty()
            && !name.contains('/')
        {
            return format!("{}/{}", CODE_SYSTEM_BASE, name);
        }

        system.to_string()
    }
}

use ronin_core::registry::{CodeSystemAliases, RegistryConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Server configuration loaded from YAML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSettings,
    pub registry: RegistrySettings,
    pub storage: StorageSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Where registry documents are read from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrySourceKind {
    /// Files below `registry.dir`
    #[default]
    Directory,
    /// The redb document store in the data directory
    Redb,
    /// An HTTP object store at `registry.base_url`
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub source: RegistrySourceKind,
    pub dir: PathBuf,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    /// Source code-system URL → canonical URL
    pub code_system_aliases: HashMap<String, String>,
    #[serde(flatten)]
    pub cache: RegistryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
    pub registry_db: String,
    pub issue_log_db: String,
    /// Rows kept in the issue log; 0 keeps everything
    pub issue_log_max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            source: RegistrySourceKind::Directory,
            dir: PathBuf::from("registry"),
            base_url: None,
            timeout_secs: 30,
            code_system_aliases: HashMap::new(),
            cache: RegistryConfig::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            registry_db: "registry.redb".to_string(),
            issue_log_db: "issues.sqlite".to_string(),
            issue_log_max_entries: 100_000,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = if let Some(path) = config_path {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(port) = var("RONIN_PORT")
            && let Ok(port_num) = port.parse()
        {
            self.server.port = port_num;
        }

        if let Some(host) = var("RONIN_HOST") {
            self.server.host = host;
        }

        if let Some(data_dir) = var("RONIN_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Some(url) = var("RONIN_REGISTRY_URL") {
            self.registry.source = RegistrySourceKind::Http;
            self.registry.base_url = Some(url);
        }
    }

    /// Get the full path to the registry document store
    pub fn registry_db_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.registry_db)
    }

    /// Get the full path to the issue log database
    pub fn issue_log_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.issue_log_db)
    }

    pub fn code_system_aliases(&self) -> CodeSystemAliases {
        CodeSystemAliases::from_map(self.registry.code_system_aliases.clone())
    }
}

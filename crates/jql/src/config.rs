//! Configuration file loading and parsing.
//!
//! Settings live in a `jql.toml` file. Every section and key is optional;
//! accessors fall back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::JqlError;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "JQL_CONFIG";

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "jql.toml";

/// Root configuration structure loaded from `jql.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JqlConfig {
    /// Suggestion behaviour (optional).
    pub autocomplete: Option<AutocompleteConfig>,
    /// Remote value lookup (optional).
    pub lookup: Option<LookupConfig>,
    /// Metadata document location (optional).
    pub metadata: Option<MetadataConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutocompleteConfig {
    /// Debounce before a lookup is issued, in milliseconds (default: 250).
    pub query_delay_ms: Option<u64>,
    /// Cap per suggestion group (default: 15).
    pub max_suggestions: Option<usize>,
}

impl AutocompleteConfig {
    pub fn query_delay(&self) -> Duration {
        Duration::from_millis(self.query_delay_ms.unwrap_or(250))
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions.unwrap_or(15)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupConfig {
    /// Value lookup endpoint. Without it values come from nowhere.
    pub url: Option<String>,
    /// Request timeout in milliseconds (default: 5000).
    pub timeout_ms: Option<u64>,
}

impl LookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(5000))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataConfig {
    /// Path of the metadata JSON document.
    pub path: Option<PathBuf>,
}

impl JqlConfig {
    /// Load configuration from an explicit file. A missing file is an error.
    pub fn from_file(path: &Path) -> Result<Self, JqlError> {
        let content = std::fs::read_to_string(path).map_err(|source| JqlError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| JqlError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration by priority:
    /// 1. `explicit` (a `--config` argument)
    /// 2. `$JQL_CONFIG`
    /// 3. `./jql.toml` when present
    /// 4. Defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self, JqlError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }
        Ok(Self::default())
    }

    pub fn autocomplete(&self) -> AutocompleteConfig {
        self.autocomplete.clone().unwrap_or_default()
    }

    pub fn lookup(&self) -> LookupConfig {
        self.lookup.clone().unwrap_or_default()
    }

    pub fn metadata_path(&self) -> Option<&Path> {
        self.metadata.as_ref()?.path.as_deref()
    }
}

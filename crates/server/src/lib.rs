//! JQL REST API Server Library
//!
//! Provides a web API over the `jql` parser and autocomplete engine, so
//! editors outside Rust can validate queries and fetch suggestions.

pub mod routes;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use jql::suggest::{AutoComplete, ConfiguredLookup};
use jql::{JqlConfig, JqlMetadata};

// Re-export for convenience
pub use routes::{create_routes, AppState};

/// Load configuration and metadata the way the `jql` CLI does and build the
/// shared session.
pub fn load_session(
    config_path: Option<&Path>,
    metadata_path: Option<&Path>,
) -> Result<AppState<ConfiguredLookup>> {
    let config = JqlConfig::discover(config_path).context("Failed to load configuration")?;
    let metadata =
        JqlMetadata::discover(metadata_path, &config).context("Failed to load metadata")?;
    let lookup = ConfiguredLookup::from_config(&config.lookup());
    let session = AutoComplete::new(metadata, lookup).with_config(&config.autocomplete());
    Ok(Arc::new(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_session_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let metadata = temp_dir.path().join("meta.json");
        std::fs::write(
            &metadata,
            r#"{"fields": [{"value": "status", "displayName": "Status", "searchable": "true"}],
                "reservedWords": ["and", "or"]}"#,
        )
        .unwrap();
        let config = temp_dir.path().join("jql.toml");
        std::fs::write(
            &config,
            format!("[metadata]\npath = {:?}\n", metadata.display().to_string()),
        )
        .unwrap();

        let session = load_session(Some(&config), None).unwrap();
        assert_eq!(session.metadata().fields.len(), 1);
        assert!(session.parser().is_reserved_word("and"));
    }

    #[test]
    fn test_missing_metadata_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("jql.toml");
        std::fs::write(&config, "").unwrap();

        let error = load_session(Some(&config), Some(&temp_dir.path().join("absent.json")))
            .err()
            .unwrap();
        assert!(format!("{:#}", error).contains("Failed to load metadata"));
    }
}

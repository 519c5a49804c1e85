//! Error types for the non-parse failures of the library.
//!
//! A query that does not parse is not an error in this sense; that is state
//! on [`ParseResult`](crate::result::ParseResult). These types cover loading
//! configuration and metadata, talking to the value lookup service, and
//! misuse of the completion API.

use std::path::PathBuf;

use thiserror::Error;

/// Failures loading configuration or metadata, or driving a session.
#[derive(Debug, Error)]
pub enum JqlError {
    /// A configuration or metadata file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML for the expected shape
    #[error("Failed to parse config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// The metadata document is not valid JSON for the expected shape
    #[error("Failed to parse metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    /// `complete` was called before any suggestion pass
    #[error("No suggestion pass has run; call suggest before complete")]
    NotParsed,
}

/// Failures of a remote value lookup. Never surfaced to the user; the
/// dispatcher logs them and shows no server values.
#[derive(Debug, Error, PartialEq)]
pub enum LookupError {
    #[error("Lookup request failed: {0}")]
    Transport(String),
    #[error("Lookup service answered with status {0}")]
    Status(u16),
    #[error("Lookup response could not be decoded: {0}")]
    Decode(String),
    /// The blocking request task was cancelled or panicked
    #[error("Lookup task did not complete: {0}")]
    Join(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_names_path() {
        let error = JqlError::Read {
            path: PathBuf::from("/tmp/jql.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let message = error.to_string();
        assert!(message.contains("/tmp/jql.toml"));
        assert!(message.contains("missing"));
    }

    #[test]
    fn test_lookup_error_messages() {
        assert_eq!(
            LookupError::Status(503).to_string(),
            "Lookup service answered with status 503"
        );
        assert_eq!(
            LookupError::Decode("eof".to_string()),
            LookupError::Decode("eof".to_string())
        );
    }
}

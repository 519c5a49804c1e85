//! Structured output formatting for the `jql` command line.
//!
//! Human-readable lines go through [`OutputContext`]; `--json` switches to a
//! single [`JsonOutput`] or [`JsonError`] document on stdout.

use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::io::{self, Write};

/// Version of the JSON output format
const OUTPUT_VERSION: &str = "0.1.0";

// ============================================================================
// Output Context for Quiet Mode
// ============================================================================

/// Context for controlling output verbosity
pub struct OutputContext {
    quiet: bool,
    json: bool,
}

impl OutputContext {
    pub fn new(quiet: bool, json: bool) -> Self {
        Self { quiet, json }
    }

    /// Print essential output (always shown unless --json)
    pub fn print_data(&self, msg: impl Display) -> io::Result<()> {
        if !self.json {
            writeln_safe(&format!("{}", msg))
        } else {
            Ok(())
        }
    }

    /// Print informational message (suppressed by --quiet or --json)
    pub fn print_info(&self, msg: impl Display) -> io::Result<()> {
        if !self.quiet && !self.json {
            writeln_safe(&format!("{}", msg))
        } else {
            Ok(())
        }
    }

    /// Print warning (suppressed by --quiet or --json)
    pub fn print_warning(&self, msg: impl Display) -> io::Result<()> {
        if !self.quiet && !self.json {
            writeln_safe_stderr(&format!("Warning: {}", msg))
        } else {
            Ok(())
        }
    }

    /// Print error (always shown to stderr)
    pub fn print_error(&self, msg: impl Display) -> io::Result<()> {
        writeln_safe_stderr(&format!("Error: {}", msg))
    }

    /// Print a JSON document (only in --json mode)
    pub fn print_json(&self, document: &str) -> io::Result<()> {
        if self.json {
            writeln_safe(document)
        } else {
            Ok(())
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Safe println that handles broken pipes gracefully
fn writeln_safe(msg: &str) -> io::Result<()> {
    match writeln!(io::stdout(), "{}", msg) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            // Piped into head and friends
            std::process::exit(0);
        }
        Err(e) => Err(e),
    }
}

fn writeln_safe_stderr(msg: &str) -> io::Result<()> {
    match writeln!(io::stderr(), "{}", msg) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            std::process::exit(0);
        }
        Err(e) => Err(e),
    }
}

// ============================================================================
// JSON Output Types
// ============================================================================

/// Wrapper for successful command output with metadata
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub metadata: Metadata,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(data: T, command: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            metadata: Metadata::new(command),
        }
    }

    /// Serialize to JSON string with pretty formatting
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Wrapper for error output with suggestions
#[derive(Debug, Serialize)]
pub struct JsonError {
    pub success: bool,
    pub error: ErrorDetail,
    pub metadata: Metadata,
}

impl JsonError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
                suggestions: Vec::new(),
            },
            metadata: Metadata::new(command),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.error.details = Some(details);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.error.suggestions.push(suggestion.into());
        self
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        ErrorCode::to_exit_code(&self.error.code)
    }

    /// The query does not parse.
    pub fn invalid_query(message: &str, error_index: Option<usize>, command: &str) -> Self {
        Self::new(ErrorCode::INVALID_QUERY, message, command)
            .with_details(serde_json::json!({ "errorIndex": error_index }))
            .with_suggestion("Run 'jql parse' with --caret to see what is expected there")
    }

    /// A caret or selection index lies outside the query.
    pub fn caret_out_of_range(caret: usize, len: usize, command: &str) -> Self {
        Self::new(
            ErrorCode::INVALID_ARGUMENT,
            format!("Caret {} is past the end of the query ({} characters)", caret, len),
            command,
        )
        .with_details(serde_json::json!({ "caret": caret, "length": len }))
    }
}

/// Error details including code, message, and suggestions
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code (e.g., "INVALID_QUERY")
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Suggested actions to resolve the error
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Output metadata. Versioned so scripts can detect format changes.
#[derive(Debug, Serialize)]
pub struct Metadata {
    pub version: String,
    pub command: String,
}

impl Metadata {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            version: OUTPUT_VERSION.to_string(),
            command: command.into(),
        }
    }
}

// ============================================================================
// Exit Codes
// ============================================================================

/// Standardized exit codes for the `jql` CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command succeeded (0)
    Success = 0,

    /// Generic error (1)
    GenericError = 1,

    /// Invalid arguments or usage error (2)
    InvalidArgument = 2,

    /// Config or metadata file not found (3)
    NotFound = 3,

    /// The query does not parse (4)
    ValidationFailed = 4,

    /// Lookup service or file system failed (10)
    ExternalError = 10,
}

impl ExitCode {
    /// Convert exit code to i32 for `std::process::exit`
    pub fn code(self) -> i32 {
        self as i32
    }
}

// ============================================================================
// Error Codes (String constants for JSON responses)
// ============================================================================

/// Standard error codes for JSON error documents
pub struct ErrorCode;

impl ErrorCode {
    pub const INVALID_QUERY: &'static str = "INVALID_QUERY";
    pub const INVALID_ARGUMENT: &'static str = "INVALID_ARGUMENT";

    /// Map error code string to exit code
    pub fn to_exit_code(code: &str) -> ExitCode {
        match code {
            Self::INVALID_QUERY => ExitCode::ValidationFailed,
            Self::INVALID_ARGUMENT => ExitCode::InvalidArgument,
            _ => ExitCode::GenericError,
        }
    }
}

//! JQL parsing and autocomplete.
//!
//! This library parses partial JQL queries as they are typed, works out what
//! may come next at the caret, and assembles suggestions from field and
//! function metadata plus a remote value lookup. It backs the `jql` command
//! line and the `jql-server` REST service.

pub mod cli;
pub mod config;
pub mod cursor;
pub mod errors;
pub mod grammar;
pub mod metadata;
pub mod operators;
pub mod output;
pub mod parser;
pub mod replace;
pub mod report;
pub mod result;
pub mod suggest;
pub mod text;

// Re-export commonly used types
pub use config::JqlConfig;
pub use errors::{JqlError, LookupError};
pub use metadata::{FieldDescriptor, FunctionDescriptor, JqlMetadata};
pub use output::{ExitCode, JsonError, JsonOutput};
pub use parser::{ParseOutcome, Parser};
pub use replace::{caret_position, CaretPosition, Completion, Selection};
pub use report::{ParseReport, Validity};
pub use result::{Expectation, ParseResult};
pub use suggest::{
    AutoComplete, ConfiguredLookup, HttpValueLookup, LookupRequest, StaticValueLookup,
    SuggestOutcome, Suggestion, Suggestions, ValueLookup,
};

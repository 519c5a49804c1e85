//! Command-line interface definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// JQL parser and autocomplete
///
/// Parses partial JQL queries, reports what may come next at the caret and
/// completes them from field, function and value metadata.
///
/// Exit Codes:
///   0  - Command succeeded
///   1  - Generic error occurred
///   2  - Invalid arguments or usage error
///   3  - Config or metadata file not found
///   4  - Query does not parse
///  10  - External dependency failed (lookup service, file system)
#[derive(Parser)]
#[command(name = "jql")]
#[command(about = "JQL parser and autocomplete", long_about = None)]
pub struct Cli {
    /// Suppress non-essential output (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: $JQL_CONFIG, then ./jql.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Field/function metadata document, overriding the config
    #[arg(long, global = true, value_name = "PATH")]
    pub metadata: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a query and report its state at the caret
    ///
    /// Validity and the error annotation describe the whole query; the
    /// expectation, last-seen values and tokens describe the text before
    /// the caret. Exits with 4 when the query does not parse.
    Parse {
        /// Query text
        query: String,

        /// Caret index in characters (default: end of query)
        #[arg(long)]
        caret: Option<usize>,
    },

    /// Suggest what may be typed at the caret
    Suggest {
        /// Query text
        query: String,

        /// Caret index in characters (default: end of query)
        #[arg(long)]
        caret: Option<usize>,
    },

    /// Apply a suggestion at the caret and print the new query
    Complete {
        /// Query text
        query: String,

        /// Value to insert
        #[arg(long)]
        value: String,

        /// Caret index in characters (default: end of query)
        #[arg(long)]
        caret: Option<usize>,

        /// End of a selection starting at the caret
        #[arg(long)]
        selection_end: Option<usize>,
    },
}

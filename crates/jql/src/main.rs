//! `jql`: parse, suggest and complete JQL queries from the command line.
//!
//! Field, function and reserved-word metadata come from a JSON document
//! (`--metadata`, or `[metadata] path` in `jql.toml`). Values come from the
//! configured lookup service, if any.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser as _;
use jql::cli::{Cli, Commands};
use jql::output::{ExitCode, JsonError, JsonOutput, OutputContext};
use jql::replace::{self, Selection};
use jql::suggest::{AutoComplete, ConfiguredLookup, SuggestOutcome, Suggestion};
use jql::text::char_len;
use jql::{JqlConfig, JqlMetadata, ParseReport};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Helper to determine exit code from error message
fn error_to_exit_code(error: &anyhow::Error) -> ExitCode {
    let error_msg = error.to_string().to_lowercase();

    for cause in error.chain() {
        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            return match io_error.kind() {
                std::io::ErrorKind::NotFound => ExitCode::NotFound,
                _ => ExitCode::ExternalError,
            };
        }
    }

    if error_msg.contains("not found") || error_msg.contains("no such file") {
        ExitCode::NotFound
    } else if error_msg.contains("failed to parse") || error_msg.contains("invalid") {
        ExitCode::InvalidArgument
    } else {
        ExitCode::GenericError
    }
}

fn main() {
    let exit_code = match run() {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            error_to_exit_code(&e)
        }
    };

    if exit_code != ExitCode::Success {
        std::process::exit(exit_code.code());
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Report a failure in the requested format and exit with its code.
fn fail(output: &OutputContext, error: JsonError) -> Result<()> {
    if output.is_json() {
        output.print_json(&error.to_json_string()?)?;
    } else {
        output.print_error(&error.error.message)?;
    }
    std::process::exit(error.exit_code().code());
}

/// Resolve an optional caret against the query, rejecting indices past the
/// end.
fn caret_in(
    output: &OutputContext,
    query: &str,
    caret: Option<usize>,
    command: &str,
) -> Result<usize> {
    let len = char_len(query);
    match caret {
        Some(caret) if caret > len => {
            fail(output, JsonError::caret_out_of_range(caret, len, command))?;
            Ok(len)
        }
        Some(caret) => Ok(caret),
        None => Ok(len),
    }
}

fn print_group(output: &OutputContext, title: &str, group: &[Suggestion]) -> Result<()> {
    if group.is_empty() {
        return Ok(());
    }
    output.print_info(format!("{}:", title))?;
    for suggestion in group {
        if suggestion.display_name == suggestion.value {
            output.print_data(&suggestion.value)?;
        } else {
            output.print_data(format!("{}\t{}", suggestion.value, suggestion.display_name))?;
        }
    }
    Ok(())
}

fn print_report(output: &OutputContext, report: &ParseReport) -> Result<()> {
    output.print_data(format!("valid: {}", report.valid))?;
    if let Some(message) = &report.message {
        output.print_data(format!("error: {}", message))?;
    }
    output.print_data(format!("expects: {:?}", report.expectation))?;

    let last = &report.last;
    let seen = [
        ("field", &last.field),
        ("operator", &last.operator),
        ("operand", &last.operand),
        ("logical operator", &last.logical_operator),
        ("predicate", &last.was_predicate),
        ("order by field", &last.order_by_field),
        ("order by direction", &last.order_by_direction),
    ];
    for (label, value) in seen {
        if let Some(value) = value {
            output.print_info(format!("{}: {}", label, value))?;
        }
    }

    let tokens: Vec<&str> = report
        .tokens
        .iter()
        .map(|token| token.as_deref().unwrap_or("<missing>"))
        .collect();
    output.print_info(format!("tokens: {}", tokens.join(" ")))?;
    output.print_info(format!(
        "caret: row {}, column {}",
        report.position.row, report.position.column
    ))?;
    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let output = OutputContext::new(cli.quiet, cli.json);

    let config =
        JqlConfig::discover(cli.config.as_deref()).context("Failed to load configuration")?;
    let metadata = JqlMetadata::discover(cli.metadata.as_deref(), &config)
        .context("Failed to load metadata")?;

    match cli.command {
        Commands::Parse { query, caret } => {
            let caret = caret_in(&output, &query, caret, "parse")?;
            let report = ParseReport::new(&metadata.parser(), &query, Some(caret));

            if output.is_json() {
                if !report.valid {
                    let message = report.message.as_deref().unwrap_or_default();
                    return fail(
                        &output,
                        JsonError::invalid_query(message, report.error_index, "parse"),
                    );
                }
                let json_output = JsonOutput::success(&report, "parse");
                output.print_json(&json_output.to_json_string()?)?;
            } else {
                print_report(&output, &report)?;
                if !report.valid {
                    std::process::exit(ExitCode::ValidationFailed.code());
                }
            }
        }
        Commands::Suggest { query, caret } => {
            let caret = caret_in(&output, &query, caret, "suggest")?;
            let lookup = ConfiguredLookup::from_config(&config.lookup());
            // A single pass has nothing to debounce.
            let session = AutoComplete::new(metadata, lookup)
                .with_config(&config.autocomplete())
                .with_query_delay(Duration::ZERO);

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?;
            let outcome = runtime.block_on(session.suggest(&query, caret));

            let suggestions = match outcome {
                SuggestOutcome::Show(suggestions) => Some(suggestions),
                SuggestOutcome::Hide | SuggestOutcome::Stale => None,
            };
            if output.is_json() {
                let data = json!({
                    "visible": suggestions.is_some(),
                    "suggestions": suggestions,
                });
                output.print_json(&JsonOutput::success(data, "suggest").to_json_string()?)?;
            } else if let Some(suggestions) = suggestions {
                print_group(&output, "operators", &suggestions.operators)?;
                print_group(&output, "values", &suggestions.values)?;
                print_group(&output, "functions", &suggestions.functions)?;
            }
        }
        Commands::Complete {
            query,
            value,
            caret,
            selection_end,
        } => {
            let caret = caret_in(&output, &query, caret, "complete")?;
            let end = caret_in(&output, &query, selection_end, "complete")?;
            let selection = match selection_end {
                Some(_) => Selection::new(caret, end),
                None => Selection::caret(caret),
            };

            let parser = metadata.parser();
            let before: String = query.chars().take(selection.start).collect();
            let outcome = parser.parse(&before);
            let completion = replace::complete(&parser, &outcome, &query, selection, &value);

            if output.is_json() {
                let json_output = JsonOutput::success(&completion, "complete");
                output.print_json(&json_output.to_json_string()?)?;
            } else {
                output.print_data(&completion.text)?;
                output.print_info(format!("caret: {}", completion.caret))?;
                if let Some(message) = &completion.message {
                    output.print_warning(format!("query does not parse: {}", message))?;
                }
            }
        }
    }

    Ok(())
}

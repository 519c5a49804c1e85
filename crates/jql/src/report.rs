//! Serializable views of a parse, shared by the CLI and the server.

use serde::Serialize;

use crate::parser::{ParseOutcome, Parser};
use crate::replace::{caret_position, CaretPosition};
use crate::result::{Expectation, ParseResult};
use crate::text::char_len;

/// The valid/invalid indicator for a whole query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validity {
    pub valid: bool,
    /// Caret annotation of the first error, e.g. `...s = Open ^AND`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Validity {
    pub fn of(outcome: &ParseOutcome) -> Self {
        Validity {
            valid: !outcome.has_error(),
            message: outcome.error_message().map(str::to_string),
        }
    }
}

/// Most recent value seen in each category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSeen {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub was_predicate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by_direction: Option<String>,
}

impl From<&ParseResult> for LastSeen {
    fn from(result: &ParseResult) -> Self {
        let owned = |value: Option<&str>| value.map(str::to_string);
        LastSeen {
            field: owned(result.last_field_name()),
            operator: owned(result.last_operator()),
            operand: owned(result.last_operand()),
            logical_operator: owned(result.last_logical_operator()),
            was_predicate: owned(result.last_was_predicate()),
            order_by_field: owned(result.last_order_by_field_name()),
            order_by_direction: owned(result.last_order_by_direction()),
        }
    }
}

/// Everything known about a query with the caret at a given index.
///
/// `valid`, `message` and `error_index` describe the whole text. The rest
/// comes from the text before the caret, which is what suggestions see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseReport {
    pub query: String,
    pub caret: usize,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_index: Option<usize>,
    pub expectation: Expectation,
    pub last: LastSeen,
    pub tokens: Vec<Option<String>>,
    pub position: CaretPosition,
}

impl ParseReport {
    /// Build a report. A caret past the end is clamped to the end.
    pub fn new(parser: &Parser, text: &str, caret: Option<usize>) -> Self {
        let caret = caret.map_or(char_len(text), |c| c.min(char_len(text)));
        let full = parser.parse(text);
        let before: String = text.chars().take(caret).collect();
        let outcome = if caret == char_len(text) {
            full.clone()
        } else {
            parser.parse(&before)
        };

        let validity = Validity::of(&full);
        ParseReport {
            query: text.to_string(),
            caret,
            valid: validity.valid,
            message: validity.message,
            error_index: full.result().error_index(),
            expectation: outcome.expectation(),
            last: LastSeen::from(outcome.result()),
            tokens: outcome.tokens().to_vec(),
            position: caret_position(text, caret),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> Parser {
        Parser::new(["and", "or", "not", "empty", "null"])
    }

    #[test]
    fn test_report_of_valid_query() {
        let report = ParseReport::new(&parser(), "project = TEST", None);
        assert!(report.valid);
        assert_eq!(report.message, None);
        assert_eq!(report.caret, 14);
        assert_eq!(report.last.field.as_deref(), Some("project"));
        assert_eq!(report.last.operand.as_deref(), Some("TEST"));
        assert_eq!(report.position, CaretPosition { row: 1, column: 15 });
    }

    #[test]
    fn test_report_splits_validity_from_caret_state() {
        let report = ParseReport::new(&parser(), "sta = Open", Some(3));
        assert!(report.valid);
        assert_eq!(report.expectation, Expectation::Field);
        assert_eq!(report.last.field.as_deref(), Some("sta"));
        assert_eq!(report.last.operator, None);
    }

    #[test]
    fn test_report_clamps_caret() {
        let report = ParseReport::new(&parser(), "a", Some(40));
        assert_eq!(report.caret, 1);
    }

    #[test]
    fn test_invalid_query_has_annotation() {
        let report = ParseReport::new(&parser(), "a = b c", None);
        assert!(!report.valid);
        assert!(report.message.is_some());
        assert!(report.error_index.is_some());
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = ParseReport::new(&parser(), "status = ", None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["expectation"]["kind"], "operand");
        assert_eq!(json["last"]["field"], "status");
        assert!(json.get("errorIndex").is_some());
    }
}

//! Splicing a chosen suggestion into the query text.
//!
//! The start of the replaced span comes from the parse of the text before
//! the caret. The end is the selection end, unless nothing is selected and
//! the caret sits inside the text: then the full text is parsed again and
//! the token under the caret is replaced whole, trailing whitespace
//! included. That is what turns `was n|ot` into `was not` rather than
//! `was notot`.
//!
//! All indices count characters, not bytes.

use serde::{Deserialize, Serialize};

use crate::grammar::{is_new_line, is_whitespace};
use crate::operators::is_was;
use crate::parser::{ParseOutcome, Parser};
use crate::result::{Expectation, ParseResult};
use crate::text::char_len;

/// Selected range of the editor, as character indices. Equal bounds are a
/// plain caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Selection {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn caret(at: usize) -> Self {
        Selection { start: at, end: at }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }
}

/// Text after a completion was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub text: String,
    /// Caret just after the inserted value.
    pub caret: usize,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 1-based row and column of a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaretPosition {
    pub row: usize,
    pub column: usize,
}

/// Row and column of `caret` in `text`. Each `\r` and each `\n` starts a
/// new row.
pub fn caret_position(text: &str, caret: usize) -> CaretPosition {
    text.chars()
        .take(caret)
        .fold(CaretPosition { row: 1, column: 1 }, |mut position, ch| {
            if is_new_line(ch) {
                position.row += 1;
                position.column = 1;
            } else {
                position.column += 1;
            }
            position
        })
}

fn non_zero(start: Option<usize>) -> Option<usize> {
    start.filter(|&start| start != 0)
}

/// Where a connective, `ORDER BY` or predicate replacement begins.
fn logical_operator_start(result: &ParseResult, caret: usize) -> usize {
    if let Some(start) = non_zero(result.logical_operator_start()) {
        return start;
    }
    if result.last_order_by().is_some() {
        if let Some(start) = non_zero(result.order_by_start()) {
            return start;
        }
    }
    if result.last_was_predicate().is_some() {
        if let Some(start) = non_zero(result.was_predicate_start()) {
            return start;
        }
    }
    if result.must_be_operator_or_predicate() {
        caret
    } else {
        caret.saturating_sub(1)
    }
}

/// First character replaced by `value`, given the parse of the text before
/// `caret`.
pub fn replacement_start(outcome: &ParseOutcome, value: &str, caret: usize) -> usize {
    let result = outcome.result();
    let start = match outcome.expectation() {
        Expectation::Field => result.field_name_start(),
        // After `was` the value may be an operator (`was not`) or an operand.
        Expectation::OperatorOrOperand => {
            if is_was(Some(value)) {
                result.operator_start()
            } else {
                outcome.operand_start_after_operator()
            }
        }
        Expectation::Operand | Expectation::PredicateOperand => result.operand_start(),
        Expectation::Operator => result.operator_start(),
        Expectation::OrderByField => result.order_by_field_start(),
        Expectation::OrderByDirection => result.order_by_direction_start(),
        Expectation::LogicalOperator { .. } => Some(logical_operator_start(result, caret)),
        Expectation::OrderBy => result.order_by_start(),
        Expectation::Nothing if result.was_predicate_pending() => result.was_predicate_start(),
        Expectation::Nothing | Expectation::ListComma => Some(caret.saturating_sub(1)),
    };
    start.unwrap_or(caret)
}

/// One past the last character replaced.
pub fn replacement_end(
    parser: &Parser,
    outcome: &ParseOutcome,
    text: &str,
    start: usize,
    selection: Selection,
) -> usize {
    if selection.is_caret() && selection.end != char_len(text) {
        if let Some(end) = token_end(parser, outcome, text, start) {
            return end;
        }
    }
    selection.end
}

/// End of the token under the caret in the fully parsed text.
fn token_end(parser: &Parser, outcome: &ParseOutcome, text: &str, start: usize) -> Option<usize> {
    let index = outcome.tokens().len().checked_sub(1)?;
    let full = parser.parse(text);
    if full.has_error() {
        return None;
    }
    let token = full.tokens().get(index)?.as_deref()?;
    if token == "(" || token == ")" {
        return None;
    }
    let whitespace = text
        .chars()
        .skip(start)
        .take_while(|ch| is_whitespace(*ch))
        .count();
    Some(start + char_len(token) + whitespace)
}

/// Replace characters `start..end` of `text` with `value`.
fn splice(text: &str, start: usize, end: usize, value: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let start = start.min(chars.len());
    let end = end.clamp(start, chars.len());
    let mut spliced: String = chars[..start].iter().collect();
    spliced.push_str(value);
    spliced.extend(&chars[end..]);
    spliced
}

/// Apply `value` to `text` using `outcome`, the parse of the text before the
/// selection, and report the new text, caret and validity.
pub fn complete(
    parser: &Parser,
    outcome: &ParseOutcome,
    text: &str,
    selection: Selection,
    value: &str,
) -> Completion {
    let start = replacement_start(outcome, value, selection.start);
    let mut end = replacement_end(parser, outcome, text, start, selection);

    let mut text = text.to_string();
    if end < start {
        // The value starts past the end of a multi-word operator.
        text = splice(&text, end, end, " ");
        end = start;
    }

    let text = splice(&text, start, end, value);
    let caret = start.min(char_len(&text)) + char_len(value);
    let reparsed = parser.parse(&text);
    Completion {
        valid: !reparsed.has_error(),
        message: reparsed.error_message().map(str::to_string),
        caret: caret.min(char_len(&text)),
        text,
    }
}

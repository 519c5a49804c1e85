//! Incremental recursive-descent JQL parser.
//!
//! The parser never builds a tree. It walks the text once, records the last
//! value seen in each grammatical category and leaves behind an
//! [`Expectation`] describing what may legally come next. Text that is cut
//! off mid-clause is the normal case: a prefix of a valid query parses
//! without an error and simply expects more.
//!
//! ```text
//! jql            := or_clause order_by?
//! or_clause      := and_clause (OR and_clause)* predicate*
//! and_clause     := not_clause (AND not_clause)*
//! not_clause     := NOT not_clause | terminal
//! terminal       := '(' or_clause ')' | field operator operand?
//! order_by       := ORDER BY field direction? (',' field direction?)*
//! ```

mod clauses;
mod fields;
mod operands;
mod order_by;

use std::collections::HashSet;

use crate::cursor::Cursor;
use crate::result::{Expectation, ParseResult};
use crate::text::char_len;

pub use fields::longest_operator_match;

/// JQL parser configured with the server's reserved words.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    reserved_words: HashSet<String>,
}

impl Parser {
    /// Create a parser. Reserved words are matched case-insensitively.
    pub fn new<I, S>(reserved_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Parser {
            reserved_words: reserved_words
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Parse `input`, which may be any prefix of a query.
    pub fn parse(&self, input: &str) -> ParseOutcome {
        let mut cursor = Cursor::new(input);
        self.jql(&mut cursor);
        ParseOutcome {
            input: input.to_string(),
            result: cursor.into_result(),
        }
    }

    pub fn is_reserved_word(&self, word: &str) -> bool {
        self.reserved_words.contains(&word.to_lowercase())
    }

    /// Parse a whole query: a where clause and an optional `ORDER BY`.
    fn jql(&self, c: &mut Cursor) {
        self.or_clause(c);
        if c.starts_with("ord") {
            self.order_by_clause(c);
        }
    }
}

/// A parsed input together with its [`ParseResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    input: String,
    result: ParseResult,
}

impl ParseOutcome {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn result(&self) -> &ParseResult {
        &self.result
    }

    pub fn expectation(&self) -> Expectation {
        self.result.expectation()
    }

    pub fn has_error(&self) -> bool {
        self.result.error_message().is_some()
    }

    /// Annotated error text, e.g. `...s = Open ^AND`.
    pub fn error_message(&self) -> Option<&str> {
        self.result.error_message()
    }

    pub fn tokens(&self) -> &[Option<String>] {
        self.result.tokens()
    }

    /// Input from the start of the last operator to the end.
    pub fn parsed_operator(&self) -> Option<String> {
        self.result.last_operator().filter(|op| !op.is_empty())?;
        let start = self.result.operator_start()?;
        Some(self.input.chars().skip(start).collect())
    }

    /// Index where a value typed after the last operator begins.
    ///
    /// This is one past the operator and the whitespace inside it, so a
    /// completion can replace the value without touching the operator.
    pub fn operand_start_after_operator(&self) -> Option<usize> {
        match self.result.last_operator() {
            Some(op) if !op.is_empty() => {
                let spaces = op.chars().filter(|ch| ch.is_whitespace()).count();
                Some(self.result.operator_start()? + char_len(op) + spaces + 1)
            }
            _ => self.result.operand_start(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> Parser {
        Parser::new(["and", "or", "not", "empty", "null", "order", "select"])
    }

    #[test]
    fn test_empty_input_expects_nothing() {
        let outcome = parser().parse("");
        assert_eq!(outcome.expectation(), Expectation::Nothing);
        assert!(!outcome.has_error());
    }

    #[test]
    fn test_partial_field_expects_field() {
        let outcome = parser().parse("sta");
        assert_eq!(outcome.expectation(), Expectation::Field);
        assert_eq!(outcome.result().last_field_name(), Some("sta"));
        assert_eq!(outcome.result().field_name_start(), Some(0));
    }

    #[test]
    fn test_complete_clause_expects_logical_operator() {
        let outcome = parser().parse("project = TEST ");
        assert!(!outcome.has_error());
        assert_eq!(
            outcome.expectation(),
            Expectation::LogicalOperator {
                order_by: true,
                was_predicate: false
            }
        );
        assert_eq!(outcome.result().last_field_name(), Some("project"));
        assert_eq!(outcome.result().last_operator(), Some("="));
    }

    #[test]
    fn test_reserved_words_are_case_insensitive() {
        let parser = Parser::new(["Select"]);
        assert!(parser.is_reserved_word("SELECT"));
        assert!(!parser.is_reserved_word("status"));
    }

    #[test]
    fn test_parsed_operator_runs_to_end_of_input() {
        let outcome = parser().parse("status was n");
        assert_eq!(outcome.result().operator_start(), Some(7));
        assert_eq!(outcome.parsed_operator().as_deref(), Some("was n"));
    }

    #[test]
    fn test_operand_start_after_multi_word_operator() {
        let outcome = parser().parse("status was not ");
        // "was not" starts at 7, is 7 long and holds one space.
        assert_eq!(outcome.operand_start_after_operator(), Some(16));
    }
}

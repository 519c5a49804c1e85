//! Scanning position over the text being parsed.

use crate::grammar::is_whitespace;
use crate::result::{Mark, ParseResult};
use crate::text::starts_with_ignore_case;

/// Number of characters of left context shown in an error annotation.
const ERROR_CONTEXT: usize = 9;

/// Deepest nesting of parenthesised groups and lists a parse will follow.
pub const MAX_NESTING: usize = 256;

/// A single left-to-right pass over an input string.
///
/// Once a parse error is set the cursor reports itself complete, so every
/// rule stops consuming. Only [`Cursor::attempt`] can take an error back.
#[derive(Debug)]
pub struct Cursor {
    text: String,
    chars: Vec<char>,
    /// Byte offset of each character, plus one for the end of the text.
    offsets: Vec<usize>,
    position: usize,
    paren_depth: usize,
    nesting: usize,
    parse_error: bool,
    result: ParseResult,
}

impl Cursor {
    pub fn new(text: &str) -> Self {
        let mut offsets: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
        offsets.push(text.len());
        Self {
            text: text.to_string(),
            chars: text.chars().collect(),
            offsets,
            position: 0,
            paren_depth: 0,
            nesting: 0,
            parse_error: false,
            result: ParseResult::new(),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Length of the input in characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn current_char(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    /// Unconsumed input, or `None` at the end.
    pub fn remaining(&self) -> Option<&str> {
        if self.position >= self.chars.len() {
            None
        } else {
            Some(&self.text[self.offsets[self.position]..])
        }
    }

    /// Input between two character positions, clamped to the text.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        &self.text[self.offsets[start]..self.offsets[end]]
    }

    /// Case-insensitive test against the unconsumed input.
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.remaining()
            .is_some_and(|rest| starts_with_ignore_case(rest, prefix))
    }

    /// Skip whitespace, reporting whether any was found.
    pub fn skip_whitespace(&mut self) -> bool {
        let mut found = false;
        while self.current_char().is_some_and(is_whitespace) {
            self.consume_char();
            found = true;
        }
        found
    }

    pub fn consume_char(&mut self) {
        self.position += 1;
    }

    pub fn consume_chars(&mut self, count: usize) {
        self.position += count;
    }

    /// True once the input is exhausted or a parse error was raised.
    pub fn is_complete(&self) -> bool {
        self.parse_error || self.position >= self.chars.len()
    }

    pub fn has_error(&self) -> bool {
        self.parse_error
    }

    pub fn enter_parens(&mut self) {
        self.paren_depth += 1;
    }

    pub fn leave_parens(&mut self) {
        self.paren_depth = self.paren_depth.saturating_sub(1);
    }

    pub fn in_parens(&self) -> bool {
        self.paren_depth != 0
    }

    /// Enter a group or list. Past [`MAX_NESTING`] levels this flags a
    /// parse error and returns false; the caller must not descend.
    pub fn descend(&mut self) -> bool {
        if self.nesting >= MAX_NESTING {
            self.set_parse_error();
            return false;
        }
        self.nesting += 1;
        true
    }

    /// Leave a level entered with [`Cursor::descend`].
    pub fn ascend(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }

    /// Current position, for recording a token that ends here.
    pub fn mark(&self) -> Mark {
        Mark {
            position: self.position,
            input_len: self.chars.len(),
        }
    }

    /// Flag a parse error at the current position.
    ///
    /// The annotation shows up to nine characters before the cursor, a caret
    /// and the rest of the input: `...s = Open ^AND`.
    pub fn set_parse_error(&mut self) {
        self.parse_error = true;
        let position = self.position.min(self.chars.len());
        let message = format!(
            "...{}^{}",
            self.slice(position.saturating_sub(ERROR_CONTEXT), position),
            self.slice(position, self.chars.len())
        );
        self.result.set_parse_error(message, position);
    }

    /// Run `rule` from a savepoint. When it yields `None` the position and
    /// error state are restored to what they were before the attempt.
    pub fn attempt<T>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let position = self.position;
        let parse_error = self.parse_error;
        let message = self.result.error_message().map(str::to_string);
        let index = self.result.error_index();

        let outcome = rule(self);
        if outcome.is_none() {
            self.position = position;
            self.parse_error = parse_error;
            self.result.restore_error(message, index);
        }
        outcome
    }

    pub fn result(&self) -> &ParseResult {
        &self.result
    }

    pub fn result_mut(&mut self) -> &mut ParseResult {
        &mut self.result
    }

    pub fn into_result(self) -> ParseResult {
        self.result
    }
}

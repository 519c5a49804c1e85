//! Field names and operators.

use regex::Regex;

use super::Parser;
use crate::cursor::Cursor;
use crate::grammar::{is_space_or_paren, patterns, OPERATORS};
use crate::operators::{self, normalize};
use crate::text::{char_len, char_tail, starts_with_ignore_case};

const ENTITY_PROPERTY_PREFIX: &str = "issue.property";

/// Longest operator at the start of `value`, as typed.
///
/// `is`, `was` and `not` take their multi-word forms (`is not`, `was not in`,
/// `not in`) with any amount of whitespace between the words. A bare `not`
/// is not an operator.
pub fn longest_operator_match(value: &str) -> Option<&str> {
    let p = patterns();
    if starts_with_ignore_case(value, "was") {
        return extend_word(value, 3, &p.spaced_not_in).or(Some("was"));
    }
    if starts_with_ignore_case(value, "is") {
        return extend_word(value, 2, &p.spaced_not).or(Some("is"));
    }
    if starts_with_ignore_case(value, "not") {
        return extend_word(value, 3, &p.spaced_in);
    }
    OPERATORS
        .iter()
        .filter(|op| starts_with_ignore_case(value, op.value))
        .max_by_key(|op| op.value.len())
        .map(|op| op.value)
}

/// The first `head` characters of `value` plus whatever `pattern` matches
/// right after them.
fn extend_word<'a>(value: &'a str, head: usize, pattern: &Regex) -> Option<&'a str> {
    let tail = char_tail(value, head);
    pattern
        .find(tail)
        .map(|m| &value[..value.len() - tail.len() + m.end()])
}

impl Parser {
    pub(super) fn field(&self, c: &mut Cursor) {
        let name = self.field_name(c);
        if !name.is_empty() {
            let mark = c.mark();
            c.result_mut().set_last_field_name(Some(&name), mark);
        } else if c.result().last_field_name().is_none() {
            let remaining = c.remaining().map(str::to_string);
            let mark = c.mark();
            c.result_mut().set_needs_field();
            c.result_mut().set_last_field_name(remaining.as_deref(), mark);
            c.set_parse_error();
        }
    }

    /// A plain or quoted name, `cf[12345]` or `issue.property[key]path`.
    pub(super) fn field_name(&self, c: &mut Cursor) -> String {
        c.skip_whitespace();
        if self.at_custom_field(c) {
            self.custom_field_name(c)
        } else if c.starts_with(ENTITY_PROPERTY_PREFIX) {
            self.entity_property_name(c)
        } else {
            self.field_or_function_name(c)
        }
    }

    /// `cf` only introduces a custom field id when a `[` follows.
    fn at_custom_field(&self, c: &Cursor) -> bool {
        c.remaining().is_some_and(|rest| {
            starts_with_ignore_case(rest, "cf") && char_tail(rest, 2).trim_start().starts_with('[')
        })
    }

    fn custom_field_name(&self, c: &mut Cursor) -> String {
        let origin = c.position();
        c.consume_chars(2);
        c.skip_whitespace();
        if c.starts_with("[") {
            c.consume_char();
            if !self.number_value(c).is_empty() {
                c.skip_whitespace();
                if c.starts_with("]") {
                    c.consume_char();
                    return c.slice(origin, c.position()).to_string();
                }
            }
        }
        c.set_parse_error();
        c.slice(origin, c.len()).to_string()
    }

    fn entity_property_name(&self, c: &mut Cursor) -> String {
        c.consume_chars(char_len(ENTITY_PROPERTY_PREFIX));
        c.skip_whitespace();
        if c.starts_with("[") {
            c.consume_char();
            let keys = self.dotted_values(c);
            if keys
                .first()
                .is_some_and(|key| !key.is_empty() && !key.starts_with('.'))
            {
                c.skip_whitespace();
                if c.starts_with("]") {
                    c.consume_char();
                    let paths = self.dotted_values(c);
                    return format!(
                        "{}[{}]{}",
                        ENTITY_PROPERTY_PREFIX,
                        keys.join("."),
                        paths.join(".")
                    );
                }
            }
        }
        c.set_parse_error();
        String::new()
    }

    fn dotted_values(&self, c: &mut Cursor) -> Vec<String> {
        let mut values = vec![self.string_value(c)];
        while !c.has_error() && c.starts_with(".") {
            c.consume_char();
            values.push(self.string_value(c));
        }
        values
    }

    /// A bare name; empty quotes and reserved words are rejected.
    pub(super) fn field_or_function_name(&self, c: &mut Cursor) -> String {
        let value = self.string_value(c);
        if value == "\"\"" || value == "''" || self.is_reserved_word(&value) {
            c.set_parse_error();
        }
        value
    }

    pub(super) fn oper(&self, c: &mut Cursor) {
        c.skip_whitespace();
        let Some(op) = c
            .remaining()
            .and_then(longest_operator_match)
            .map(str::to_string)
        else {
            if c.result().last_operator().is_none() {
                let remaining = c.remaining().map(str::to_string);
                let error_index = c.len() - remaining.as_deref().map_or(0, char_len);
                c.result_mut()
                    .set_last_operator(remaining.as_deref(), error_index);
                c.result_mut().set_needs_operator();
                c.set_parse_error();
            }
            return;
        };

        let start = c.position();
        c.result_mut().set_last_operator(Some(&op), start);
        if operators::is_history(Some(&op)) {
            c.result_mut().set_last_history_operator(&op);
        }
        c.consume_chars(char_len(&op));
        if operators::is_word_operator(&op)
            && c.current_char().is_some_and(|ch| !is_space_or_paren(ch))
        {
            c.set_parse_error();
        }

        match normalize(&op).as_str() {
            "was" => {
                // `was n` and `was i` may still grow into `was not` or `was in`.
                c.result_mut().set_needs_operand_or_operator();
                c.skip_whitespace();
                if c.remaining().is_some_and(|rest| {
                    patterns().not_start.is_match(rest) || patterns().in_start.is_match(rest)
                }) {
                    c.set_parse_error();
                }
            }
            "was not" => {
                c.result_mut().set_needs_operand_or_operator();
                c.skip_whitespace();
                if c
                    .remaining()
                    .is_some_and(|rest| patterns().in_start.is_match(rest))
                {
                    c.set_parse_error();
                }
            }
            "changed" => {
                let in_parens = c.in_parens();
                c.result_mut().set_needs_logical_operator(in_parens);
            }
            _ => c.result_mut().set_needs_operand(),
        }
    }
}

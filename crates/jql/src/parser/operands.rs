//! Operands: lists, function calls and scalar values.

use super::Parser;
use crate::cursor::Cursor;
use crate::grammar::{
    is_digit, is_special_char, is_token_char, needs_unicode_escape, patterns,
};
use crate::operators::is_list_supporting;
use crate::text::unquote;

impl Parser {
    pub(super) fn operand(&self, c: &mut Cursor) -> String {
        c.skip_whitespace();
        if is_list_supporting(c.result().last_operator()) {
            c.result_mut().set_needs_open_paren(true);
        }

        let operand = self.value_forms(c);
        if operand.is_empty() {
            let remaining = c.remaining().map(str::to_string);
            let mark = c.mark();
            c.result_mut().set_last_operand(remaining.as_deref(), mark);
            c.result_mut().set_needs_operand();
            c.set_parse_error();
        }
        operand
    }

    /// The value of a history predicate, unquoted.
    pub(super) fn collect_predicate_operands(&self, c: &mut Cursor) -> String {
        if c
            .result()
            .last_was_predicate()
            .is_some_and(|p| p.eq_ignore_ascii_case("during"))
        {
            c.result_mut().set_needs_open_paren(true);
        }
        unquote(&self.value_forms(c))
    }

    /// Try a list, then a function call, then a single value.
    fn value_forms(&self, c: &mut Cursor) -> String {
        let list = self.list_operand(c, true);
        if !list.is_empty() {
            c.result_mut().set_needs_open_paren(false);
            return list;
        }
        let function = self.function_operand(c);
        if !function.is_empty() {
            c.result_mut().set_needs_open_paren(false);
            return function;
        }
        self.single_value_operand(c)
    }

    fn single_value_operand(&self, c: &mut Cursor) -> String {
        let operand = self.string_value(c);
        if operand.is_empty() {
            return operand;
        }
        let mark = c.mark();
        c.result_mut().set_last_operand(Some(&operand), mark);
        let lower = operand.to_lowercase();
        // EMPTY and NULL are reserved but still legal values.
        if lower != "empty" && lower != "null" && self.is_reserved_word(&lower) {
            c.set_parse_error();
        }
        operand
    }

    /// `name(args)`, backtracking when either half is missing.
    fn function_operand(&self, c: &mut Cursor) -> String {
        c.attempt(|c| {
            let name = self.field_or_function_name(c);
            c.skip_whitespace();
            let arguments = self.list_operand(c, false);
            if name.is_empty() || arguments.is_empty() {
                return None;
            }
            let operand = format!("{}{}", name, arguments);
            let mark = c.mark();
            c.result_mut().set_last_operand(Some(&operand), mark);
            Some(operand)
        })
        .unwrap_or_default()
    }

    /// A parenthesised list. `as_operands` is false for function arguments,
    /// which are plain strings and leave the operand state alone.
    pub(super) fn list_operand(&self, c: &mut Cursor, as_operands: bool) -> String {
        if c.current_char() != Some('(') || !c.descend() {
            return String::new();
        }
        c.consume_char();
        let mut operand = format!("({}", self.collect_list_values(c, as_operands));
        c.ascend();

        c.skip_whitespace();
        if c.current_char() == Some(')') {
            c.consume_char();
            operand.push(')');
            if as_operands {
                if operand == "()" {
                    let mark = c.mark();
                    c.result_mut().set_last_operand(Some(&operand), mark);
                }
                c.result_mut().set_operand_complete();
                c.result_mut().reset_needs_predicate_operand();
            }
        } else {
            c.set_parse_error();
        }
        operand
    }

    /// Comma separated items. An empty item after a comma is an error
    /// but stays in the text so the trailing `, ` is preserved.
    fn collect_list_values(&self, c: &mut Cursor, as_operands: bool) -> String {
        let mut values = Vec::new();
        loop {
            if as_operands {
                c.result_mut().set_needs_operand();
            }
            c.skip_whitespace();

            let current = if as_operands {
                self.operand(c)
            } else {
                self.string_value(c)
            };
            if current.is_empty() {
                if !values.is_empty() {
                    values.push(current);
                    c.set_parse_error();
                }
                break;
            }
            values.push(current);

            if c.skip_whitespace() && as_operands {
                c.result_mut().set_needs_list_comma();
            }
            if c.current_char() != Some(',') {
                break;
            }
            c.consume_char();
        }
        values.join(", ")
    }

    /// A bare token or a quoted string, escapes included, exactly as typed.
    pub(super) fn string_value(&self, c: &mut Cursor) -> String {
        let mut value = String::new();
        let mut in_double = false;
        let mut in_single = false;

        while let Some(ch) = c.current_char() {
            let quoted = in_double || in_single;
            if !quoted && !is_token_char(ch) {
                break;
            }
            value.push(ch);
            c.consume_char();

            if ch == '\\' {
                let Some(escaped) = c.current_char() else {
                    c.set_parse_error();
                    break;
                };
                if needs_unicode_escape(escaped)
                    && !c
                        .remaining()
                        .is_some_and(|rest| patterns().unicode_escape.is_match(rest))
                {
                    c.set_parse_error();
                    break;
                }
                value.push(escaped);
                c.consume_char();
            } else if !quoted && is_special_char(ch) {
                c.set_parse_error();
                break;
            } else if ch == '"' && !in_single {
                in_double = !in_double;
            } else if ch == '\'' && !in_double {
                in_single = !in_single;
            }
        }

        if c.is_complete() && (in_double || in_single) {
            c.set_parse_error();
        }
        value
    }

    pub(super) fn number_value(&self, c: &mut Cursor) -> String {
        c.skip_whitespace();
        let mut value = String::new();
        while let Some(ch) = c.current_char().filter(|ch| is_digit(*ch)) {
            value.push(ch);
            c.consume_char();
        }
        value
    }
}

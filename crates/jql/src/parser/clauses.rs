//! Boolean structure: OR, AND, NOT, parentheses and history predicates.

use super::Parser;
use crate::cursor::Cursor;
use crate::grammar::{find_predicate, is_space_or_paren, patterns};
use crate::operators::{self, normalize};
use crate::text::{char_len, starts_with_ignore_case};

/// Consecutive loop passes without progress before the OR loop gives up.
const STALL_LIMIT: usize = 3;

/// Words that end a predicate run and hand back to the boolean grammar.
const CLAUSE_BREAKS: &[&str] = &["|", "or", "&", "and", "!", "not", "(", ")"];

fn starts_with_clause_break(text: &str) -> bool {
    CLAUSE_BREAKS
        .iter()
        .any(|word| starts_with_ignore_case(text, word))
}

/// `OR`, `||` or `|` at the start of `rest`, with its length.
fn or_connective(rest: &str) -> Option<(&'static str, usize)> {
    if rest.starts_with("||") {
        Some(("||", 2))
    } else if rest.starts_with('|') {
        Some(("|", 1))
    } else if patterns().or.is_match(rest) {
        Some(("OR", 3))
    } else {
        None
    }
}

fn and_connective(rest: &str) -> Option<(&'static str, usize)> {
    if rest.starts_with("&&") {
        Some(("&&", 2))
    } else if rest.starts_with('&') {
        Some(("&", 1))
    } else if patterns().and.is_match(rest) {
        Some(("AND", 4))
    } else {
        None
    }
}

fn not_connective(rest: &str) -> Option<(&'static str, usize)> {
    if rest.starts_with('!') {
        Some(("!", 1))
    } else if patterns().not.is_match(rest) {
        Some(("NOT", 4))
    } else {
        None
    }
}

impl Parser {
    /// Parse OR expression (lowest precedence)
    pub(super) fn or_clause(&self, c: &mut Cursor) {
        let mut stalled = 0;
        while !c.is_complete() && !c.starts_with(")") {
            let start = c.position();
            c.skip_whitespace();
            if c.starts_with("ord") {
                break;
            }

            if c.result().must_be_operator_or_predicate() {
                c.result_mut().reset_last_predicates();
            } else {
                c.result_mut().reset_logical_operators();
                self.and_clause(c);
            }

            if !c.is_complete() && c.result().last_logical_operator().is_none() {
                if c.result().was_predicate_pending() {
                    self.predicate_clause(c);
                }
                if c.is_complete() {
                    return;
                }

                if c.starts_with("ord") {
                    break;
                }
                match c.remaining().and_then(or_connective) {
                    Some((op, len)) => self.connective(c, op, len),
                    None if !c.starts_with(")") || !c.in_parens() => {
                        let remaining = c.remaining().map(str::to_string);
                        self.unexpected_continuation(c, remaining.as_deref());
                    }
                    None => {}
                }
            }

            if c.position() == start && !c.is_complete() {
                stalled += 1;
                if stalled >= STALL_LIMIT {
                    c.set_parse_error();
                    break;
                }
            } else {
                stalled = 0;
            }
        }
    }

    /// Something other than a connective follows a clause. After a history
    /// operator it may be a predicate; anywhere else it is an error.
    fn unexpected_continuation(&self, c: &mut Cursor, remaining: Option<&str>) {
        c.skip_whitespace();
        let error_index = c.len() - remaining.map_or(0, char_len);
        let words: Option<Vec<&str>> = remaining.map(|rest| rest.split(' ').collect());
        let first = words
            .as_ref()
            .and_then(|w| w.first().copied())
            .unwrap_or_default();

        if words.is_some() {
            let mark = c.mark();
            let in_parens = c.in_parens();
            let result = c.result_mut();
            result.set_last_logical_operator(Some(first), Some(error_index));
            result.set_last_was_predicate(Some(first), mark);
            result.set_needs_logical_operator(in_parens);
        }

        if c.result().last_history_operator().is_none() {
            c.set_parse_error();
            return;
        }
        let Some(words) = words else {
            return;
        };

        if patterns().predicate.is_match(first) {
            let result = c.result_mut();
            result.set_last_logical_operator(None, None);
            result.reset_needs_predicate_operand();
        } else {
            if remaining.is_some_and(|rest| patterns().and.is_match(rest)) {
                c.consume_chars(4);
                c.result_mut().reset_terminal_clause();
                c.result_mut().set_needs_field();
            }
            if c.is_complete() || words.len() == 1 {
                c.set_parse_error();
            }
        }
    }

    /// Record a logical connective and expect the field of the next clause.
    fn connective(&self, c: &mut Cursor, op: &str, len: usize) {
        let start = c.position();
        c.result_mut().set_last_logical_operator(Some(op), Some(start));
        c.consume_chars(len);
        c.result_mut().reset_terminal_clause();
        if c.is_complete() {
            c.set_parse_error();
        }
        c.result_mut().set_needs_field();
    }

    /// Parse AND expression (medium precedence)
    fn and_clause(&self, c: &mut Cursor) {
        c.skip_whitespace();
        self.not_clause(c);
        if c.is_complete() || c.result().last_logical_operator().is_some() {
            return;
        }

        c.skip_whitespace();
        match c.remaining().and_then(and_connective) {
            Some((op, len)) => self.connective(c, op, len),
            None => {
                let in_parens = c.in_parens();
                c.result_mut().set_needs_logical_operator(in_parens);
                if c.is_complete() {
                    let len = c.len();
                    c.result_mut().set_last_logical_operator(None, Some(len));
                }
            }
        }
    }

    /// Parse NOT expression (highest precedence)
    fn not_clause(&self, c: &mut Cursor) {
        c.skip_whitespace();
        if c.is_complete() {
            self.terminal_clause(c);
            c.set_parse_error();
            return;
        }

        match c.remaining().and_then(not_connective) {
            Some((op, len)) => self.connective(c, op, len),
            None => self.terminal_clause(c),
        }
    }

    /// Parse the predicate that trails a history clause
    /// (`status WAS Open BEFORE "2020/01/01"`).
    pub(super) fn predicate_clause(&self, c: &mut Cursor) {
        c.skip_whitespace();
        if c.is_complete() {
            c.set_parse_error();
            return;
        }
        let Some(rest) = c.remaining() else {
            return;
        };

        let mut words = patterns().predicate_split.split(rest);
        let first = words.next().unwrap_or_default().to_string();
        let single_word = words.next().is_none();
        let clause_break = starts_with_clause_break(rest);
        c.result_mut().set_must_be_operator_or_predicate(false);

        if clause_break {
            if single_word {
                let mark = c.mark();
                c.result_mut().set_last_was_predicate(Some(&first), mark);
                c.set_parse_error();
            }
            return;
        }

        c.result_mut().reset_needs_predicate_operand();
        c.consume_chars(char_len(&first));
        let mark = c.mark();
        c.result_mut().set_last_was_predicate(Some(&first), mark);
        if single_word {
            c.set_parse_error();
            return;
        }

        if find_predicate(&first).is_some() {
            let mark = c.mark();
            let result = c.result_mut();
            result.set_needs_predicate_operand();
            result.set_last_operand(None, mark);
            self.predicate_operand(c);
        } else {
            c.set_parse_error();
        }
    }

    fn predicate_operand(&self, c: &mut Cursor) {
        c.skip_whitespace();
        let operand = self.collect_predicate_operands(c);
        if operand.is_empty() {
            let position = c.position();
            c.result_mut().set_last_operand_start(position);
            c.set_parse_error();
        }

        if c.remaining().is_some() {
            let in_parens = c.in_parens();
            let result = c.result_mut();
            result.reset_needs_predicate_operand();
            result.reset_last_predicates();
            result.set_must_be_operator_or_predicate(true);
            result.set_needs_logical_operator(in_parens);
            c.skip_whitespace();
        }
    }

    /// Parse a parenthesised group or a single `field operator operand` clause.
    fn terminal_clause(&self, c: &mut Cursor) {
        c.result_mut().reset_terminal_clause();
        c.skip_whitespace();

        if c.starts_with("(") {
            if !c.descend() {
                return;
            }
            c.result_mut().add_token("(");
            c.enter_parens();
            c.consume_char();
            self.or_clause(c);
            c.skip_whitespace();
            if c.starts_with(")") {
                c.result_mut().add_token(")");
                c.consume_char();
                c.leave_parens();
                if c.is_complete() {
                    c.result_mut().reset_logical_operators();
                    c.result_mut().reset_last_predicates();
                }
            } else {
                c.set_parse_error();
            }
            c.ascend();
            return;
        }

        self.field(c);
        if c.is_complete() {
            c.result_mut().set_needs_field();
            c.set_parse_error();
            return;
        }

        self.oper(c);
        let history_changed = operators::is_changed(c.result().last_history_operator());
        if !c.is_complete() {
            if history_changed {
                let in_parens = c.in_parens();
                c.result_mut().set_needs_logical_operator(in_parens);
                return;
            }
            self.operand(c);

            if c.result().operand_complete() {
                // A closed list ends the clause but keeps WAS predicates reachable.
                let history = c.result().last_history_operator().map(str::to_string);
                c.result_mut().set_needs_nothing();
                if let Some(history) = history {
                    c.result_mut().set_last_history_operator(&history);
                }
            } else if c.is_complete() && !c.result().needs_list_comma() {
                c.result_mut().set_needs_operand();
            }
            return;
        }

        let operator = c.result().last_operator().map(normalize);
        if matches!(operator.as_deref(), Some("was") | Some("was not")) {
            c.result_mut().set_needs_operand_or_operator();
        } else if history_changed {
            if c.current_char().is_some_and(is_space_or_paren) {
                let in_parens = c.in_parens();
                c.result_mut().set_needs_logical_operator(in_parens);
            } else {
                c.result_mut().reset_logical_operators();
                c.result_mut().clear_needs_order_by();
            }
            return;
        } else {
            c.result_mut().set_needs_operator();
        }
        c.set_parse_error();
    }
}

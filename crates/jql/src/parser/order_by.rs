//! `ORDER BY field [ASC|DESC], ...`

use super::Parser;
use crate::cursor::Cursor;
use crate::grammar::{is_whitespace, patterns};
use crate::text::char_len;

/// `ASC` or `DESC` after whitespace at the start of `rest`, with its length.
fn direction(rest: &str) -> Option<(&'static str, usize)> {
    if patterns().ascending.is_match(rest) {
        Some(("asc", 3))
    } else if patterns().descending.is_match(rest) {
        Some(("desc", 4))
    } else {
        None
    }
}

impl Parser {
    pub(super) fn order_by_clause(&self, c: &mut Cursor) {
        let Some(rest) = c.remaining() else {
            return;
        };
        let Some(keyword) = patterns().order_by.find(rest).map(|m| m.as_str().to_string()) else {
            // A partial keyword swallows the rest of the input.
            let rest = rest.to_string();
            c.consume_chars(char_len(&rest));
            let mark = c.mark();
            c.result_mut().set_last_order_by(Some(&rest), mark);
            c.set_parse_error();
            return;
        };

        c.consume_chars(char_len(&keyword));
        let mark = c.mark();
        c.result_mut().set_last_order_by(Some(&keyword), mark);

        if c.current_char().is_some_and(is_whitespace) {
            c.skip_whitespace();
            self.order_by_fields(c);
        } else {
            c.result_mut().reset_logical_operators();
            c.set_parse_error();
        }
    }

    fn order_by_fields(&self, c: &mut Cursor) {
        loop {
            let has_direction = self.order_by_field(c);
            c.skip_whitespace();

            if c.is_complete() {
                // Placeholder so a completion has a direction token to replace.
                if !has_direction && !c.result().needs_order_by_field() {
                    let mark = c.mark();
                    c.result_mut().set_last_order_by_direction(Some(""), mark);
                }
                return;
            }

            if !c.starts_with(",") {
                break;
            }
            c.consume_char();
        }

        let rest = c.remaining().map(str::to_string).unwrap_or_default();
        c.consume_chars(char_len(&rest));
        let mark = c.mark();
        c.result_mut().set_needs_order_by_direction();
        c.result_mut().set_last_order_by_direction(Some(&rest), mark);
        c.set_parse_error();
    }

    /// One sort key. Returns true when a direction followed it.
    fn order_by_field(&self, c: &mut Cursor) -> bool {
        c.skip_whitespace();
        let name = self.field_name(c);
        if name.is_empty() {
            let mark = c.mark();
            c.result_mut().set_last_order_by_field_name(Some(""), mark);
            c.result_mut().set_needs_order_by_field();
            c.set_parse_error();
            return false;
        }

        let mark = c.mark();
        c.result_mut().set_last_order_by_field_name(Some(&name), mark);

        let (before_comma, direction) = match c.remaining() {
            Some(rest) => (patterns().comma_delimiter.is_match(rest), direction(rest)),
            None => (false, None),
        };
        if c.is_complete() || before_comma {
            c.result_mut().set_needs_order_by_field();
            c.skip_whitespace();
            return false;
        }

        match direction {
            Some((direction, len)) => {
                c.skip_whitespace();
                c.consume_chars(len);
                let mark = c.mark();
                c.result_mut()
                    .set_last_order_by_direction(Some(direction), mark);
                c.result_mut().set_needs_order_by_comma();
                true
            }
            None => {
                c.result_mut().set_needs_order_by_direction();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Expectation;

    fn parse(input: &str) -> crate::parser::ParseOutcome {
        Parser::new(["and", "or", "order", "by", "asc", "desc"]).parse(input)
    }

    #[test]
    fn test_order_by_expects_field() {
        let outcome = parse("project = TEST ORDER BY ");
        assert!(outcome.has_error());
        assert_eq!(outcome.expectation(), Expectation::OrderByField);
        assert_eq!(outcome.result().last_order_by(), Some("ORDER BY"));
        assert_eq!(outcome.result().order_by_start(), Some(15));
    }

    #[test]
    fn test_partial_order_by_field() {
        let outcome = parse("ORDER BY cre");
        assert!(!outcome.has_error());
        assert_eq!(outcome.expectation(), Expectation::OrderByField);
        assert_eq!(outcome.result().last_order_by_field_name(), Some("cre"));
        assert_eq!(outcome.result().order_by_field_start(), Some(9));
    }

    #[test]
    fn test_field_then_space_expects_direction() {
        let outcome = parse("ORDER BY created ");
        assert!(!outcome.has_error());
        assert_eq!(outcome.expectation(), Expectation::OrderByDirection);
        assert_eq!(outcome.result().last_order_by_direction(), Some(""));
    }

    #[test]
    fn test_partial_direction_is_an_error() {
        let outcome = parse("ORDER BY created DE");
        assert!(outcome.has_error());
        assert_eq!(outcome.expectation(), Expectation::OrderByDirection);
        assert_eq!(outcome.result().last_order_by_direction(), Some("DE"));
        assert_eq!(outcome.result().order_by_direction_start(), Some(17));
    }

    #[test]
    fn test_typed_direction_is_kept() {
        let outcome = parse("ORDER BY created DESC");
        assert!(!outcome.has_error());
        assert_eq!(outcome.expectation(), Expectation::Nothing);
        assert_eq!(outcome.result().last_order_by_direction(), Some("desc"));
        assert_eq!(outcome.result().order_by_direction_start(), Some(17));

        let outcome = parse("ORDER BY created asc ");
        assert_eq!(outcome.result().last_order_by_direction(), Some("asc"));
    }

    #[test]
    fn test_many_sort_keys() {
        let keys = vec!["created DESC"; 2_000].join(", ");
        let outcome = parse(&format!("ORDER BY {}", keys));
        assert!(!outcome.has_error());
        assert_eq!(outcome.result().last_order_by_direction(), Some("desc"));
    }

    #[test]
    fn test_directions_and_commas() {
        let outcome = parse("ORDER BY created DESC, priority asc");
        assert!(!outcome.has_error());
        assert_eq!(outcome.expectation(), Expectation::Nothing);
        assert_eq!(outcome.result().last_order_by_field_name(), Some("priority"));
    }

    #[test]
    fn test_comma_expects_next_field() {
        let outcome = parse("ORDER BY created, ");
        assert!(outcome.has_error());
        assert_eq!(outcome.expectation(), Expectation::OrderByField);
        assert_eq!(outcome.result().last_order_by_field_name(), Some(""));
    }

    #[test]
    fn test_direction_needs_word_boundary() {
        let outcome = parse("ORDER BY created ascending");
        assert!(outcome.has_error());
        assert_eq!(outcome.expectation(), Expectation::OrderByDirection);
    }

    #[test]
    fn test_order_prefix_swallows_input() {
        let outcome = parse("project = TEST ord");
        assert!(outcome.has_error());
        assert_eq!(outcome.result().last_order_by(), Some("ord"));
        assert_eq!(outcome.result().order_by_start(), Some(15));
        assert_eq!(
            outcome.expectation(),
            Expectation::LogicalOperator {
                order_by: true,
                was_predicate: false
            }
        );
    }

    #[test]
    fn test_order_by_without_trailing_space() {
        let outcome = parse("project = TEST ORDER BY");
        assert!(outcome.has_error());
        assert_eq!(outcome.expectation(), Expectation::OrderBy);
    }
}

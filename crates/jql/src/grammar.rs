//! Static JQL grammar data.
//!
//! Keyword tables (operators, logical connectives, ordering keywords and the
//! history predicates of `WAS`/`CHANGED`) plus the regular expressions the
//! parser uses to recognise lexical classes. Everything here is immutable.

use regex::Regex;
use std::sync::OnceLock;

/// Value type that accepts any field or function type.
pub const ANY_TYPE: &str = "java.lang.Object";

/// A reserved JQL word together with the text shown in a suggestion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyword {
    pub value: &'static str,
    pub display_name: &'static str,
}

impl Keyword {
    const fn new(value: &'static str) -> Self {
        Self {
            value,
            display_name: value,
        }
    }
}

/// A trailing qualifier of a history operator (`status WAS x BEFORE "2020/01/01"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate {
    pub value: &'static str,
    pub display_name: &'static str,
    /// Type of value the predicate compares against.
    pub value_type: &'static str,
    /// Whether the predicate accepts a parenthesised list.
    pub supports_list: bool,
    /// Whether values for this predicate can be looked up remotely.
    pub auto_complete: bool,
}

pub const AND: Keyword = Keyword::new("AND");
pub const OR: Keyword = Keyword::new("OR");
pub const ORDER_BY: Keyword = Keyword::new("ORDER BY");
pub const NOT: Keyword = Keyword::new("NOT");
pub const ASC: Keyword = Keyword::new("ASC");
pub const DESC: Keyword = Keyword::new("DESC");

/// The synthetic EMPTY operand; compatible with every field type.
pub const EMPTY: Keyword = Keyword::new("EMPTY");

pub const LOGICAL_OPERATORS: &[Keyword] = &[AND, OR];
pub const LOGICAL_OPERATORS_AND_ORDER_BY: &[Keyword] = &[AND, OR, ORDER_BY];
pub const ORDER_BY_DIRECTIONS: &[Keyword] = &[ASC, DESC];

/// Comparison and containment operators in matching priority order.
pub const OPERATORS: &[Keyword] = &[
    Keyword::new("="),
    Keyword::new("!="),
    Keyword::new("~"),
    Keyword::new("<="),
    Keyword::new(">="),
    Keyword::new(">"),
    Keyword::new("<"),
    Keyword::new("!~"),
    Keyword::new("is not"),
    Keyword::new("is"),
    Keyword::new("not in"),
    Keyword::new("in"),
    Keyword::new("was"),
    Keyword::new("was not"),
    Keyword::new("was in"),
    Keyword::new("was not in"),
    Keyword::new("changed"),
];

const DATE: &str = "java.util.Date";
const USER: &str = "com.atlassian.crowd.embedded.api.User";
const TEXT: &str = "java.lang.String";

const fn predicate(
    value: &'static str,
    value_type: &'static str,
    supports_list: bool,
    auto_complete: bool,
) -> Predicate {
    Predicate {
        value,
        display_name: value,
        value_type,
        supports_list,
        auto_complete,
    }
}

pub const AFTER: Predicate = predicate("AFTER", DATE, false, false);
pub const BEFORE: Predicate = predicate("BEFORE", DATE, false, false);
pub const BY: Predicate = predicate("BY", USER, false, true);
pub const DURING: Predicate = predicate("DURING", DATE, true, false);
pub const ON: Predicate = predicate("ON", DATE, false, false);
pub const FROM: Predicate = predicate("FROM", TEXT, true, true);
pub const TO: Predicate = predicate("TO", TEXT, true, true);

/// Predicates accepted after `WAS`-family operators.
pub const WAS_PREDICATES: &[Predicate] = &[AFTER, BEFORE, BY, DURING, ON];

/// Predicates accepted after `CHANGED`: the `WAS` set plus `FROM`/`TO`.
pub const CHANGED_PREDICATES: &[Predicate] = &[AFTER, BEFORE, BY, DURING, ON, FROM, TO];

/// Look up a history predicate by name, ignoring case.
pub fn find_predicate(name: &str) -> Option<&'static Predicate> {
    CHANGED_PREDICATES
        .iter()
        .find(|p| p.value.eq_ignore_ascii_case(name))
}

/// Compiled lexical patterns shared by the parser and the dispatcher.
pub struct Patterns {
    pub and: Regex,
    pub or: Regex,
    pub not: Regex,
    pub spaced_not: Regex,
    pub spaced_in: Regex,
    pub spaced_not_in: Regex,
    pub comma_delimiter: Regex,
    pub ascending: Regex,
    pub descending: Regex,
    pub order_by: Regex,
    pub unicode_escape: Regex,
    pub custom_field_suffix: Regex,
    pub not_start: Regex,
    pub in_start: Regex,
    pub predicate: Regex,
    pub predicate_split: Regex,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("JQL grammar pattern should compile")
}

/// Get the compiled pattern set.
pub fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        and: compile(r"(?i)^AND\s"),
        or: compile(r"(?i)^OR\s"),
        not: compile(r"(?i)^NOT\s"),
        spaced_not: compile(r"(?i)^\s+not"),
        spaced_in: compile(r"(?i)^\s+in"),
        spaced_not_in: compile(r"(?i)^\s+(not\s+in|not|in)"),
        comma_delimiter: compile(r"^\s*,"),
        ascending: compile(r"(?i)^\s+asc\b"),
        descending: compile(r"(?i)^\s+desc\b"),
        order_by: compile(r"(?i)^order\s+by"),
        unicode_escape: compile(r"^u[a-fA-F0-9]{4}"),
        custom_field_suffix: compile(r"^\s-\scf\[[0-9]{5}\]"),
        not_start: compile(r"(?i)^NO?$"),
        in_start: compile(r"(?i)^IN?$"),
        predicate: compile(r"(?i)^(after|before|by|during|from|on|to)"),
        predicate_split: compile(r"[\s(]+"),
    })
}

/// Matches `\s` in the lexical patterns.
pub fn is_whitespace(ch: char) -> bool {
    ch.is_whitespace()
}

pub fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

pub fn is_new_line(ch: char) -> bool {
    matches!(ch, '\r' | '\n')
}

/// Characters allowed in an unquoted token.
pub fn is_token_char(ch: char) -> bool {
    !ch.is_whitespace()
        && !matches!(
            ch,
            '=' | '!' | '~' | '<' | '>' | '(' | ')' | ',' | '&' | '|' | ']'
        )
}

/// Characters that must be quoted to appear in a value.
pub fn is_special_char(ch: char) -> bool {
    matches!(
        ch,
        '{' | '}' | '*' | '/' | '%' | '+' | '$' | '#' | '@' | '?' | ';' | '[' | ']'
    )
}

pub fn is_space_or_paren(ch: char) -> bool {
    ch.is_whitespace() || ch == '('
}

/// Escaped characters that are only legal as the start of `\uXXXX`.
pub fn needs_unicode_escape(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, 't' | 'r' | 'n' | '"' | '\'' | '\\')
}

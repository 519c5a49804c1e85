//! String helpers shared by the parser and the suggestion filters.

use crate::grammar::patterns;

/// Case-insensitive prefix test.
pub fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    let mut chars = text.chars();
    prefix.chars().all(|p| {
        chars
            .next()
            .is_some_and(|c| c.to_lowercase().eq(p.to_lowercase()))
    })
}

pub fn equals_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Slice off the first `n` characters.
pub fn char_tail(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Strip one pair of surrounding quotes.
///
/// The closing quote survives when it is escaped (`"abc\"`), and values
/// shorter than three characters keep their closing quote.
pub fn unquote(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let closing_not_escaped = chars.len() >= 3 && chars[chars.len() - 2] != '\\';
    let mut start = 0;
    let mut end = chars.len();
    if chars.first() == Some(&'"') {
        start = 1;
        if chars.last() == Some(&'"') && closing_not_escaped {
            end -= 1;
        }
    } else if chars.first() == Some(&'\'') {
        start = 1;
        if chars.last() == Some(&'\'') && closing_not_escaped {
            end -= 1;
        }
    }
    chars[start..end.max(start)].iter().collect()
}

/// Remove backslash escapes, keeping `\uXXXX` sequences intact.
pub fn strip_escape_characters(value: &str) -> String {
    let mut stripped = String::with_capacity(value.len());
    let mut chars = value.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '\\' && !patterns().unicode_escape.is_match(&value[idx + 1..]) {
            match chars.next() {
                Some((_, escaped)) => stripped.push(escaped),
                None => break,
            }
        } else {
            stripped.push(ch);
        }
    }
    stripped
}

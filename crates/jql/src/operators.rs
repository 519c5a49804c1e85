//! Operator classification.
//!
//! Operators are recorded exactly as typed (`IS  NOT`), so every check here
//! works on the lowercased, whitespace-collapsed form.

/// Lowercase an operator and collapse internal runs of whitespace.
pub fn normalize(operator: &str) -> String {
    operator
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_one_of(operator: Option<&str>, candidates: &[&str]) -> bool {
    operator.is_some_and(|op| candidates.contains(&normalize(op).as_str()))
}

/// Operators whose operand is a parenthesised list.
pub fn is_list_supporting(operator: Option<&str>) -> bool {
    is_one_of(operator, &["in", "not in", "was in", "was not in"])
}

/// Operators that only accept `EMPTY`.
pub fn is_empty_only(operator: Option<&str>) -> bool {
    is_one_of(operator, &["is", "is not"])
}

/// The `WAS` family of history operators.
pub fn is_was(operator: Option<&str>) -> bool {
    is_one_of(operator, &["was", "was not", "was in", "was not in"])
}

pub fn is_changed(operator: Option<&str>) -> bool {
    is_one_of(operator, &["changed"])
}

/// Operators that accept trailing history predicates.
pub fn is_history(operator: Option<&str>) -> bool {
    is_was(operator) || is_changed(operator)
}

/// Alphabetic operators that must be followed by whitespace or `(`.
pub fn is_word_operator(operator: &str) -> bool {
    matches!(
        normalize(operator).as_str(),
        "in" | "is" | "is not" | "not in" | "was" | "was not" | "was in" | "was not in"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_case_and_spacing() {
        assert_eq!(normalize("IS  NOT"), "is not");
        assert_eq!(normalize("was\tnot\n in"), "was not in");
        assert_eq!(normalize("="), "=");
    }

    #[test]
    fn test_history_operators() {
        assert!(is_was(Some("WAS NOT")));
        assert!(is_history(Some("changed")));
        assert!(!is_was(Some("changed")));
        assert!(!is_history(None));
    }

    #[test]
    fn test_list_and_empty_only() {
        assert!(is_list_supporting(Some("not in")));
        assert!(!is_list_supporting(Some("was not")));
        assert!(is_empty_only(Some("Is Not")));
        assert!(!is_empty_only(Some("=")));
    }

    #[test]
    fn test_word_operators() {
        assert!(is_word_operator("was not in"));
        assert!(!is_word_operator("changed"));
        assert!(!is_word_operator("!="));
    }
}

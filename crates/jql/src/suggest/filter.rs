//! Prefix filtering of suggestion candidates.
//!
//! Every list is filtered by a case-insensitive prefix on what was typed.
//! When exactly one candidate survives and the user has already typed all
//! of it, the list is suppressed; a longer candidate sharing the prefix
//! keeps both visible.

use crate::grammar::{patterns, Keyword, Predicate, ANY_TYPE, EMPTY};
use crate::metadata::{FieldDescriptor, FunctionDescriptor};
use crate::operators::is_list_supporting;
use crate::text::{char_len, char_tail, equals_ignore_case, starts_with_ignore_case};

use super::Suggestion;

/// Anything that can be offered as a suggestion.
pub trait Candidate {
    fn value(&self) -> &str;
    fn display_name(&self) -> &str;

    fn to_suggestion(&self, typed: Option<&str>) -> Suggestion {
        Suggestion::new(self.value(), self.display_name()).highlighted(typed)
    }
}

impl Candidate for Keyword {
    fn value(&self) -> &str {
        self.value
    }

    fn display_name(&self) -> &str {
        self.display_name
    }
}

impl Candidate for Predicate {
    fn value(&self) -> &str {
        self.value
    }

    fn display_name(&self) -> &str {
        self.display_name
    }
}

impl Candidate for FieldDescriptor {
    fn value(&self) -> &str {
        &self.value
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl Candidate for FunctionDescriptor {
    fn value(&self) -> &str {
        &self.value
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl Candidate for Suggestion {
    fn value(&self) -> &str {
        &self.value
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// The EMPTY sentinel as a function that fits every type.
pub(crate) fn empty_function() -> FunctionDescriptor {
    FunctionDescriptor {
        value: EMPTY.value.to_string(),
        display_name: EMPTY.display_name.to_string(),
        is_list: false,
        types: vec![ANY_TYPE.to_string()],
    }
}

fn prefix_matches(typed: Option<&str>, text: &str) -> bool {
    typed.map_or(true, |typed| starts_with_ignore_case(text, typed))
}

/// Whether `display` starts with `typed` without being exactly it.
///
/// A display name of the form `Name - cf[12345]` counts as fully typed once
/// `Name` is. Absent input matches everything.
pub fn starts_with_not_equals(typed: Option<&str>, display: &str) -> bool {
    let Some(typed) = typed else {
        return true;
    };
    let typed_len = char_len(typed);
    if char_len(display) < typed_len || !starts_with_ignore_case(display, typed) {
        return false;
    }
    let rest = char_tail(display, typed_len);
    let compared = if patterns().custom_field_suffix.is_match(rest) {
        &display[..display.len() - rest.len()]
    } else {
        display
    };
    !equals_ignore_case(typed, compared)
}

fn without_exact_unique<'a, C>(typed: Option<&str>, matching: Vec<&'a C>) -> Vec<&'a C>
where
    C: Candidate + ?Sized,
{
    match matching.as_slice() {
        [only] if !starts_with_not_equals(typed, only.display_name()) => Vec::new(),
        _ => matching,
    }
}

/// Candidates whose display name starts with `typed`.
///
/// Unless `show_full` is set, a single candidate that is already fully
/// typed is dropped.
pub fn slim<'a, C, I>(typed: Option<&str>, candidates: I, show_full: bool) -> Vec<Suggestion>
where
    C: Candidate + ?Sized + 'a,
    I: IntoIterator<Item = &'a C>,
{
    let matching: Vec<&C> = candidates
        .into_iter()
        .filter(|candidate| prefix_matches(typed, candidate.display_name()))
        .collect();
    let matching = if show_full {
        matching
    } else {
        without_exact_unique(typed, matching)
    };
    matching
        .into_iter()
        .map(|candidate| candidate.to_suggestion(typed))
        .collect()
}

/// Operators matching `typed`, restricted to those the field supports when
/// the field is known.
pub(crate) fn operators_for_field(
    typed: Option<&str>,
    operators: &[Keyword],
    field: Option<&FieldDescriptor>,
) -> Vec<Suggestion> {
    let mut suggestions = slim(typed, operators, false);
    if let Some(field) = field {
        suggestions.retain(|s| field.operators.iter().any(|op| op == &s.value));
    }
    suggestions
}

fn types_compatible(function_types: &[String], field_types: &[String]) -> bool {
    function_types.iter().any(|t| t == ANY_TYPE)
        || field_types.iter().any(|t| t == ANY_TYPE)
        || field_types.iter().any(|t| function_types.contains(t))
}

/// Functions usable as the operand of `operator` on `field`.
///
/// List functions go with list operators only. An unknown field accepts no
/// functions at all.
pub(crate) fn functions_for_operand(
    typed: Option<&str>,
    functions: &[FunctionDescriptor],
    operator: Option<&str>,
    field: Option<&FieldDescriptor>,
) -> Vec<Suggestion> {
    let Some(field) = field else {
        return Vec::new();
    };
    let wants_list = is_list_supporting(operator);
    let matching = functions
        .iter()
        .filter(|f| f.is_list == wants_list)
        .filter(|f| types_compatible(&f.types, &field.types))
        .filter(|f| prefix_matches(typed, &f.value) || prefix_matches(typed, &f.display_name))
        .collect();
    without_exact_unique(typed, matching)
        .into_iter()
        .map(|f| f.to_suggestion(typed))
        .collect()
}

/// Functions usable as the value of a history predicate.
pub(crate) fn functions_for_predicate(
    typed: Option<&str>,
    functions: &[FunctionDescriptor],
    predicate: Option<&Predicate>,
) -> Vec<Suggestion> {
    let Some(predicate) = predicate else {
        return Vec::new();
    };
    let matching = functions
        .iter()
        .filter(|f| f.is_list == predicate.supports_list)
        .filter(|f| f.types.iter().any(|t| t == predicate.value_type))
        .filter(|f| prefix_matches(typed, &f.value) || prefix_matches(typed, &f.display_name))
        .collect();
    without_exact_unique(typed, matching)
        .into_iter()
        .map(|f| f.to_suggestion(typed))
        .collect()
}

/// Add EMPTY to server results when it matches `typed`. A full list gives
/// up its last slot.
pub(crate) fn append_empty(
    typed: Option<&str>,
    mut results: Vec<Suggestion>,
    max: usize,
) -> Vec<Suggestion> {
    let Some(empty) = slim(typed, [EMPTY].iter(), true).into_iter().next() else {
        return results;
    };
    if results.len() < max {
        results.push(empty);
    } else if max > 0 {
        results.truncate(max);
        results[max - 1] = empty;
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{LOGICAL_OPERATORS, OPERATORS, WAS_PREDICATES};

    fn values(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.value.as_str()).collect()
    }

    fn field(types: &[&str], operators: &[&str]) -> FieldDescriptor {
        FieldDescriptor {
            value: "assignee".to_string(),
            display_name: "Assignee".to_string(),
            operators: operators.iter().map(|s| s.to_string()).collect(),
            types: types.iter().map(|s| s.to_string()).collect(),
            searchable: true,
            ..Default::default()
        }
    }

    fn function(value: &str, is_list: bool, types: &[&str]) -> FunctionDescriptor {
        FunctionDescriptor {
            value: value.to_string(),
            display_name: value.to_string(),
            is_list,
            types: types.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_exact_unique_match_is_suppressed() {
        let done = [Suggestion::new("Done", "Done")];
        assert!(slim(Some("Done"), &done, false).is_empty());
        assert!(slim(Some("done"), &done, false).is_empty());
        assert_eq!(slim(Some("Done"), &done, true).len(), 1);
    }

    #[test]
    fn test_ambiguous_prefix_keeps_all() {
        let candidates = [
            Suggestion::new("Done", "Done"),
            Suggestion::new("\"Done, Closed\"", "Done, Closed"),
        ];
        assert_eq!(slim(Some("Done"), &candidates, false).len(), 2);
    }

    #[test]
    fn test_absent_input_matches_everything() {
        assert_eq!(slim(None, LOGICAL_OPERATORS, false).len(), 2);
        assert_eq!(values(&slim(Some("o"), LOGICAL_OPERATORS, false)), ["OR"]);
        assert!(slim(Some("x"), LOGICAL_OPERATORS, false).is_empty());
    }

    #[test]
    fn test_single_partial_match_is_kept() {
        let matches = slim(Some("an"), LOGICAL_OPERATORS, false);
        assert_eq!(values(&matches), ["AND"]);
        assert_eq!(matches[0].highlight, 2);
    }

    #[test]
    fn test_custom_field_display_counts_as_typed() {
        assert!(!starts_with_not_equals(Some("Story"), "Story - cf[10002]"));
        assert!(starts_with_not_equals(Some("Sto"), "Story - cf[10002]"));
        assert!(starts_with_not_equals(Some("Story"), "Story Points"));
        assert!(!starts_with_not_equals(Some("Storyx"), "Story"));
        assert!(starts_with_not_equals(None, "anything"));
    }

    #[test]
    fn test_operators_restricted_to_field() {
        let status = field(&[], &["=", "!=", "in"]);
        let suggestions = operators_for_field(None, OPERATORS, Some(&status));
        assert_eq!(values(&suggestions), ["=", "!=", "in"]);

        let unknown = operators_for_field(Some("was"), OPERATORS, None);
        assert_eq!(
            values(&unknown),
            ["was", "was not", "was in", "was not in"]
        );
    }

    #[test]
    fn test_function_list_and_type_compatibility() {
        let user = "com.atlassian.crowd.embedded.api.User";
        let functions = [
            function("currentUser()", false, &[user]),
            function("membersOf()", true, &[user]),
            function("now()", false, &["java.util.Date"]),
            function("anything()", false, &[ANY_TYPE]),
        ];
        let assignee = field(&[user], &[]);

        let scalar = functions_for_operand(None, &functions, Some("="), Some(&assignee));
        assert_eq!(values(&scalar), ["currentUser()", "anything()"]);

        let list = functions_for_operand(None, &functions, Some("in"), Some(&assignee));
        assert_eq!(values(&list), ["membersOf()"]);

        let open = field(&[ANY_TYPE], &[]);
        let all_scalar = functions_for_operand(None, &functions, Some("="), Some(&open));
        assert_eq!(all_scalar.len(), 3);

        assert!(functions_for_operand(None, &functions, Some("="), None).is_empty());
    }

    #[test]
    fn test_fully_typed_function_is_suppressed() {
        let functions = [function("currentUser()", false, &[ANY_TYPE])];
        let assignee = field(&[ANY_TYPE], &[]);
        assert!(
            functions_for_operand(Some("currentUser()"), &functions, Some("="), Some(&assignee))
                .is_empty()
        );
        assert_eq!(
            functions_for_operand(Some("curr"), &functions, Some("="), Some(&assignee)).len(),
            1
        );
    }

    #[test]
    fn test_empty_function_fits_any_field() {
        let functions = [empty_function()];
        let date = field(&["java.util.Date"], &[]);
        let suggestions = functions_for_operand(Some("EM"), &functions, Some("is"), Some(&date));
        assert_eq!(values(&suggestions), ["EMPTY"]);
    }

    #[test]
    fn test_predicate_functions() {
        let functions = [
            function("now()", false, &["java.util.Date"]),
            function("startOfDay()", false, &["java.util.Date"]),
            function("currentUser()", false, &["com.atlassian.crowd.embedded.api.User"]),
        ];
        let before = WAS_PREDICATES.iter().find(|p| p.value == "BEFORE");
        assert_eq!(
            values(&functions_for_predicate(None, &functions, before)),
            ["now()", "startOfDay()"]
        );

        let during = WAS_PREDICATES.iter().find(|p| p.value == "DURING");
        assert!(functions_for_predicate(None, &functions, during).is_empty());

        assert!(functions_for_predicate(None, &functions, None).is_empty());
    }

    #[test]
    fn test_append_empty() {
        let results = vec![Suggestion::new("Open", "Open")];
        let appended = append_empty(Some("e"), results.clone(), 15);
        assert_eq!(values(&appended), ["Open", "EMPTY"]);

        let skipped = append_empty(Some("Op"), results, 15);
        assert_eq!(values(&skipped), ["Open"]);

        let full: Vec<Suggestion> = (0..15)
            .map(|i| Suggestion::new(format!("v{}", i), format!("v{}", i)))
            .collect();
        let replaced = append_empty(None, full, 15);
        assert_eq!(replaced.len(), 15);
        assert_eq!(replaced[14].value, "EMPTY");
    }
}

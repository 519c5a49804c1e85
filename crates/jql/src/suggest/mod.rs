//! Autocomplete: deciding what to suggest at the caret.
//!
//! A suggestion pass parses the text before the caret, turns the resulting
//! [`Expectation`](crate::result::Expectation) into a [`Plan`] and, when the
//! plan needs server values, asks a [`ValueLookup`] for them.
//!
//! Suggestions come in three groups rendered in order: operators, values
//! and functions (functions also carry keywords such as `NOT` and `EMPTY`).

mod cache;
mod dispatcher;
mod filter;
mod lookup;
mod session;

use serde::{Deserialize, Serialize};

pub use cache::ResponseCache;
pub use dispatcher::{Dispatcher, PendingLookup, Plan};
pub use filter::{slim, starts_with_not_equals};
pub use lookup::{
    ConfiguredLookup, HttpValueLookup, LookupRequest, StaticValueLookup, ValueLookup,
};
pub use session::{AutoComplete, SuggestOutcome};

/// A single entry of a suggestion list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// Text inserted into the query.
    pub value: String,
    pub display_name: String,
    /// Number of leading display characters matching what was typed.
    #[serde(default)]
    pub highlight: usize,
    #[serde(default)]
    pub is_highlighted: bool,
}

impl Suggestion {
    pub fn new(value: impl Into<String>, display_name: impl Into<String>) -> Self {
        Suggestion {
            value: value.into(),
            display_name: display_name.into(),
            highlight: 0,
            is_highlighted: false,
        }
    }

    /// Mark the typed prefix of the display name.
    pub fn highlighted(mut self, typed: Option<&str>) -> Self {
        self.highlight = match typed {
            Some(typed) if crate::text::starts_with_ignore_case(&self.display_name, typed) => {
                crate::text::char_len(typed)
            }
            _ => 0,
        };
        self.is_highlighted = self.highlight > 0;
        self
    }
}

/// Suggestion groups for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    pub operators: Vec<Suggestion>,
    pub values: Vec<Suggestion>,
    pub functions: Vec<Suggestion>,
}

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty() && self.values.is_empty() && self.functions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operators.len() + self.values.len() + self.functions.len()
    }

    /// All suggestions in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.operators
            .iter()
            .chain(self.values.iter())
            .chain(self.functions.iter())
    }

    /// Cap every group and prefix values with `(` when a list must be opened.
    pub(crate) fn finish(mut self, max: usize, open_paren: bool) -> Self {
        self.operators.truncate(max);
        self.values.truncate(max);
        self.functions.truncate(max);
        if open_paren {
            for suggestion in &mut self.values {
                suggestion.value.insert(0, '(');
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_counts_typed_prefix() {
        let suggestion = Suggestion::new("status", "Status").highlighted(Some("sta"));
        assert_eq!(suggestion.highlight, 3);
        assert!(suggestion.is_highlighted);

        let suggestion = Suggestion::new("status", "Status").highlighted(Some(""));
        assert_eq!(suggestion.highlight, 0);
        assert!(!suggestion.is_highlighted);

        let suggestion = Suggestion::new("status", "Status").highlighted(None);
        assert!(!suggestion.is_highlighted);
    }

    #[test]
    fn test_finish_caps_groups_and_opens_lists() {
        let values = (0..20)
            .map(|i| Suggestion::new(format!("v{}", i), format!("v{}", i)))
            .collect();
        let suggestions = Suggestions {
            values,
            functions: vec![Suggestion::new("f()", "f()")],
            ..Default::default()
        }
        .finish(15, true);

        assert_eq!(suggestions.values.len(), 15);
        assert_eq!(suggestions.values[0].value, "(v0");
        assert_eq!(suggestions.values[0].display_name, "v0");
        assert_eq!(suggestions.functions[0].value, "f()");
        assert_eq!(suggestions.len(), 16);
    }

    #[test]
    fn test_suggestion_serializes_camel_case() {
        let json = serde_json::to_value(Suggestion::new("a", "A").highlighted(Some("a"))).unwrap();
        assert_eq!(json["displayName"], "A");
        assert_eq!(json["isHighlighted"], true);
    }
}

//! Turning a parse outcome into suggestions.
//!
//! The dispatcher is synchronous and pure: given the outcome of parsing the
//! text before the caret it returns a [`Plan`]. Plans that need server
//! values carry a [`PendingLookup`] which the session resolves once the
//! values arrive.

use tracing::debug;

use crate::grammar::{
    find_predicate, Predicate, CHANGED_PREDICATES, LOGICAL_OPERATORS,
    LOGICAL_OPERATORS_AND_ORDER_BY, NOT, OPERATORS, ORDER_BY_DIRECTIONS, WAS_PREDICATES,
};
use crate::metadata::{FieldDescriptor, FunctionDescriptor, JqlMetadata};
use crate::operators::{is_empty_only, is_was};
use crate::parser::ParseOutcome;
use crate::result::Expectation;
use crate::text::strip_escape_characters;

use super::filter::{
    append_empty, empty_function, functions_for_operand, functions_for_predicate,
    operators_for_field, slim, Candidate,
};
use super::lookup::LookupRequest;
use super::{Suggestion, Suggestions};

/// Default cap per suggestion group.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 15;

/// What a suggestion pass should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Close any open suggestion list.
    Hide,
    Show(Suggestions),
    /// Values must be fetched before anything is shown.
    Lookup(PendingLookup),
}

/// Suggestions computed synchronously, waiting for server values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLookup {
    request: LookupRequest,
    operators: Vec<Suggestion>,
    functions: Vec<Suggestion>,
    include_empty: bool,
    open_paren: bool,
    max_suggestions: usize,
}

impl PendingLookup {
    pub fn request(&self) -> &LookupRequest {
        &self.request
    }

    /// Whether EMPTY joins the server values.
    pub fn include_empty(&self) -> bool {
        self.include_empty
    }

    /// Merge server values with the static groups. `None` when there is
    /// nothing to show.
    pub fn resolve(self, results: Vec<Suggestion>) -> Option<Suggestions> {
        let typed = self.request.typed();
        let mut values: Vec<Suggestion> = results
            .into_iter()
            .map(|s| s.highlighted(typed))
            .collect();
        if self.include_empty {
            values = append_empty(typed, values, self.max_suggestions);
        }
        let suggestions = Suggestions {
            operators: self.operators,
            values,
            functions: self.functions,
        }
        .finish(self.max_suggestions, self.open_paren);
        (!suggestions.is_empty()).then_some(suggestions)
    }
}

/// Chooses suggestions for a parse outcome from field and function metadata.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    metadata: JqlMetadata,
    max_suggestions: usize,
}

impl Dispatcher {
    pub fn new(metadata: JqlMetadata) -> Self {
        Dispatcher {
            metadata,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }

    pub fn with_max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    pub fn metadata(&self) -> &JqlMetadata {
        &self.metadata
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    /// Decide what to suggest after parsing the text up to the caret.
    pub fn plan(&self, outcome: &ParseOutcome) -> Plan {
        let result = outcome.result();
        let expectation = outcome.expectation();
        debug!(?expectation, input = outcome.input(), "dispatching suggestions");

        match expectation {
            Expectation::Field => {
                let typed = result.last_field_name().map(strip_escape_characters);
                let typed = typed.as_deref();
                self.show(
                    outcome,
                    Suggestions {
                        values: slim(typed, self.metadata.searchable_fields(), true),
                        functions: slim(typed, [NOT].iter(), true),
                        ..Default::default()
                    },
                )
            }
            Expectation::OperatorOrOperand => {
                let field = self.field(outcome);
                let parsed = outcome.parsed_operator();
                let operators = operators_for_field(parsed.as_deref(), OPERATORS, field);
                if operators.is_empty() {
                    return Plan::Hide;
                }
                let typed = incomplete_operator(outcome);
                self.operand(outcome, Some(typed), true, operators)
            }
            Expectation::Operator => {
                let field = self.field(outcome);
                self.show(
                    outcome,
                    Suggestions {
                        operators: operators_for_field(result.last_operator(), OPERATORS, field),
                        ..Default::default()
                    },
                )
            }
            Expectation::PredicateOperand => self.predicate_operand(outcome),
            Expectation::LogicalOperator {
                order_by,
                was_predicate,
            } => self.logical_operator(outcome, order_by, was_predicate),
            Expectation::OrderByField => {
                let typed = result
                    .last_order_by_field_name()
                    .map(strip_escape_characters);
                self.show(
                    outcome,
                    Suggestions {
                        values: slim(typed.as_deref(), self.metadata.orderable_fields(), true),
                        ..Default::default()
                    },
                )
            }
            Expectation::OrderByDirection => self.show(
                outcome,
                Suggestions {
                    values: slim(result.last_order_by_direction(), ORDER_BY_DIRECTIONS, false),
                    ..Default::default()
                },
            ),
            Expectation::Operand => {
                let field = self.field(outcome);
                let can_auto_complete =
                    !is_empty_only(result.last_operator()) && field.is_some_and(|f| f.auto);
                let typed = result.last_operand().map(strip_escape_characters);
                self.operand(outcome, typed, can_auto_complete, Vec::new())
            }
            Expectation::OrderBy => self.show(
                outcome,
                Suggestions {
                    values: slim(result.last_order_by(), LOGICAL_OPERATORS_AND_ORDER_BY, false),
                    ..Default::default()
                },
            ),
            Expectation::Nothing | Expectation::ListComma => Plan::Hide,
        }
    }

    fn field(&self, outcome: &ParseOutcome) -> Option<&FieldDescriptor> {
        outcome
            .result()
            .last_field_name()
            .and_then(|name| self.metadata.find_field(name))
    }

    fn show(&self, outcome: &ParseOutcome, suggestions: Suggestions) -> Plan {
        let suggestions =
            suggestions.finish(self.max_suggestions, outcome.result().needs_open_paren());
        if suggestions.is_empty() {
            Plan::Hide
        } else {
            Plan::Show(suggestions)
        }
    }

    /// Values and functions for the operand of the current clause.
    fn operand(
        &self,
        outcome: &ParseOutcome,
        typed: Option<String>,
        can_auto_complete: bool,
        operators: Vec<Suggestion>,
    ) -> Plan {
        let result = outcome.result();
        let operator = result.last_operator();
        let field = self.field(outcome);

        let empty = [empty_function()];
        let candidates: &[FunctionDescriptor] = if is_empty_only(operator) {
            &empty
        } else {
            &self.metadata.functions
        };
        let functions = functions_for_operand(typed.as_deref(), candidates, operator, field);

        if !can_auto_complete {
            return self.show(
                outcome,
                Suggestions {
                    operators,
                    functions,
                    ..Default::default()
                },
            );
        }

        let field_name = result.last_field_name().unwrap_or_default();
        Plan::Lookup(PendingLookup {
            request: LookupRequest::Field {
                field_name: strip_escape_characters(field_name),
                field_value: typed,
            },
            operators,
            functions,
            include_empty: is_was(operator),
            open_paren: result.needs_open_paren(),
            max_suggestions: self.max_suggestions,
        })
    }

    fn predicate_operand(&self, outcome: &ParseOutcome) -> Plan {
        let result = outcome.result();
        let predicate_name = result.last_was_predicate().unwrap_or_default();
        let predicate = find_predicate(predicate_name);
        let typed = result.last_operand().map(strip_escape_characters);
        let functions =
            functions_for_predicate(typed.as_deref(), &self.metadata.functions, predicate);

        if !predicate.is_some_and(|p| p.auto_complete) {
            return self.show(
                outcome,
                Suggestions {
                    functions,
                    ..Default::default()
                },
            );
        }

        Plan::Lookup(PendingLookup {
            request: LookupRequest::Predicate {
                predicate_name: strip_escape_characters(predicate_name),
                predicate_value: typed,
                field_name: result.last_field_name().map(str::to_string),
            },
            operators: Vec::new(),
            functions,
            include_empty: true,
            open_paren: result.needs_open_paren(),
            max_suggestions: self.max_suggestions,
        })
    }

    fn logical_operator(
        &self,
        outcome: &ParseOutcome,
        order_by: bool,
        was_predicate: bool,
    ) -> Plan {
        let result = outcome.result();
        let history = result.last_history_operator().or(result.last_operator());
        let predicates: &[Predicate] = if is_was(history) {
            WAS_PREDICATES
        } else {
            CHANGED_PREDICATES
        };
        let keywords = if order_by {
            LOGICAL_OPERATORS_AND_ORDER_BY
        } else {
            LOGICAL_OPERATORS
        };

        let (typed, candidates): (Option<&str>, Vec<&dyn Candidate>) = if was_predicate {
            let typed = if order_by {
                result.last_order_by().or(result.last_was_predicate())
            } else {
                result.last_was_predicate()
            };
            let candidates = predicates
                .iter()
                .map(|p| p as &dyn Candidate)
                .chain(keywords.iter().map(|k| k as &dyn Candidate))
                .collect();
            (typed, candidates)
        } else {
            let typed = if order_by {
                result.last_order_by().or(result.last_logical_operator())
            } else {
                result.last_logical_operator()
            };
            (typed, keywords.iter().map(|k| k as &dyn Candidate).collect())
        };

        self.show(
            outcome,
            Suggestions {
                values: slim(typed, candidates, false),
                ..Default::default()
            },
        )
    }
}

/// The word being typed after a `was` that may still grow into an operator.
///
/// Only the last space-separated word counts, and only once the text holds
/// more than two words and the parse recorded a field and an operator.
fn incomplete_operator(outcome: &ParseOutcome) -> String {
    if outcome.tokens().len() < 2 {
        return String::new();
    }
    let words: Vec<&str> = outcome.input().split(' ').collect();
    match words.as_slice() {
        [_, _, .., last] => last.to_string(),
        _ => String::new(),
    }
}

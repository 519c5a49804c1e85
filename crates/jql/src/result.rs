//! Parse result accumulator.
//!
//! A [`ParseResult`] is filled in while the parser walks the input. It is not
//! a syntax tree: it records the most recent value seen in each grammatical
//! category, where each value started, every raw token consumed, and what the
//! parser expects to see next. The expectation drives autocomplete.

use serde::Serialize;

use crate::text::{char_len, unquote};

/// What the parser expects at the end of the parsed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Expectation {
    /// The clause is complete; nothing to suggest.
    Nothing,
    Field,
    Operator,
    Operand,
    /// After `was`/`was not`: a sub-operator or a value may follow.
    OperatorOrOperand,
    /// Inside a list after whitespace; a `,` or `)` is due.
    ListComma,
    /// A logical connective. `order_by` is set when `ORDER BY` is also
    /// reachable (outside parentheses); `was_predicate` when a history
    /// predicate could follow instead.
    #[serde(rename_all = "camelCase")]
    LogicalOperator { order_by: bool, was_predicate: bool },
    /// Only the `ORDER BY` keyword itself.
    OrderBy,
    OrderByField,
    OrderByDirection,
    /// The value of a history predicate (`BEFORE <value>`).
    PredicateOperand,
}

/// Mutually exclusive core state. History predicates and predicate operands
/// are tracked beside it because they outlive most transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Needs {
    Nothing,
    Field,
    Operator,
    Operand,
    OperatorOrOperand,
    ListComma,
    LogicalOperator { order_by: bool },
    OrderBy,
    OrderByField,
    OrderByDirection,
}

/// Cursor position captured when a token is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub position: usize,
    pub input_len: usize,
}

impl Mark {
    /// Start index of a token that ends at this mark. An absent token is
    /// reported at the end of the input, where it was expected.
    fn start_of(&self, value: Option<&str>) -> usize {
        match value {
            Some(v) => self.position.saturating_sub(char_len(v)),
            None => self.input_len,
        }
    }
}

/// A recorded value and the index it started at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Slot {
    value: Option<String>,
    start: Option<usize>,
}

impl Slot {
    fn clear(&mut self) {
        self.value = None;
        self.start = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    tokens: Vec<Option<String>>,
    field_name: Slot,
    operator: Slot,
    operand: Slot,
    logical_operator: Slot,
    was_predicate: Slot,
    order_by: Slot,
    order_by_field: Slot,
    order_by_direction: Slot,
    history_operator: Option<String>,
    needs: Needs,
    predicate_operand: bool,
    was_predicate_pending: bool,
    needs_open_paren: bool,
    operand_complete: bool,
    must_be_operator_or_predicate: bool,
    error_message: Option<String>,
    error_index: Option<usize>,
}

impl Default for ParseResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseResult {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            field_name: Slot::default(),
            operator: Slot::default(),
            operand: Slot::default(),
            logical_operator: Slot::default(),
            was_predicate: Slot::default(),
            order_by: Slot::default(),
            order_by_field: Slot::default(),
            order_by_direction: Slot::default(),
            history_operator: None,
            needs: Needs::Nothing,
            predicate_operand: false,
            was_predicate_pending: false,
            needs_open_paren: false,
            operand_complete: false,
            must_be_operator_or_predicate: false,
            error_message: None,
            error_index: None,
        }
    }

    // ------------------------------------------------------------------
    // Expectation
    // ------------------------------------------------------------------

    /// The expectation a suggestion pass acts on.
    ///
    /// A pending predicate operand outranks everything except field and
    /// operator expectations.
    pub fn expectation(&self) -> Expectation {
        match self.needs {
            Needs::Field => return Expectation::Field,
            Needs::OperatorOrOperand => return Expectation::OperatorOrOperand,
            Needs::Operator => return Expectation::Operator,
            _ => {}
        }
        if self.predicate_operand {
            return Expectation::PredicateOperand;
        }
        match self.needs {
            Needs::LogicalOperator { order_by } => Expectation::LogicalOperator {
                order_by,
                was_predicate: self.was_predicate_pending,
            },
            Needs::OrderByField => Expectation::OrderByField,
            Needs::OrderByDirection => Expectation::OrderByDirection,
            Needs::Operand => Expectation::Operand,
            Needs::OrderBy => Expectation::OrderBy,
            Needs::ListComma => Expectation::ListComma,
            _ => Expectation::Nothing,
        }
    }

    pub(crate) fn set_needs_field(&mut self) {
        self.needs = Needs::Field;
        self.was_predicate_pending = false;
        self.history_operator = None;
    }

    pub(crate) fn set_needs_operator(&mut self) {
        self.needs = Needs::Operator;
    }

    pub(crate) fn set_needs_operand(&mut self) {
        self.needs = Needs::Operand;
    }

    pub(crate) fn set_needs_operand_or_operator(&mut self) {
        self.needs = Needs::OperatorOrOperand;
    }

    pub(crate) fn set_needs_list_comma(&mut self) {
        self.needs = Needs::ListComma;
    }

    /// Expect a logical connective. `ORDER BY` is reachable only at the top
    /// level, and a history operator keeps its predicates reachable.
    pub(crate) fn set_needs_logical_operator(&mut self, in_parens: bool) {
        self.needs = Needs::LogicalOperator {
            order_by: !in_parens,
        };
        if self.history_operator.is_some() {
            self.was_predicate_pending = true;
        }
    }

    /// Clear the `ORDER BY` reachability left over from a logical operator.
    pub(crate) fn clear_needs_order_by(&mut self) {
        self.needs = match self.needs {
            Needs::LogicalOperator { .. } => Needs::LogicalOperator { order_by: false },
            Needs::OrderBy => Needs::Nothing,
            other => other,
        };
    }

    pub(crate) fn set_needs_order_by_field(&mut self) {
        self.needs = Needs::OrderByField;
        self.order_by_direction.value = None;
    }

    pub(crate) fn set_needs_order_by_direction(&mut self) {
        self.needs = Needs::OrderByDirection;
    }

    pub(crate) fn set_needs_order_by_comma(&mut self) {
        self.needs = Needs::Nothing;
    }

    pub(crate) fn set_needs_predicate_operand(&mut self) {
        self.predicate_operand = true;
    }

    /// Drop the predicate operand expectation along with any operand one.
    pub(crate) fn reset_needs_predicate_operand(&mut self) {
        self.predicate_operand = false;
        self.needs = match self.needs {
            Needs::Operand => Needs::Nothing,
            Needs::OperatorOrOperand => Needs::Operator,
            other => other,
        };
    }

    pub(crate) fn set_needs_nothing(&mut self) {
        self.needs = Needs::Nothing;
        self.needs_open_paren = false;
        self.was_predicate_pending = false;
        self.predicate_operand = false;
        self.must_be_operator_or_predicate = false;
        self.history_operator = None;
    }

    pub(crate) fn set_needs_open_paren(&mut self, value: bool) {
        self.needs_open_paren = value;
    }

    pub(crate) fn set_operand_complete(&mut self) {
        self.operand_complete = true;
    }

    pub(crate) fn set_must_be_operator_or_predicate(&mut self, value: bool) {
        self.must_be_operator_or_predicate = value;
    }

    // ------------------------------------------------------------------
    // Resets
    // ------------------------------------------------------------------

    /// Forget the field, operator and operand of the clause just parsed.
    pub(crate) fn reset_terminal_clause(&mut self) {
        self.field_name.clear();
        self.operator.clear();
        self.operand.clear();
        self.needs = match self.needs {
            Needs::Field
            | Needs::Operator
            | Needs::Operand
            | Needs::OperatorOrOperand
            | Needs::ListComma => Needs::Nothing,
            other => other,
        };
        self.operand_complete = false;
        self.needs_open_paren = false;
        self.must_be_operator_or_predicate = false;
    }

    pub(crate) fn reset_logical_operators(&mut self) {
        self.logical_operator.clear();
        self.needs = match self.needs {
            Needs::LogicalOperator { order_by: true } => Needs::OrderBy,
            Needs::LogicalOperator { order_by: false } => Needs::Nothing,
            other => other,
        };
    }

    pub(crate) fn reset_last_predicates(&mut self) {
        self.logical_operator.value = None;
        self.was_predicate.clear();
        self.operand.clear();
    }

    // ------------------------------------------------------------------
    // Recorders
    // ------------------------------------------------------------------

    pub(crate) fn add_token(&mut self, token: &str) {
        self.tokens.push(Some(token.to_string()));
    }

    fn record(
        slot: &mut Slot,
        tokens: &mut Vec<Option<String>>,
        value: Option<&str>,
        start: Option<usize>,
    ) {
        slot.value = value.map(str::to_string);
        slot.start = start;
        tokens.push(value.map(str::to_string));
    }

    pub(crate) fn set_last_field_name(&mut self, value: Option<&str>, at: Mark) {
        Self::record(
            &mut self.field_name,
            &mut self.tokens,
            value,
            Some(at.start_of(value)),
        );
        self.field_name.value = value.map(unquote);
    }

    pub(crate) fn set_last_operator(&mut self, value: Option<&str>, start: usize) {
        Self::record(&mut self.operator, &mut self.tokens, value, Some(start));
    }

    pub(crate) fn set_last_history_operator(&mut self, value: &str) {
        self.history_operator = Some(value.to_string());
    }

    pub(crate) fn set_last_operand(&mut self, value: Option<&str>, at: Mark) {
        Self::record(
            &mut self.operand,
            &mut self.tokens,
            value,
            Some(at.start_of(value)),
        );
        self.operand.value = value.map(unquote);
    }

    pub(crate) fn set_last_operand_start(&mut self, start: usize) {
        self.operand.start = Some(start);
    }

    pub(crate) fn set_last_logical_operator(
        &mut self,
        value: Option<&str>,
        start: Option<usize>,
    ) {
        Self::record(&mut self.logical_operator, &mut self.tokens, value, start);
    }

    pub(crate) fn set_last_was_predicate(&mut self, value: Option<&str>, at: Mark) {
        Self::record(
            &mut self.was_predicate,
            &mut self.tokens,
            value,
            Some(at.start_of(value)),
        );
    }

    pub(crate) fn set_last_order_by(&mut self, value: Option<&str>, at: Mark) {
        Self::record(
            &mut self.order_by,
            &mut self.tokens,
            value,
            Some(at.start_of(value)),
        );
    }

    pub(crate) fn set_last_order_by_field_name(&mut self, value: Option<&str>, at: Mark) {
        Self::record(
            &mut self.order_by_field,
            &mut self.tokens,
            value,
            Some(at.start_of(value)),
        );
        self.order_by_field.value = value.map(unquote);
        self.order_by_direction.value = None;
    }

    pub(crate) fn set_last_order_by_direction(&mut self, value: Option<&str>, at: Mark) {
        Self::record(
            &mut self.order_by_direction,
            &mut self.tokens,
            value,
            Some(at.start_of(value)),
        );
    }

    pub(crate) fn set_parse_error(&mut self, message: String, index: usize) {
        self.error_message = Some(message);
        self.error_index = Some(index);
    }

    pub(crate) fn restore_error(&mut self, message: Option<String>, index: Option<usize>) {
        self.error_message = message;
        self.error_index = index;
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Every raw token recorded, in order. Absent tokens mark places where
    /// something was expected but not found.
    pub fn tokens(&self) -> &[Option<String>] {
        &self.tokens
    }

    pub fn last_field_name(&self) -> Option<&str> {
        self.field_name.value.as_deref()
    }

    pub fn field_name_start(&self) -> Option<usize> {
        self.field_name.start
    }

    /// The operator exactly as typed.
    pub fn last_operator(&self) -> Option<&str> {
        self.operator.value.as_deref()
    }

    pub fn operator_start(&self) -> Option<usize> {
        self.operator.start
    }

    pub fn last_operand(&self) -> Option<&str> {
        self.operand.value.as_deref()
    }

    pub fn operand_start(&self) -> Option<usize> {
        self.operand.start
    }

    pub fn last_logical_operator(&self) -> Option<&str> {
        self.logical_operator.value.as_deref()
    }

    pub fn logical_operator_start(&self) -> Option<usize> {
        self.logical_operator.start
    }

    pub fn last_was_predicate(&self) -> Option<&str> {
        self.was_predicate.value.as_deref()
    }

    pub fn was_predicate_start(&self) -> Option<usize> {
        self.was_predicate.start
    }

    pub fn last_order_by(&self) -> Option<&str> {
        self.order_by.value.as_deref()
    }

    pub fn order_by_start(&self) -> Option<usize> {
        self.order_by.start
    }

    pub fn last_order_by_field_name(&self) -> Option<&str> {
        self.order_by_field.value.as_deref()
    }

    pub fn order_by_field_start(&self) -> Option<usize> {
        self.order_by_field.start
    }

    pub fn last_order_by_direction(&self) -> Option<&str> {
        self.order_by_direction.value.as_deref()
    }

    pub fn order_by_direction_start(&self) -> Option<usize> {
        self.order_by_direction.start
    }

    /// The `was`/`changed` operator governing trailing predicates, if any.
    pub fn last_history_operator(&self) -> Option<&str> {
        self.history_operator.as_deref()
    }

    /// Whether a history predicate may follow the current clause.
    pub fn was_predicate_pending(&self) -> bool {
        self.was_predicate_pending
    }

    pub fn needs_open_paren(&self) -> bool {
        self.needs_open_paren
    }

    pub fn needs_list_comma(&self) -> bool {
        self.needs == Needs::ListComma
    }

    pub(crate) fn needs_order_by_field(&self) -> bool {
        self.needs == Needs::OrderByField
    }

    /// Set once a parenthesised list operand has been closed.
    pub fn operand_complete(&self) -> bool {
        self.operand_complete
    }

    pub fn must_be_operator_or_predicate(&self) -> bool {
        self.must_be_operator_or_predicate
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn error_index(&self) -> Option<usize> {
        self.error_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(position: usize, input_len: usize) -> Mark {
        Mark {
            position,
            input_len,
        }
    }

    #[test]
    fn test_start_index_from_mark() {
        let mut result = ParseResult::new();
        result.set_last_field_name(Some("status"), mark(6, 10));
        assert_eq!(result.field_name_start(), Some(0));

        result.set_last_operand(None, mark(6, 10));
        assert_eq!(result.operand_start(), Some(10));
        assert_eq!(result.last_operand(), None);
    }

    #[test]
    fn test_recorded_values_are_unquoted_but_tokens_raw() {
        let mut result = ParseResult::new();
        result.set_last_field_name(Some("\"Story Points\""), mark(14, 14));
        assert_eq!(result.last_field_name(), Some("Story Points"));
        assert_eq!(result.tokens(), &[Some("\"Story Points\"".to_string())]);
    }

    #[test]
    fn test_operand_or_operator_is_one_state() {
        let mut result = ParseResult::new();
        result.set_needs_operand_or_operator();
        assert_eq!(result.expectation(), Expectation::OperatorOrOperand);

        result.reset_needs_predicate_operand();
        assert_eq!(result.expectation(), Expectation::Operator);
    }

    #[test]
    fn test_logical_operator_infers_order_by_and_predicates() {
        let mut result = ParseResult::new();
        result.set_needs_logical_operator(false);
        assert_eq!(
            result.expectation(),
            Expectation::LogicalOperator {
                order_by: true,
                was_predicate: false
            }
        );

        result.set_last_history_operator("was");
        result.set_needs_logical_operator(true);
        assert_eq!(
            result.expectation(),
            Expectation::LogicalOperator {
                order_by: false,
                was_predicate: true
            }
        );
    }

    #[test]
    fn test_reset_logical_operators_leaves_order_by() {
        let mut result = ParseResult::new();
        result.set_needs_logical_operator(false);
        result.reset_logical_operators();
        assert_eq!(result.expectation(), Expectation::OrderBy);

        result.clear_needs_order_by();
        assert_eq!(result.expectation(), Expectation::Nothing);
    }

    #[test]
    fn test_predicate_operand_overrides_logical_operator() {
        let mut result = ParseResult::new();
        result.set_needs_logical_operator(false);
        result.set_needs_predicate_operand();
        assert_eq!(result.expectation(), Expectation::PredicateOperand);

        result.reset_needs_predicate_operand();
        assert!(matches!(
            result.expectation(),
            Expectation::LogicalOperator { .. }
        ));
    }

    #[test]
    fn test_needs_field_clears_history() {
        let mut result = ParseResult::new();
        result.set_last_history_operator("was");
        result.set_needs_logical_operator(false);
        assert!(result.was_predicate_pending());

        result.set_needs_field();
        assert!(!result.was_predicate_pending());
        assert_eq!(result.last_history_operator(), None);
        assert_eq!(result.expectation(), Expectation::Field);
    }

    #[test]
    fn test_reset_terminal_clause_keeps_order_by_states() {
        let mut result = ParseResult::new();
        result.set_needs_order_by_direction();
        result.reset_terminal_clause();
        assert_eq!(result.expectation(), Expectation::OrderByDirection);

        result.set_needs_operand();
        result.reset_terminal_clause();
        assert_eq!(result.expectation(), Expectation::Nothing);
    }

    #[test]
    fn test_order_by_field_clears_direction() {
        let mut result = ParseResult::new();
        result.set_last_order_by_direction(Some("asc"), mark(10, 10));
        result.set_last_order_by_field_name(Some("created"), mark(18, 18));
        assert_eq!(result.last_order_by_direction(), None);
        assert_eq!(result.tokens().len(), 2);
    }
}

//! Rule matching against one input vector.

use std::collections::BTreeMap;

use crate::expr::MatchExpr;
use crate::types::{DecisionTable, EngineError, Rule, Value};

/// Typed inputs keyed by input column id.
pub type TypedInputs = BTreeMap<String, Value>;

/// True when every input column of `table` matches `rule`.
///
/// A declared input column without a supplied value is a validation error,
/// never an implicit wildcard. So is a rule missing an expression for a
/// declared input column.
pub fn matches(
    rule: &Rule,
    table: &DecisionTable,
    inputs: &TypedInputs,
) -> Result<bool, EngineError> {
    for column in table.inputs() {
        let value = inputs.get(&column.id).ok_or_else(|| {
            EngineError::validation(column.id.as_str(), "missing input value")
        })?;
        let raw = rule.inputs.get(&column.id).ok_or_else(|| {
            EngineError::validation(
                column.id.as_str(),
                format!("rule {} has no expression for this column", rule.id),
            )
        })?;
        if !MatchExpr::parse(raw, column)?.test(value, &column.id)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// The rules of `rules` that match, in the order given.
pub fn matching_rules<'r>(
    rules: &'r [Rule],
    table: &DecisionTable,
    inputs: &TypedInputs,
) -> Result<Vec<&'r Rule>, EngineError> {
    let mut hits = Vec::new();
    for rule in rules {
        if matches(rule, table, inputs)? {
            hits.push(rule);
        }
    }
    Ok(hits)
}

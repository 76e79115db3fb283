//! Rule repository.
//!
//! Rules are appended to a table and never mutated. Each rule is stored under
//! a key ordered by its sequence index, so listing a table's rules is one
//! prefix scan that already yields rule order.

use std::collections::BTreeMap;

use ledgerdmn_storage::KeyValueStore;

use crate::codec::{self, Asset};
use crate::config::EngineConfig;
use crate::expr::{MatchExpr, NumericExpr, WILDCARD};
use crate::ledger::Ledger;
use crate::schema::load_table;
use crate::types::{ColumnSchema, ColumnType, DecisionTable, EngineError, Rule, Value};
use crate::validate::{check_in_domain, check_keys};

/// AddRule: validate and append a rule, returning its id.
pub fn add_rule<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    config: &EngineConfig,
    table_id: &str,
    input_matches: BTreeMap<String, String>,
    output_values: BTreeMap<String, String>,
    priority: i64,
) -> Result<String, EngineError> {
    let table = load_table(ledger, table_id)?;
    validate_rule(&table, &input_matches, &output_values)?;

    let sequence = ledger.count(&codec::rule_prefix(table_id))?;
    if !config.allows_another_rule(sequence) {
        return Err(EngineError::validation(
            "tableId",
            format!(
                "table '{}' already holds the maximum of {} rules",
                table_id, config.max_rules_per_table
            ),
        ));
    }

    let rule = Rule {
        id: Rule::id_for_sequence(sequence),
        table_id: table_id.to_string(),
        sequence,
        priority,
        inputs: input_matches,
        outputs: output_values,
    };
    let rule_id = rule.id.clone();
    ledger.put(&codec::rule_key(table_id, sequence), &Asset::Rule(rule))?;
    tracing::info!(table_id, rule_id = %rule_id, sequence, priority, "rule added");
    Ok(rule_id)
}

/// ListRules: every rule of the table, ascending by sequence index.
pub fn list_rules<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    table_id: &str,
) -> Result<Vec<Rule>, EngineError> {
    ledger.get_table(table_id)?;
    load_rules(ledger, table_id)
}

/// Rules under the table's prefix, without checking the table exists.
pub(crate) fn load_rules<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    table_id: &str,
) -> Result<Vec<Rule>, EngineError> {
    ledger
        .scan(&codec::rule_prefix(table_id))?
        .into_iter()
        .map(|(key, asset)| match asset {
            Asset::Rule(rule) => Ok(rule),
            other => Err(EngineError::Codec {
                key,
                message: format!("expected a rule, found {}", other.kind()),
            }),
        })
        .collect()
}

fn validate_rule(
    table: &DecisionTable,
    input_matches: &BTreeMap<String, String>,
    output_values: &BTreeMap<String, String>,
) -> Result<(), EngineError> {
    check_keys(
        "inputMatches",
        table.inputs().map(|c| c.id.as_str()),
        input_matches,
    )?;
    check_keys(
        "outputValues",
        table.outputs().map(|c| c.id.as_str()),
        output_values,
    )?;

    for column in table.inputs() {
        check_match_expression(column, &input_matches[&column.id])?;
    }
    for column in table.outputs() {
        check_output_literal(column, &output_values[&column.id])?;
    }
    Ok(())
}

fn check_match_expression(column: &ColumnSchema, raw: &str) -> Result<(), EngineError> {
    match MatchExpr::parse(raw, column)? {
        MatchExpr::Any | MatchExpr::Number(_) => Ok(()),
        MatchExpr::Bool(b) => check_in_domain(column, &Value::Bool(b)),
        MatchExpr::Label(label) => {
            let value = match column.column_type {
                ColumnType::Enum => Value::Enum(label),
                _ => Value::Text(label),
            };
            check_in_domain(column, &value)
        }
    }
}

/// Output cells are literals: no wildcard, no comparison or range.
fn check_output_literal(column: &ColumnSchema, raw: &str) -> Result<(), EngineError> {
    if raw.trim() == WILDCARD {
        return Err(EngineError::validation(
            column.id.as_str(),
            "the wildcard is not allowed on an OUTPUT column",
        ));
    }
    if column.column_type == ColumnType::Number
        && NumericExpr::parse(raw, &column.id)?.as_literal().is_none()
    {
        return Err(EngineError::validation(
            column.id.as_str(),
            format!("output '{}' must be a number literal", raw),
        ));
    }
    let value = Value::parse(raw, column)?;
    check_in_domain(column, &value)
}

//! Execute: load, match, resolve.
//!
//! One execution reads the table, its columns and its rules once, binds and
//! validates the supplied inputs, tests every rule, and hands the matching set
//! to the hit policy resolver. Nothing is written unless auditing is enabled,
//! and then only after every read.

use std::collections::BTreeMap;

use ledgerdmn_storage::KeyValueStore;

use crate::audit;
use crate::config::EngineConfig;
use crate::hit_policy;
use crate::ledger::Ledger;
use crate::matcher::{matching_rules, TypedInputs};
use crate::rules::load_rules;
use crate::schema::load_table;
use crate::types::{DecisionTable, EngineError, ExecutionResult, InputVector, Value};
use crate::validate::{check_in_domain, check_keys};

/// Execute a table against named input values.
pub fn execute<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    config: &EngineConfig,
    table_id: &str,
    inputs: &InputVector,
) -> Result<ExecutionResult, EngineError> {
    let table = load_table(ledger, table_id)?;
    execute_loaded(ledger, config, &table, inputs)
}

/// Execute a table against values given positionally, in the order of the
/// table's INPUT columns.
pub fn execute_positional<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    config: &EngineConfig,
    table_id: &str,
    values: &[String],
) -> Result<ExecutionResult, EngineError> {
    let table = load_table(ledger, table_id)?;
    let input_ids: Vec<&str> = table.inputs().map(|c| c.id.as_str()).collect();
    if input_ids.len() != values.len() {
        return Err(EngineError::validation(
            "inputValues",
            format!(
                "expected {} values for columns {:?}, got {}",
                input_ids.len(),
                input_ids,
                values.len()
            ),
        ));
    }
    let inputs: InputVector = input_ids
        .iter()
        .zip(values)
        .map(|(id, value)| (id.to_string(), value.clone()))
        .collect();
    execute_loaded(ledger, config, &table, &inputs)
}

fn execute_loaded<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    config: &EngineConfig,
    table: &DecisionTable,
    inputs: &InputVector,
) -> Result<ExecutionResult, EngineError> {
    let rules = load_rules(ledger, table.id())?;
    let typed = bind_inputs(table, inputs)?;
    let hits = matching_rules(&rules, table, &typed)?;
    tracing::debug!(
        table_id = table.id(),
        policy = %table.hit_policy(),
        rules = rules.len(),
        matched = hits.len(),
        "rules matched"
    );

    let resolution = hit_policy::resolve(table, inputs, &hits).inspect_err(|e| {
        if e.is_domain_outcome() {
            tracing::warn!(table_id = table.id(), code = e.code(), "{}", e);
        }
    })?;

    let result = ExecutionResult {
        table_id: table.id().to_string(),
        inputs: inputs.clone(),
        outputs: resolution.outputs,
        matched_rule_ids: resolution.matched_rule_ids,
    };
    if config.audit_executions {
        audit::append(ledger, &result)?;
    }
    Ok(result)
}

/// Validate supplied inputs against the table's INPUT columns and type them.
///
/// Missing or extra columns, malformed values and values outside a column's
/// domain are all validation errors.
pub fn bind_inputs(
    table: &DecisionTable,
    inputs: &InputVector,
) -> Result<TypedInputs, EngineError> {
    check_keys("inputValues", table.inputs().map(|c| c.id.as_str()), inputs)?;
    let mut typed = BTreeMap::new();
    for column in table.inputs() {
        let value = Value::parse(&inputs[&column.id], column)?;
        check_in_domain(column, &value)?;
        typed.insert(column.id.clone(), value);
    }
    Ok(typed)
}

/// Convert a JSON object of inputs to their canonical string forms.
///
/// Strings pass through, numbers and booleans use their JSON spelling. Any
/// other JSON type is a validation error.
pub fn inputs_from_json(value: &serde_json::Value) -> Result<InputVector, EngineError> {
    let object = value
        .as_object()
        .ok_or_else(|| EngineError::validation("inputValues", "expected a JSON object"))?;
    object
        .iter()
        .map(|(key, v)| {
            let text = match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(EngineError::validation(
                        key.as_str(),
                        format!("unsupported JSON input {}", other),
                    ))
                }
            };
            Ok((key.clone(), text))
        })
        .collect()
}

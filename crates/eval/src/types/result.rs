use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Input column id -> supplied value.
pub type InputVector = BTreeMap<String, String>;

/// Output column id -> produced value.
pub type OutputVector = BTreeMap<String, String>;

/// The outcome of one Execute call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub table_id: String,
    pub inputs: InputVector,
    /// One entry for single-hit policies, zero or more for collecting ones.
    pub outputs: Vec<OutputVector>,
    /// Every matching rule, ascending by sequence index.
    pub matched_rule_ids: Vec<String>,
}

impl ExecutionResult {
    /// The single output vector, when exactly one was produced.
    pub fn single_output(&self) -> Option<&OutputVector> {
        match self.outputs.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

//! A single row of a decision table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One rule: a match expression per input column and a literal per output
/// column. Never mutated after AddRule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique within the owning table.
    pub id: String,
    pub table_id: String,
    /// Insertion order within the table, starting at 0.
    pub sequence: u64,
    #[serde(default)]
    pub priority: i64,
    /// Input column id -> match expression.
    pub inputs: BTreeMap<String, String>,
    /// Output column id -> literal value.
    pub outputs: BTreeMap<String, String>,
}

impl Rule {
    /// Rule ids are derived from the sequence index: `rule1`, `rule2`, ...
    pub fn id_for_sequence(sequence: u64) -> String {
        format!("rule{}", sequence + 1)
    }
}

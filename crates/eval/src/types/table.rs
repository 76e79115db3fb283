//! Table schema and hit policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ColumnSchema, EngineError};

/// How a set of simultaneously matching rules is reduced to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HitPolicy {
    Unique,
    First,
    Priority,
    Any,
    Collect,
    RuleOrder,
    OutputOrder,
}

impl HitPolicy {
    pub const ALL: [HitPolicy; 7] = [
        HitPolicy::Unique,
        HitPolicy::First,
        HitPolicy::Priority,
        HitPolicy::Any,
        HitPolicy::Collect,
        HitPolicy::RuleOrder,
        HitPolicy::OutputOrder,
    ];

    /// Single-answer policies return exactly one output vector.
    pub fn is_single_hit(self) -> bool {
        matches!(
            self,
            HitPolicy::Unique | HitPolicy::First | HitPolicy::Priority | HitPolicy::Any
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HitPolicy::Unique => "UNIQUE",
            HitPolicy::First => "FIRST",
            HitPolicy::Priority => "PRIORITY",
            HitPolicy::Any => "ANY",
            HitPolicy::Collect => "COLLECT",
            HitPolicy::RuleOrder => "RULE_ORDER",
            HitPolicy::OutputOrder => "OUTPUT_ORDER",
        }
    }
}

impl FromStr for HitPolicy {
    type Err = EngineError;

    /// Accepts the policy names with `_`, `-` or space separators in any case,
    /// and the DMN single-letter abbreviations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        match normalized.as_str() {
            "UNIQUE" | "U" => Ok(HitPolicy::Unique),
            "FIRST" | "F" => Ok(HitPolicy::First),
            "PRIORITY" | "P" => Ok(HitPolicy::Priority),
            "ANY" | "A" => Ok(HitPolicy::Any),
            "COLLECT" | "C" => Ok(HitPolicy::Collect),
            "RULE_ORDER" | "R" => Ok(HitPolicy::RuleOrder),
            "OUTPUT_ORDER" | "O" => Ok(HitPolicy::OutputOrder),
            _ => {
                let known: Vec<&str> = HitPolicy::ALL.iter().map(|p| p.as_str()).collect();
                Err(EngineError::validation(
                    "hitPolicy",
                    format!("unknown hit policy '{}', expected one of {}", s, known.join(", ")),
                ))
            }
        }
    }
}

impl fmt::Display for HitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named decision table. Holds column ids only, never column copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub id: String,
    pub name: String,
    /// Declared column order; also the row ordering contract.
    pub column_ids: Vec<String>,
    pub hit_policy: HitPolicy,
}

/// A table schema with its referenced columns resolved, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTable {
    pub schema: TableSchema,
    pub columns: Vec<ColumnSchema>,
}

impl DecisionTable {
    pub fn id(&self) -> &str {
        &self.schema.id
    }

    pub fn hit_policy(&self) -> HitPolicy {
        self.schema.hit_policy
    }

    pub fn inputs(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|c| c.is_input())
    }

    pub fn outputs(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|c| c.is_output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_separators_and_abbreviations() {
        assert_eq!("rule order".parse::<HitPolicy>().unwrap(), HitPolicy::RuleOrder);
        assert_eq!("output-order".parse::<HitPolicy>().unwrap(), HitPolicy::OutputOrder);
        assert_eq!("U".parse::<HitPolicy>().unwrap(), HitPolicy::Unique);
        assert_eq!("priority".parse::<HitPolicy>().unwrap(), HitPolicy::Priority);
    }

    #[test]
    fn unknown_policy_is_validation_error() {
        let err = "SOMETIMES".parse::<HitPolicy>().unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "hitPolicy"));
        assert!(err.to_string().contains("UNIQUE, FIRST, PRIORITY"));
        assert!(err.to_string().contains("OUTPUT_ORDER"));
    }

    #[test]
    fn display_round_trips_every_policy() {
        for policy in HitPolicy::ALL {
            assert_eq!(policy.to_string().parse::<HitPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn single_hit_policies() {
        assert!(HitPolicy::Unique.is_single_hit());
        assert!(HitPolicy::Any.is_single_hit());
        assert!(!HitPolicy::Collect.is_single_hit());
        assert!(!HitPolicy::OutputOrder.is_single_hit());
    }
}

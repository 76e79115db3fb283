//! Schema, rule and result types for the decision engine.
//!
//! Every type here is persisted through the host store, so each one fixes its
//! own field order and uses `BTreeMap` for keyed collections. The same
//! logical record always serializes to the same bytes.

pub mod column;
pub mod result;
pub mod rule;
pub mod table;
pub mod values;

use std::collections::BTreeMap;

use ledgerdmn_storage::StorageError;

pub use column::{ColumnSchema, ColumnType, Direction};
pub use result::{ExecutionResult, InputVector, OutputVector};
pub use rule::Rule;
pub use table::{DecisionTable, HitPolicy, TableSchema};
pub use values::Value;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors returned by every engine operation.
///
/// `NoMatch` and `HitPolicyConflict` are domain outcomes of a well-formed
/// execution, not defects; callers can tell them apart with
/// [`EngineError::is_domain_outcome`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// An asset is already stored under this id.
    #[error("asset {id} already exists")]
    AlreadyExists { id: String },

    /// No asset of the requested kind is stored under this id.
    #[error("asset {id} does not exist")]
    NotFound { id: String },

    /// A parameter failed validation. Always raised before any write.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// No rule of the table matched the inputs.
    #[error("no rule of table {table_id} matches inputs {inputs:?}")]
    NoMatch {
        table_id: String,
        inputs: BTreeMap<String, String>,
    },

    /// More than one rule matched where the hit policy forbids it.
    #[error("hit policy conflict in table {table_id}: rules {matched_rule_ids:?} match")]
    HitPolicyConflict {
        table_id: String,
        matched_rule_ids: Vec<String>,
    },

    /// The host store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A stored record could not be encoded or decoded.
    #[error("cannot encode or decode record at {key:?}: {message}")]
    Codec { key: String, message: String },
}

impl EngineError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(id: impl Into<String>) -> Self {
        EngineError::NotFound { id: id.into() }
    }

    /// Stable machine-readable error code.
    ///
    /// `ASSET_NOT_FOUND` and `ASSET_ALREADY_EXISTS` keep the codes the ledger
    /// contract has always reported.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::AlreadyExists { .. } => "ASSET_ALREADY_EXISTS",
            EngineError::NotFound { .. } => "ASSET_NOT_FOUND",
            EngineError::Validation { .. } => "VALIDATION",
            EngineError::NoMatch { .. } => "NO_MATCH",
            EngineError::HitPolicyConflict { .. } => "HIT_POLICY_CONFLICT",
            EngineError::Storage(_) => "STORAGE",
            EngineError::Codec { .. } => "CODEC",
        }
    }

    /// True for outcomes of a successful evaluation that produced no single
    /// answer (no rule applies, or the hit policy rejects the match set).
    pub fn is_domain_outcome(&self) -> bool {
        matches!(
            self,
            EngineError::NoMatch { .. } | EngineError::HitPolicyConflict { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            EngineError::AlreadyExists { id: "t".into() }.code(),
            "ASSET_ALREADY_EXISTS"
        );
        assert_eq!(EngineError::not_found("t").code(), "ASSET_NOT_FOUND");
        assert_eq!(EngineError::validation("f", "r").code(), "VALIDATION");
        assert_eq!(
            EngineError::Storage(StorageError::Backend("down".into())).code(),
            "STORAGE"
        );
    }

    #[test]
    fn domain_outcomes_are_distinguishable() {
        let no_match = EngineError::NoMatch {
            table_id: "t".into(),
            inputs: BTreeMap::new(),
        };
        let conflict = EngineError::HitPolicyConflict {
            table_id: "t".into(),
            matched_rule_ids: vec!["rule1".into(), "rule2".into()],
        };
        assert!(no_match.is_domain_outcome());
        assert!(conflict.is_domain_outcome());
        assert!(!EngineError::not_found("t").is_domain_outcome());
        assert!(!EngineError::validation("f", "r").is_domain_outcome());
    }

    #[test]
    fn display_names_the_asset() {
        let err = EngineError::AlreadyExists { id: "age".into() };
        assert_eq!(err.to_string(), "asset age already exists");
    }
}

//! Key layout and stable record encoding.
//!
//! Tables and columns share one keyspace keyed by their raw id. Rules and
//! audit records live under NUL-separated composite keys so a prefix scan
//! yields one table's records in sequence order:
//!
//! ```text
//! {id}                                   column or table
//! \0rule\0{table_id}\0{sequence:020}     rule
//! \0audit\0{table_id}\0{index:020}       audit record
//! ```
//!
//! Values are compact JSON of a `kind`-tagged [`Asset`]. Struct field order is
//! fixed by declaration and maps are `BTreeMap`s, so equal records always
//! encode to equal bytes on every replica.

use serde::{Deserialize, Serialize};

use crate::audit::AuditRecord;
use crate::types::{ColumnSchema, EngineError, Rule, TableSchema};

/// Every record the engine stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Asset {
    Column(ColumnSchema),
    Table(TableSchema),
    Rule(Rule),
    Audit(AuditRecord),
}

impl Asset {
    pub fn kind(&self) -> &'static str {
        match self {
            Asset::Column(_) => "column",
            Asset::Table(_) => "table",
            Asset::Rule(_) => "rule",
            Asset::Audit(_) => "audit",
        }
    }
}

pub fn rule_prefix(table_id: &str) -> String {
    format!("\0rule\0{}\0", table_id)
}

pub fn rule_key(table_id: &str, sequence: u64) -> String {
    format!("{}{:020}", rule_prefix(table_id), sequence)
}

pub fn audit_prefix(table_id: &str) -> String {
    format!("\0audit\0{}\0", table_id)
}

pub fn audit_key(table_id: &str, index: u64) -> String {
    format!("{}{:020}", audit_prefix(table_id), index)
}

pub fn encode(key: &str, asset: &Asset) -> Result<Vec<u8>, EngineError> {
    serde_json::to_vec(asset).map_err(|e| EngineError::Codec {
        key: key.to_string(),
        message: e.to_string(),
    })
}

pub fn decode(key: &str, bytes: &[u8]) -> Result<Asset, EngineError> {
    serde_json::from_slice(bytes).map_err(|e| EngineError::Codec {
        key: key.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnType, Direction, HitPolicy};
    use std::collections::BTreeMap;

    #[test]
    fn column_encoding_is_exact() {
        let asset = Asset::Column(ColumnSchema::new(
            "tier",
            vec!["gold".into(), "silver".into()],
            ColumnType::Enum,
            Direction::Input,
        ));
        let bytes = encode("tier", &asset).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"kind":"column","id":"tier","direction":"INPUT","type":"ENUM","domain":["gold","silver"]}"#
        );
    }

    #[test]
    fn rule_maps_encode_in_key_order() {
        let mut inputs = BTreeMap::new();
        inputs.insert("zeta".to_string(), "-".to_string());
        inputs.insert("alpha".to_string(), "1".to_string());
        let rule = Rule {
            id: "rule1".into(),
            table_id: "t".into(),
            sequence: 0,
            priority: 0,
            inputs,
            outputs: BTreeMap::new(),
        };
        let text = String::from_utf8(encode("k", &Asset::Rule(rule)).unwrap()).unwrap();
        assert!(text.find("alpha").unwrap() < text.find("zeta").unwrap());
    }

    #[test]
    fn decode_round_trips_table() {
        let table = Asset::Table(TableSchema {
            id: "eligibility".into(),
            name: "Eligibility".into(),
            column_ids: vec!["age".into(), "eligible".into()],
            hit_policy: HitPolicy::RuleOrder,
        });
        let bytes = encode("eligibility", &table).unwrap();
        assert_eq!(decode("eligibility", &bytes).unwrap(), table);
        assert!(String::from_utf8(bytes).unwrap().contains(r#""hit_policy":"RULE_ORDER""#));
    }

    #[test]
    fn garbage_is_codec_error() {
        let err = decode("k", b"not json").unwrap_err();
        assert_eq!(err.code(), "CODEC");
    }

    #[test]
    fn rule_keys_sort_by_sequence() {
        assert!(rule_key("t", 9) < rule_key("t", 10));
        assert!(rule_key("t", 0).starts_with(&rule_prefix("t")));
        assert!(!rule_key("t2", 0).starts_with(&rule_prefix("t")));
    }
}

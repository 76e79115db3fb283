//! Shared validation helpers. Every check here runs before any write.

use std::collections::{BTreeMap, BTreeSet};

use crate::expr::{NumericExpr, WILDCARD};
use crate::types::{ColumnSchema, ColumnType, EngineError, Value};

/// Ids become store keys; they must be non-empty and free of the NUL key
/// separator.
pub fn check_id(field: &str, id: &str) -> Result<(), EngineError> {
    if id.trim().is_empty() {
        return Err(EngineError::validation(field, "id must not be empty"));
    }
    if id.contains('\0') {
        return Err(EngineError::validation(
            field,
            "id must not contain NUL characters",
        ));
    }
    Ok(())
}

/// Check a column's domain against its type.
pub fn check_domain(column: &ColumnSchema, require_string_domain: bool) -> Result<(), EngineError> {
    let mut seen = BTreeSet::new();
    for label in &column.domain {
        if !seen.insert(label.as_str()) {
            return Err(EngineError::validation(
                "domain",
                format!("duplicate domain entry '{}'", label),
            ));
        }
    }

    match column.column_type {
        ColumnType::Enum if column.domain.is_empty() => Err(EngineError::validation(
            "domain",
            "ENUM columns require a non-empty domain",
        )),
        ColumnType::String if require_string_domain && column.domain.is_empty() => {
            Err(EngineError::validation(
                "domain",
                "STRING columns require a non-empty domain",
            ))
        }
        ColumnType::Number => {
            for entry in &column.domain {
                NumericExpr::parse(entry, "domain")?;
            }
            Ok(())
        }
        ColumnType::Boolean => {
            for entry in &column.domain {
                if entry != "true" && entry != "false" {
                    return Err(EngineError::validation(
                        "domain",
                        format!("BOOLEAN domain entry '{}' is not true or false", entry),
                    ));
                }
            }
            Ok(())
        }
        _ => {
            if column.domain.iter().any(|l| l == WILDCARD) {
                return Err(EngineError::validation(
                    "domain",
                    format!("'{}' is reserved for the wildcard", WILDCARD),
                ));
            }
            Ok(())
        }
    }
}

/// Check that a typed value lies in its column's domain.
///
/// Label domains require membership. A NUMBER domain requires the value to
/// satisfy at least one of its expressions. Empty domains accept any value
/// of the right type.
pub fn check_in_domain(column: &ColumnSchema, value: &Value) -> Result<(), EngineError> {
    if column.domain.is_empty() {
        return Ok(());
    }
    let covered = match value {
        Value::Number(n) => {
            let mut covered = false;
            for entry in &column.domain {
                if NumericExpr::parse(entry, &column.id)?.test(*n) {
                    covered = true;
                    break;
                }
            }
            covered
        }
        Value::Bool(b) => column.domain_position(if *b { "true" } else { "false" }).is_some(),
        Value::Text(label) | Value::Enum(label) => column.domain_position(label).is_some(),
    };
    if covered {
        Ok(())
    } else {
        Err(EngineError::validation(
            column.id.as_str(),
            format!("value {:?} is outside the domain {:?}", value, column.domain),
        ))
    }
}

/// Check that the keys of `supplied` are exactly `expected`.
pub fn check_keys<'a, V>(
    field: &str,
    expected: impl IntoIterator<Item = &'a str>,
    supplied: &BTreeMap<String, V>,
) -> Result<(), EngineError> {
    let expected: BTreeSet<&str> = expected.into_iter().collect();
    let missing: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|k| !supplied.contains_key(*k))
        .collect();
    let extra: Vec<&str> = supplied
        .keys()
        .map(String::as_str)
        .filter(|k| !expected.contains(k))
        .collect();
    if missing.is_empty() && extra.is_empty() {
        return Ok(());
    }
    let mut reasons = Vec::new();
    if !missing.is_empty() {
        reasons.push(format!("missing columns {:?}", missing));
    }
    if !extra.is_empty() {
        reasons.push(format!("unexpected columns {:?}", extra));
    }
    Err(EngineError::validation(field, reasons.join("; ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;
    use rust_decimal::Decimal;

    fn col(column_type: ColumnType, domain: &[&str]) -> ColumnSchema {
        ColumnSchema::new(
            "c",
            domain.iter().map(|s| s.to_string()).collect(),
            column_type,
            Direction::Input,
        )
    }

    #[test]
    fn ids_must_be_usable_as_keys() {
        assert!(check_id("id", "age").is_ok());
        assert!(check_id("id", "  ").is_err());
        assert!(check_id("id", "a\0b").is_err());
    }

    #[test]
    fn enum_requires_unique_non_empty_domain() {
        assert!(check_domain(&col(ColumnType::Enum, &[]), false).is_err());
        assert!(check_domain(&col(ColumnType::Enum, &["a", "a"]), false).is_err());
        assert!(check_domain(&col(ColumnType::Enum, &["a", "b"]), false).is_ok());
    }

    #[test]
    fn string_domain_requirement_follows_config() {
        assert!(check_domain(&col(ColumnType::String, &[]), false).is_ok());
        assert!(check_domain(&col(ColumnType::String, &[]), true).is_err());
    }

    #[test]
    fn number_domain_entries_must_parse() {
        assert!(check_domain(&col(ColumnType::Number, &["<18", "18..65", ">65"]), false).is_ok());
        assert!(check_domain(&col(ColumnType::Number, &["young"]), false).is_err());
    }

    #[test]
    fn boolean_domain_is_true_false_subset() {
        assert!(check_domain(&col(ColumnType::Boolean, &["true"]), false).is_ok());
        assert!(check_domain(&col(ColumnType::Boolean, &["yes"]), false).is_err());
    }

    #[test]
    fn wildcard_is_not_a_label() {
        assert!(check_domain(&col(ColumnType::Enum, &["-", "a"]), false).is_err());
    }

    #[test]
    fn number_in_range_domain() {
        let age = col(ColumnType::Number, &["<18", "18..65", ">65"]);
        assert!(check_in_domain(&age, &Value::Number(Decimal::from(200))).is_ok());
        let bounded = col(ColumnType::Number, &["0..10"]);
        assert!(check_in_domain(&bounded, &Value::Number(Decimal::from(11))).is_err());
    }

    #[test]
    fn label_membership() {
        let tier = col(ColumnType::Enum, &["gold", "silver"]);
        assert!(check_in_domain(&tier, &Value::Enum("gold".into())).is_ok());
        assert!(check_in_domain(&tier, &Value::Enum("bronze".into())).is_err());
    }

    #[test]
    fn keys_report_missing_and_extra() {
        let mut supplied = BTreeMap::new();
        supplied.insert("age".to_string(), "40".to_string());
        supplied.insert("bogus".to_string(), "1".to_string());
        let err = check_keys("inputs", ["age", "income"], &supplied).unwrap_err();
        match err {
            EngineError::Validation { field, reason } => {
                assert_eq!(field, "inputs");
                assert!(reason.contains("income"));
                assert!(reason.contains("bogus"));
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }
}

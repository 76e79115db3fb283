//! Typed runtime values.

use rust_decimal::Decimal;

use super::{ColumnSchema, ColumnType, EngineError};
use crate::numeric::parse_decimal;

/// A supplied or produced value, interpreted per its column's type.
/// Numbers are exact decimals, never `f64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Number(Decimal),
    Bool(bool),
    Enum(String),
}

impl Value {
    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "STRING",
            Value::Number(_) => "NUMBER",
            Value::Bool(_) => "BOOLEAN",
            Value::Enum(_) => "ENUM",
        }
    }

    /// Interpret `raw` as a value of `column`'s type.
    ///
    /// Malformed numbers and booleans are validation errors naming the column.
    pub fn parse(raw: &str, column: &ColumnSchema) -> Result<Value, EngineError> {
        match column.column_type {
            ColumnType::String => Ok(Value::Text(raw.to_string())),
            ColumnType::Enum => Ok(Value::Enum(raw.to_string())),
            ColumnType::Number => parse_decimal(raw, &column.id).map(Value::Number),
            ColumnType::Boolean => parse_bool(raw, &column.id).map(Value::Bool),
        }
    }

    /// The label of a STRING or ENUM value.
    pub fn as_label(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }
}

/// Booleans are spelled exactly `true` or `false`.
pub fn parse_bool(raw: &str, field: &str) -> Result<bool, EngineError> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(EngineError::validation(
            field,
            format!("'{}' is not a boolean (expected true or false)", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn column(column_type: ColumnType) -> ColumnSchema {
        ColumnSchema::new("c", vec![], column_type, Direction::Input)
    }

    #[test]
    fn numbers_compare_by_value() {
        let a = Value::parse("1.50", &column(ColumnType::Number)).unwrap();
        let b = Value::parse("1.5", &column(ColumnType::Number)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_number_names_column() {
        let err = Value::parse("forty", &column(ColumnType::Number)).unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == "c"));
    }

    #[test]
    fn booleans_are_exact() {
        assert_eq!(
            Value::parse("true", &column(ColumnType::Boolean)).unwrap(),
            Value::Bool(true)
        );
        assert!(Value::parse("yes", &column(ColumnType::Boolean)).is_err());
    }

    #[test]
    fn labels_keep_their_text() {
        let v = Value::parse("gold", &column(ColumnType::Enum)).unwrap();
        assert_eq!(v.as_label(), Some("gold"));
        assert_eq!(v.type_name(), "ENUM");
    }
}

//! Column schema: one typed, optionally enumerated input or output field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::EngineError;

/// Whether a column is read from the caller or produced by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// Map the ledger contract's integer flag: `0` is input, `1` is output.
    pub fn from_code(code: i64) -> Result<Direction, EngineError> {
        match code {
            0 => Ok(Direction::Input),
            1 => Ok(Direction::Output),
            other => Err(EngineError::validation(
                "direction",
                format!("unknown direction code {}", other),
            )),
        }
    }
}

impl FromStr for Direction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return Direction::from_code(code);
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "INPUT" => Ok(Direction::Input),
            "OUTPUT" => Ok(Direction::Output),
            _ => Err(EngineError::validation(
                "direction",
                format!("unknown direction '{}'", s),
            )),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "INPUT"),
            Direction::Output => write!(f, "OUTPUT"),
        }
    }
}

/// Value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Enum,
}

impl FromStr for ColumnType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STRING" => Ok(ColumnType::String),
            "NUMBER" => Ok(ColumnType::Number),
            "BOOLEAN" => Ok(ColumnType::Boolean),
            "ENUM" => Ok(ColumnType::Enum),
            _ => Err(EngineError::validation(
                "type",
                format!("unknown column type '{}'", s),
            )),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::String => "STRING",
            ColumnType::Number => "NUMBER",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Enum => "ENUM",
        };
        f.write_str(name)
    }
}

/// A column definition. Immutable once created; tables refer to it by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub id: String,
    pub direction: Direction,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Permitted labels (ENUM, STRING) or numeric expressions (NUMBER), in
    /// declaration order.
    pub domain: Vec<String>,
}

impl ColumnSchema {
    pub fn new(
        id: impl Into<String>,
        domain: Vec<String>,
        column_type: ColumnType,
        direction: Direction,
    ) -> Self {
        ColumnSchema {
            id: id.into(),
            direction,
            column_type,
            domain,
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == Direction::Output
    }

    /// True when values must be one of the domain labels.
    pub fn has_label_domain(&self) -> bool {
        match self.column_type {
            ColumnType::Enum => true,
            ColumnType::String | ColumnType::Boolean => !self.domain.is_empty(),
            ColumnType::Number => false,
        }
    }

    /// Position of `label` in the domain, if present.
    pub fn domain_position(&self, label: &str) -> Option<usize> {
        self.domain.iter().position(|d| d == label)
    }
}

//! Rule match expressions.
//!
//! Grammar, per input column type:
//!
//! - any type: `-` matches every supplied value
//! - NUMBER: `x`, `=x`, `!=x`, `<x`, `<=x`, `>x`, `>=x`, `a..b` (closed),
//!   `[a..b]`, `[a..b)`, `(a..b]`, `(a..b)`
//! - BOOLEAN: `true`, `false`
//! - STRING / ENUM: the exact label

use std::fmt;

use rust_decimal::Decimal;

use crate::numeric::{compare_decimals, parse_decimal, CmpOp};
use crate::types::values::parse_bool;
use crate::types::{ColumnSchema, ColumnType, EngineError, Value};

/// The match-anything expression.
pub const WILDCARD: &str = "-";

/// One end of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBound {
    pub value: Decimal,
    pub inclusive: bool,
}

/// A parsed NUMBER expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericExpr {
    /// `x` is `Compare(Eq, x)`.
    Compare(CmpOp, Decimal),
    Range { lower: RangeBound, upper: RangeBound },
}

impl NumericExpr {
    pub fn parse(raw: &str, field: &str) -> Result<NumericExpr, EngineError> {
        let s = raw.trim();
        for (prefix, op) in [
            ("<=", CmpOp::Le),
            (">=", CmpOp::Ge),
            ("!=", CmpOp::Ne),
            ("<", CmpOp::Lt),
            (">", CmpOp::Gt),
            ("=", CmpOp::Eq),
        ] {
            if let Some(rest) = s.strip_prefix(prefix) {
                return Ok(NumericExpr::Compare(op, parse_decimal(rest, field)?));
            }
        }
        if s.contains("..") {
            return parse_range(s, field);
        }
        Ok(NumericExpr::Compare(CmpOp::Eq, parse_decimal(s, field)?))
    }

    pub fn test(&self, value: Decimal) -> bool {
        match self {
            NumericExpr::Compare(op, bound) => compare_decimals(value, *bound, *op),
            NumericExpr::Range { lower, upper } => {
                let above = if lower.inclusive {
                    value >= lower.value
                } else {
                    value > lower.value
                };
                let below = if upper.inclusive {
                    value <= upper.value
                } else {
                    value < upper.value
                };
                above && below
            }
        }
    }

    /// The value of a plain literal expression.
    pub fn as_literal(&self) -> Option<Decimal> {
        match self {
            NumericExpr::Compare(CmpOp::Eq, v) => Some(*v),
            _ => None,
        }
    }
}

fn parse_range(s: &str, field: &str) -> Result<NumericExpr, EngineError> {
    let (lower_inclusive, body, upper_inclusive) = match (s.chars().next(), s.chars().last()) {
        (Some(open @ ('[' | '(')), Some(close @ (']' | ')'))) if s.len() >= 2 => {
            (open == '[', &s[1..s.len() - 1], close == ']')
        }
        (Some('[' | '('), _) | (_, Some(']' | ')')) => {
            return Err(EngineError::validation(
                field,
                format!("unbalanced brackets in range '{}'", s),
            ));
        }
        _ => (true, s, true),
    };
    let (lo, hi) = body
        .split_once("..")
        .ok_or_else(|| EngineError::validation(field, format!("malformed range '{}'", s)))?;
    let lower = RangeBound {
        value: parse_decimal(lo, field)?,
        inclusive: lower_inclusive,
    };
    let upper = RangeBound {
        value: parse_decimal(hi, field)?,
        inclusive: upper_inclusive,
    };
    let empty = lower.value > upper.value
        || (lower.value == upper.value && !(lower.inclusive && upper.inclusive));
    if empty {
        return Err(EngineError::validation(
            field,
            format!("range '{}' contains no values", s),
        ));
    }
    Ok(NumericExpr::Range { lower, upper })
}

impl fmt::Display for NumericExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericExpr::Compare(CmpOp::Eq, v) => write!(f, "{}", v),
            NumericExpr::Compare(op, v) => write!(f, "{}{}", op.symbol(), v),
            NumericExpr::Range { lower, upper } => write!(
                f,
                "{}{}..{}{}",
                if lower.inclusive { '[' } else { '(' },
                lower.value,
                upper.value,
                if upper.inclusive { ']' } else { ')' }
            ),
        }
    }
}

/// A parsed input match expression, typed by its column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchExpr {
    Any,
    Number(NumericExpr),
    Bool(bool),
    Label(String),
}

impl MatchExpr {
    /// Parse `raw` against `column`'s type. Domain membership is checked by
    /// the caller.
    pub fn parse(raw: &str, column: &ColumnSchema) -> Result<MatchExpr, EngineError> {
        if raw.trim() == WILDCARD {
            return Ok(MatchExpr::Any);
        }
        match column.column_type {
            ColumnType::Number => NumericExpr::parse(raw, &column.id).map(MatchExpr::Number),
            ColumnType::Boolean => parse_bool(raw, &column.id).map(MatchExpr::Bool),
            ColumnType::String | ColumnType::Enum => Ok(MatchExpr::Label(raw.to_string())),
        }
    }

    /// Test a supplied value. A value of a different type than the expression
    /// is a validation error, not a non-match.
    pub fn test(&self, value: &Value, field: &str) -> Result<bool, EngineError> {
        match (self, value) {
            (MatchExpr::Any, _) => Ok(true),
            (MatchExpr::Number(expr), Value::Number(v)) => Ok(expr.test(*v)),
            (MatchExpr::Bool(expected), Value::Bool(v)) => Ok(expected == v),
            (MatchExpr::Label(label), Value::Text(v) | Value::Enum(v)) => Ok(label == v),
            (_, other) => Err(EngineError::validation(
                field,
                format!("cannot match {} value against {:?}", other.type_name(), self),
            )),
        }
    }
}

//! Exact numeric handling using `rust_decimal`.
//!
//! Every NUMBER value and bound is a `rust_decimal::Decimal`. No `f64`
//! anywhere in the matching path, so every replica compares identically.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::types::EngineError;

/// A comparison operator usable in a NUMBER match expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// Parse a decimal literal. Surrounding whitespace is ignored.
pub fn parse_decimal(raw: &str, field: &str) -> Result<Decimal, EngineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EngineError::validation(field, "empty number"));
    }
    Decimal::from_str(trimmed).map_err(|e| {
        EngineError::validation(field, format!("'{}' is not a number: {}", trimmed, e))
    })
}

/// Compare `l` against `r` with `op`.
pub fn compare_decimals(l: Decimal, r: Decimal, op: CmpOp) -> bool {
    match op {
        CmpOp::Eq => l == r,
        CmpOp::Ne => l != r,
        CmpOp::Lt => l < r,
        CmpOp::Le => l <= r,
        CmpOp::Gt => l > r,
        CmpOp::Ge => l >= r,
    }
}

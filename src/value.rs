use std::{cmp::Ordering, fmt};

use crate::{
    ast::BinaryOp,
    diagnostics::{error_at, DiagnosticKind, Result},
};

/// A script value. Truth is encoded as `Int(1)` / `Int(-1)`; conditions
/// test `value > 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    String(String),
}

impl Value {
    pub const TRUE: Value = Value::Int(1);
    pub const FALSE: Value = Value::Int(-1);
    pub const ZERO: Value = Value::Int(0);

    pub fn int(value: i64) -> Self {
        Value::Int(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    pub fn bool(value: bool) -> Self {
        if value {
            Value::TRUE
        } else {
            Value::FALSE
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::String(_) => "String",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Int(_) => None,
            Value::String(s) => Some(s),
        }
    }

    /// Truth test used by conditions and `&&` / `||`. Only integers have a
    /// truth value.
    pub fn is_true(&self, line: usize) -> Result<bool> {
        match self {
            Value::Int(n) => Ok(*n > 0),
            Value::String(_) => Err(error_at(
                DiagnosticKind::Type,
                "a String cannot be used as a condition",
                line,
            )),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

/// Applies a binary operator. Both operands are already evaluated.
pub fn binary(op: BinaryOp, lhs: &Value, rhs: &Value, line: usize) -> Result<Value> {
    match op {
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Int(a), Value::Int(b)) => checked(a.checked_add(*b), op, line),
            _ => Ok(Value::String(format!("{lhs}{rhs}"))),
        },
        BinaryOp::Sub => {
            let (a, b) = integers(op, lhs, rhs, line)?;
            checked(a.checked_sub(b), op, line)
        }
        BinaryOp::Mul => {
            let (a, b) = integers(op, lhs, rhs, line)?;
            checked(a.checked_mul(b), op, line)
        }
        BinaryOp::Div => {
            let (a, b) = integers(op, lhs, rhs, line)?;
            if b == 0 {
                return Err(error_at(DiagnosticKind::Arithmetic, "division by zero", line));
            }
            checked(a.checked_div(b), op, line)
        }
        BinaryOp::Mod => {
            let (a, b) = integers(op, lhs, rhs, line)?;
            if b == 0 {
                return Err(error_at(DiagnosticKind::Arithmetic, "modulo by zero", line));
            }
            checked(a.checked_rem(b), op, line)
        }
        BinaryOp::Less => compare(op, lhs, rhs, line).map(|o| Value::bool(o == Ordering::Less)),
        BinaryOp::Greater => {
            compare(op, lhs, rhs, line).map(|o| Value::bool(o == Ordering::Greater))
        }
        BinaryOp::LessEqual => {
            compare(op, lhs, rhs, line).map(|o| Value::bool(o != Ordering::Greater))
        }
        BinaryOp::GreaterEqual => {
            compare(op, lhs, rhs, line).map(|o| Value::bool(o != Ordering::Less))
        }
        BinaryOp::Equal => Ok(Value::bool(lhs == rhs)),
        BinaryOp::And => {
            let left = lhs.is_true(line)?;
            let right = rhs.is_true(line)?;
            Ok(Value::bool(left && right))
        }
        BinaryOp::Or => {
            let left = lhs.is_true(line)?;
            let right = rhs.is_true(line)?;
            Ok(Value::bool(left || right))
        }
    }
}

fn integers(op: BinaryOp, lhs: &Value, rhs: &Value, line: usize) -> Result<(i64, i64)> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok((*a, *b)),
        _ => Err(operand_error(op, lhs, rhs, line)),
    }
}

/// Int/Int compares numerically, String/String by code point. Mixing the
/// two is rejected.
fn compare(op: BinaryOp, lhs: &Value, rhs: &Value, line: usize) -> Result<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(a.chars().cmp(b.chars())),
        _ => Err(operand_error(op, lhs, rhs, line)),
    }
}

fn checked(result: Option<i64>, op: BinaryOp, line: usize) -> Result<Value> {
    result.map(Value::Int).ok_or_else(|| {
        error_at(
            DiagnosticKind::Arithmetic,
            format!("integer overflow in `{}`", op.symbol()),
            line,
        )
    })
}

fn operand_error(op: BinaryOp, lhs: &Value, rhs: &Value, line: usize) -> crate::SlothError {
    error_at(
        DiagnosticKind::Type,
        format!(
            "unsupported operand types for `{}`: {} and {}",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ),
        line,
    )
}

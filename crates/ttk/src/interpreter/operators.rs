//! Binary operator semantics.

use crate::parser::ast::BinaryOp;
use crate::types::{Exception, Value};

/// Numeric view for comparison: numbers, booleans and strings that parse
/// as numbers.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::Null | Value::List(_) | Value::Map(_) | Value::Function(_) | Value::Error(_) => None,
        other => other.to_f64(),
    }
}

/// Equality as used by `==` and `SWITCH`: numeric when both sides are
/// numeric, otherwise by string value.
pub(crate) fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (numeric(lhs), numeric(rhs)) {
        (Some(a), Some(b)) => a == b,
        _ => lhs.to_string() == rhs.to_string(),
    }
}

/// Apply a non-short-circuiting binary operator.
pub(crate) fn apply(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, Exception> {
    let value = match op {
        BinaryOp::Eq => Value::Bool(loose_eq(lhs, rhs)),
        BinaryOp::Ne => Value::Bool(!loose_eq(lhs, rhs)),
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
            let ordering = match (numeric(lhs), numeric(rhs)) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => Some(lhs.to_string().cmp(&rhs.to_string())),
            };
            Value::Bool(ordering.is_some_and(|o| match op {
                BinaryOp::Lt => o.is_lt(),
                BinaryOp::Gt => o.is_gt(),
                BinaryOp::Le => o.is_le(),
                _ => o.is_ge(),
            }))
        }
        BinaryOp::Cat => Value::String(format!("{lhs}{rhs}")),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => arithmetic(op, lhs, rhs),
        BinaryOp::Div => {
            let divisor = number(rhs);
            if divisor == 0.0 {
                return Err(Exception::undef("division by zero"));
            }
            Value::Float(number(lhs) / divisor)
        }
        BinaryOp::Mod | BinaryOp::IntDiv => {
            let (a, b) = (integer(lhs), integer(rhs));
            let result = if op == BinaryOp::Mod {
                a.checked_rem(b)
            } else {
                a.checked_div(b)
            };
            match result {
                Some(n) => Value::Integer(n),
                None if b == 0 => return Err(Exception::undef("division by zero")),
                None => Value::Float(number(lhs) / number(rhs)),
            }
        }
        BinaryOp::And | BinaryOp::Or => {
            // Short-circuiting forms are evaluated by the caller.
            let decided = if op == BinaryOp::And {
                lhs.is_truthy() && rhs.is_truthy()
            } else {
                lhs.is_truthy() || rhs.is_truthy()
            };
            Value::Bool(decided)
        }
    };
    Ok(value)
}

/// `+`, `-` and `*`: integer arithmetic when both operands are integral,
/// falling back to floating point on overflow or fractional input.
fn arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    if let (Some(a), Some(b)) = (integral(lhs), integral(rhs)) {
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            _ => a.checked_mul(b),
        };
        if let Some(n) = result {
            return Value::Integer(n);
        }
    }
    let (a, b) = (number(lhs), number(rhs));
    Value::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        _ => a * b,
    })
}

/// Non-numeric operands count as zero.
fn number(value: &Value) -> f64 {
    numeric(value).unwrap_or(0.0)
}

fn integer(value: &Value) -> i64 {
    numeric(value).map_or(0, |_| value.to_i64().unwrap_or(0))
}

fn integral(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(n) => Some(*n),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Null => Some(0),
        _ => None,
    }
}

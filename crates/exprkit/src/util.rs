//! Coercions shared by the operator families.

use crate::error::EvalError;
use crate::value::{decimal_to_f64, Value};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Numeric view of a value: numbers and decimals directly, strings when they
/// parse as a float.
pub fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Decimal(d) => decimal_to_f64(d),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

pub fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Decimal(d) => Some(*d),
        Value::Number(n) => Decimal::from_f64(*n),
        Value::String(s) => Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .ok(),
        _ => None,
    }
}

/// Truncates to a signed 64-bit integer, as the bitmask operators need.
pub fn to_i64(value: &Value) -> Option<i64> {
    to_f64(value).map(|n| n as i64)
}

/// Boolean view of a value. Numbers are true when non-zero; the strings
/// `true` and `false` are accepted in any case; a missing field is false.
pub fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Missing => Some(false),
        Value::Number(n) => Some(*n != 0.0),
        Value::Decimal(d) => Some(!d.is_zero()),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Text view of any non-nil value.
pub fn to_text(value: &Value) -> Option<String> {
    if value.is_nil() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn type_mismatch(operator: &str, value: &Value, expected: &'static str) -> EvalError {
    EvalError::TypeMismatch {
        operator: operator.to_string(),
        value: value.to_string(),
        actual: value.type_name(),
        expected,
    }
}

/// Wraps a finite float result, rejecting overflow to infinity.
pub fn number(operator: &str, n: f64) -> Result<Value, EvalError> {
    if n.is_infinite() {
        return Err(EvalError::Overflow(operator.to_string()));
    }
    Ok(Value::Number(n))
}

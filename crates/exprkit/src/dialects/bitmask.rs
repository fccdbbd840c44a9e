//! Bitwise operators over 64-bit integer truncations.

use crate::error::EvalError;
use crate::language::Language;
use crate::util;
use crate::value::Value;

fn bits(n: i64) -> Result<Value, EvalError> {
    Ok(Value::Number(n as f64))
}

fn shift_left(a: f64, b: f64) -> Result<Value, EvalError> {
    let shifted = u32::try_from(b as i64)
        .ok()
        .and_then(|b| (a as i64).checked_shl(b))
        .unwrap_or(0);
    bits(shifted)
}

// Out-of-range shifts saturate to the sign, like an arithmetic shift would.
fn shift_right(a: f64, b: f64) -> Result<Value, EvalError> {
    let a = a as i64;
    let shifted = u32::try_from(b as i64)
        .ok()
        .and_then(|b| a.checked_shr(b))
        .unwrap_or(if a < 0 { -1 } else { 0 });
    bits(shifted)
}

fn complement(value: Value) -> Result<Value, EvalError> {
    let n = util::to_i64(&value).ok_or_else(|| util::type_mismatch("~", &value, "number"))?;
    bits(!n)
}

/// `^ & | << >>` and prefix `~`. Operands are converted to numbers and
/// truncated to 64-bit integers.
pub fn bitmask() -> Language {
    Language::compose([
        Language::infix_number_operator("^", |a, b| bits(a as i64 ^ b as i64)),
        Language::infix_number_operator("&", |a, b| bits(a as i64 & b as i64)),
        Language::infix_number_operator("|", |a, b| bits(a as i64 | b as i64)),
        Language::infix_number_operator("<<", shift_left),
        Language::infix_number_operator(">>", shift_right),
        Language::prefix_operator("~", complement),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expression: &str) -> Value {
        Language::compose([crate::dialects::arithmetic(), bitmask()])
            .evaluate(expression, &Value::Null)
            .unwrap()
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(eval("6 & 3"), Value::Number(2.0));
        assert_eq!(eval("6 | 3"), Value::Number(7.0));
        assert_eq!(eval("6 ^ 3"), Value::Number(5.0));
        assert_eq!(eval("~0"), Value::Number(-1.0));
        assert_eq!(eval("5.9 & 7"), Value::Number(5.0));
    }

    #[test]
    fn test_shifts() {
        assert_eq!(eval("1 << 4"), Value::Number(16.0));
        assert_eq!(eval("256 >> 4"), Value::Number(16.0));
        assert_eq!(eval("1 << 64"), Value::Number(0.0));
        assert_eq!(eval("-8 >> 70"), Value::Number(-1.0));
        assert_eq!(eval("1 << -1"), Value::Number(0.0));
    }

    #[test]
    fn test_shift_binds_looser_than_addition() {
        assert_eq!(eval("1 << 2 + 1"), Value::Number(8.0));
    }
}

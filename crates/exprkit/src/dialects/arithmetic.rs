//! Floating point arithmetic and numeric order.

use super::base::base;
use crate::error::EvalError;
use crate::language::Language;
use crate::util;
use crate::value::Value;

fn divide(a: f64, b: f64) -> Result<Value, EvalError> {
    if b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    util::number("/", a / b)
}

fn modulo(a: f64, b: f64) -> Result<Value, EvalError> {
    if b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(Value::Number(a % b))
}

/// `+ - * / % **`, `< <= > >=` and numeric `== !=` over numbers, on top of
/// [`base`]. Operands that are not numbers are converted when possible, so
/// `"1" + 2` is `3`.
pub fn arithmetic() -> Language {
    Language::compose([
        Language::infix_number_operator("+", |a, b| util::number("+", a + b)),
        Language::infix_number_operator("-", |a, b| util::number("-", a - b)),
        Language::infix_number_operator("*", |a, b| util::number("*", a * b)),
        Language::infix_number_operator("/", divide),
        Language::infix_number_operator("%", modulo),
        Language::infix_number_operator("**", |a, b| util::number("**", a.powf(b))),
        Language::infix_number_operator(">", |a, b| Ok(Value::Bool(a > b))),
        Language::infix_number_operator(">=", |a, b| Ok(Value::Bool(a >= b))),
        Language::infix_number_operator("<", |a, b| Ok(Value::Bool(a < b))),
        Language::infix_number_operator("<=", |a, b| Ok(Value::Bool(a <= b))),
        Language::infix_number_operator("==", |a, b| Ok(Value::Bool(a == b))),
        Language::infix_number_operator("!=", |a, b| Ok(Value::Bool(a != b))),
        base(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expression: &str) -> Result<Value, crate::Error> {
        arithmetic().evaluate(expression, &Value::Null)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2 + 3 * 4"), Ok(Value::Number(14.0)));
        assert_eq!(eval("(2 + 3) * 4"), Ok(Value::Number(20.0)));
        assert_eq!(eval("10 - 4 - 3"), Ok(Value::Number(3.0)));
        assert_eq!(eval("2 ** 3 ** 2"), Ok(Value::Number(512.0)));
        assert_eq!(eval("7 % 4 * 2"), Ok(Value::Number(6.0)));
    }

    #[test]
    fn test_string_operands_are_converted() {
        assert_eq!(eval("\"1\" + 2"), Ok(Value::Number(3.0)));
        assert_eq!(eval("\"10\" > 9"), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_division_by_zero() {
        let err = eval("1 / 0").unwrap_err();
        assert_eq!(err.as_eval(), Some(&EvalError::DivisionByZero));
        assert!(eval("1 % 0").is_err());
    }

    #[test]
    fn test_mismatch_names_operand() {
        let err = eval("1 + true").unwrap_err();
        assert_eq!(err.to_string(), "unexpected true (bool) for operator +, expected number");
    }
}

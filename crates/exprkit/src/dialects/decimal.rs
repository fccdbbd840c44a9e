//! Arbitrary precision decimal arithmetic for money-like values.

use super::base::{base, hex_digits};
use crate::error::{EvalError, ParseError};
use crate::evaluable::Evaluable;
use crate::language::Language;
use crate::parser::Parser;
use crate::util;
use crate::value::Value;
use exprkit_scanner::TokenKind;
use rust_decimal::{Decimal, MathematicalOps};
use std::str::FromStr;

fn checked(operator: &str, result: Option<Decimal>) -> Result<Value, EvalError> {
    result
        .map(Value::Decimal)
        .ok_or_else(|| EvalError::Overflow(operator.to_string()))
}

fn divide(a: Decimal, b: Decimal) -> Result<Value, EvalError> {
    if b.is_zero() {
        return Err(EvalError::DivisionByZero);
    }
    checked("/", a.checked_div(b))
}

fn modulo(a: Decimal, b: Decimal) -> Result<Value, EvalError> {
    if b.is_zero() {
        return Err(EvalError::DivisionByZero);
    }
    checked("%", a.checked_rem(b))
}

fn parse_decimal(p: &mut Parser<'_>) -> Result<Evaluable, ParseError> {
    let text = p.token_text();
    let parsed = match hex_digits(text) {
        Some(digits) => i64::from_str_radix(digits, 16).ok().map(Decimal::from),
        None => Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .ok(),
    };
    parsed
        .map(|d| p.constant(d))
        .ok_or_else(|| ParseError::InvalidNumber(text.to_string()))
}

fn negate(value: Value) -> Result<Value, EvalError> {
    util::to_decimal(&value)
        .map(|d| Value::Decimal(-d))
        .ok_or_else(|| util::type_mismatch("-", &value, "decimal"))
}

/// The [`super::arithmetic`] operators over decimals. Number literals
/// parse to decimals and unary `-` yields decimals, so `0.1 + 0.2 == 0.3`
/// holds exactly.
pub fn decimal_arithmetic() -> Language {
    Language::compose([
        Language::infix_decimal_operator("+", |a, b| checked("+", a.checked_add(b))),
        Language::infix_decimal_operator("-", |a, b| checked("-", a.checked_sub(b))),
        Language::infix_decimal_operator("*", |a, b| checked("*", a.checked_mul(b))),
        Language::infix_decimal_operator("/", divide),
        Language::infix_decimal_operator("%", modulo),
        Language::infix_decimal_operator("**", |a, b| checked("**", a.checked_powd(b))),
        Language::infix_decimal_operator(">", |a, b| Ok(Value::Bool(a > b))),
        Language::infix_decimal_operator(">=", |a, b| Ok(Value::Bool(a >= b))),
        Language::infix_decimal_operator("<", |a, b| Ok(Value::Bool(a < b))),
        Language::infix_decimal_operator("<=", |a, b| Ok(Value::Bool(a <= b))),
        Language::infix_decimal_operator("==", |a, b| Ok(Value::Bool(a == b))),
        Language::infix_decimal_operator("!=", |a, b| Ok(Value::Bool(a != b))),
        base(),
        Language::prefix_extension(TokenKind::Int, parse_decimal),
        Language::prefix_extension(TokenKind::Float, parse_decimal),
        Language::prefix_operator("-", negate),
    ])
}

//! Literals, variables, parentheses, generic equality and the precedence table.

use crate::error::{EvalError, ParseError};
use crate::evaluable::{Evaluable, Evaluables};
use crate::language::Language;
use crate::parser::Parser;
use crate::util;
use crate::value::Value;
use exprkit_scanner::{unquote, TokenKind};

const PRECEDENCES: &[(&str, i32)] = &[
    ("??", 0),
    ("||", 20),
    ("&&", 21),
    ("==", 40),
    ("!=", 40),
    (">", 40),
    (">=", 40),
    ("<", 40),
    ("<=", 40),
    ("=~", 40),
    ("!~", 40),
    ("in", 40),
    ("sw", 40),
    ("co", 40),
    ("ew", 40),
    ("mw", 40),
    ("cfa", 40),
    ("cfm", 40),
    ("^", 60),
    ("&", 60),
    ("|", 60),
    ("<<", 90),
    (">>", 90),
    ("+", 120),
    ("-", 120),
    ("*", 150),
    ("/", 150),
    ("%", 150),
];

/// Number, string, char and raw string literals, unary `-`, `true`, `false`
/// and `nil`, generic `==` and `!=`, parentheses, variables and the
/// precedence of every built-in operator.
///
/// `**` is the only right-associative operator: `2 ** 3 ** 2` is `512`.
pub fn base() -> Language {
    let mut parts = vec![
        Language::prefix_extension(TokenKind::Int, parse_number),
        Language::prefix_extension(TokenKind::Float, parse_number),
        Language::prefix_operator("-", negate),
        Language::prefix_extension(TokenKind::String, parse_string),
        Language::prefix_extension(TokenKind::Char, parse_string),
        Language::prefix_extension(TokenKind::RawString, parse_string),
        Language::constant("true", true),
        Language::constant("false", false),
        Language::constant("nil", Value::Null),
        Language::infix_operator("==", |a, b| Ok(Value::Bool(a == b))),
        Language::infix_operator("!=", |a, b| Ok(Value::Bool(a != b))),
        parentheses(),
    ];
    parts.extend(PRECEDENCES.iter().map(|(name, level)| Language::precedence(name, *level)));
    parts.push(Language::right_associative("**", 200));
    parts.push(ident());
    Language::compose(parts)
}

/// `( expr )`.
pub fn parentheses() -> Language {
    Language::prefix_extension(TokenKind::Symbol('('), parse_parentheses)
}

/// Variable paths (`a.b[expr]`) and calls of functions found in the input.
pub fn ident() -> Language {
    Language::prefix_extension(TokenKind::Ident, parse_ident)
}

pub(crate) fn parse_number(p: &mut Parser<'_>) -> Result<Evaluable, ParseError> {
    let text = p.token_text();
    let parsed = match hex_digits(text) {
        Some(digits) => i64::from_str_radix(digits, 16).ok().map(|n| n as f64),
        None => text.parse::<f64>().ok(),
    };
    parsed
        .map(|n| p.constant(n))
        .ok_or_else(|| ParseError::InvalidNumber(text.to_string()))
}

pub(crate) fn hex_digits(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

fn parse_string(p: &mut Parser<'_>) -> Result<Evaluable, ParseError> {
    let text = p.token_text();
    let s = unquote(text).map_err(|source| ParseError::InvalidString {
        text: text.to_string(),
        source,
    })?;
    Ok(p.constant(s))
}

fn negate(value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Decimal(d) => Ok(Value::Decimal(-d)),
        other => util::to_f64(&other)
            .map(|n| Value::Number(-n))
            .ok_or_else(|| util::type_mismatch("-", &other, "number")),
    }
}

fn parse_parentheses(p: &mut Parser<'_>) -> Result<Evaluable, ParseError> {
    let inner = p.parse_expression()?;
    match p.scan() {
        TokenKind::Symbol(')') => Ok(inner),
        _ => Err(p.expected("parentheses", &[TokenKind::Symbol(')')])),
    }
}

fn parse_ident(p: &mut Parser<'_>) -> Result<Evaluable, ParseError> {
    let mut path = vec![p.constant(p.token_text())];
    loop {
        match p.scan() {
            TokenKind::Symbol('.') => match p.scan() {
                TokenKind::Ident => path.push(p.constant(p.token_text())),
                _ => return Err(p.expected("field", &[TokenKind::Ident])),
            },
            TokenKind::Symbol('[') => {
                let key = p.parse_expression()?;
                match p.scan() {
                    TokenKind::Symbol(']') => path.push(key),
                    _ => return Err(p.expected("array key", &[TokenKind::Symbol(']')])),
                }
            }
            TokenKind::Symbol('(') => {
                let args = p.parse_arguments()?;
                let name = display_path(&path);
                return Ok(call(name, p.var(path), args));
            }
            _ => {
                p.camouflage(
                    "variable",
                    &[TokenKind::Symbol('.'), TokenKind::Symbol('('), TokenKind::Symbol('[')],
                );
                return Ok(p.var(path));
            }
        }
    }
}

fn display_path(path: &[Evaluable]) -> String {
    path.iter()
        .map(|key| key.const_value().map_or_else(|| "[..]".to_string(), Value::to_string))
        .collect::<Vec<_>>()
        .join(".")
}

fn call(name: String, callee: Evaluable, args: Vec<Evaluable>) -> Evaluable {
    Evaluable::new(move |ctx, input| {
        let function = callee.eval(ctx, input).map_err(|err| match err {
            EvalError::UnknownParameter { .. } => EvalError::UnknownFunction { name: name.clone() },
            other => other,
        })?;
        let Value::Function(function) = function else {
            return Err(EvalError::NotAFunction { name: name.clone() });
        };
        let values = args.eval_all(ctx, input)?;
        function.call(ctx, &values)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval_ctx::EvalCtx;
    use crate::value::Map;

    fn eval(expression: &str) -> Value {
        base().evaluate(expression, &Value::Null).unwrap()
    }

    #[test]
    fn test_literals() {
        assert_eq!(eval("42"), Value::Number(42.0));
        assert_eq!(eval("0x10"), Value::Number(16.0));
        assert_eq!(eval("1.5e1"), Value::Number(15.0));
        assert_eq!(eval(r#""a\tb""#), Value::from("a\tb"));
        assert_eq!(eval("'xy'"), Value::from("xy"));
        assert_eq!(eval(r"`a\n`"), Value::from(r"a\n"));
        assert_eq!(eval("nil"), Value::Null);
    }

    #[test]
    fn test_negate() {
        assert_eq!(eval("-3"), Value::Number(-3.0));
        assert_eq!(eval("-\"2\""), Value::Number(-2.0));
        let err = base().evaluate("-true", &Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "unexpected true (bool) for operator -, expected number");
    }

    #[test]
    fn test_generic_equality() {
        assert_eq!(eval("nil == nil"), Value::Bool(true));
        assert_eq!(eval("nil == false"), Value::Bool(false));
        assert_eq!(eval("\"a\" != \"b\""), Value::Bool(true));
    }

    #[test]
    fn test_call_input_function() {
        let input = Value::Object(Map::from_iter([(
            "twice".to_string(),
            Value::function(|_, args: &[Value]| Ok(Value::Number(args[0].as_f64().unwrap_or(0.0) * 2.0))),
        )]));
        let ctx = EvalCtx::background();
        let result = base().compile("twice(4)").unwrap().eval(&ctx, &input);
        assert_eq!(result, Ok(Value::Number(8.0)));
        let err = base().compile("nope(1)").unwrap().eval(&ctx, &input).unwrap_err();
        assert_eq!(err, EvalError::UnknownFunction { name: "nope".into() });
    }
}

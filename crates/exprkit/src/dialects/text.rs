//! String concatenation, lexical order, substring tests and regex matching.

use super::base::base;
use crate::error::{EvalError, ParseError};
use crate::evaluable::Evaluable;
use crate::language::Language;
use crate::value::Value;
use regex::Regex;

fn compile_at_eval(pattern: &str) -> Result<Regex, EvalError> {
    Regex::new(pattern).map_err(|err| EvalError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}

fn matches_pattern(text: &str, pattern: &str) -> Result<Value, EvalError> {
    Ok(Value::Bool(compile_at_eval(pattern)?.is_match(text)))
}

/// `text =~ pattern`, negated for `!~`. A constant pattern is compiled once
/// here, so an invalid one fails compilation of the whole expression.
fn regex_operator(name: &str, negate: bool) -> Language {
    Language::infix_eval_operator(name, move |text: Evaluable, pattern: Evaluable| {
        if let Some(constant) = pattern.const_value() {
            let source = constant.to_string();
            let regex = Regex::new(&source).map_err(|err| ParseError::InvalidPattern {
                pattern: source.clone(),
                reason: err.to_string(),
            })?;
            return Ok(Evaluable::new(move |ctx, input| {
                let text = text.eval_string(ctx, input)?;
                Ok(Value::Bool(regex.is_match(&text) != negate))
            }));
        }
        Ok(Evaluable::new(move |ctx, input| {
            let text = text.eval_string(ctx, input)?;
            let regex = compile_at_eval(&pattern.eval_string(ctx, input)?)?;
            Ok(Value::Bool(regex.is_match(&text) != negate))
        }))
    })
}

/// Text `+`, lexical `< <= > >=`, `sw` (starts with), `co` (contains),
/// `ew` (ends with), `mw` (matches the regex on the right) and the regex
/// operators `=~` and `!~`, on top of [`base`].
pub fn text() -> Language {
    Language::compose([
        Language::infix_text_operator("+", |a, b| Ok(Value::String(format!("{a}{b}")))),
        Language::infix_text_operator("<", |a, b| Ok(Value::Bool(a < b))),
        Language::infix_text_operator("<=", |a, b| Ok(Value::Bool(a <= b))),
        Language::infix_text_operator(">", |a, b| Ok(Value::Bool(a > b))),
        Language::infix_text_operator(">=", |a, b| Ok(Value::Bool(a >= b))),
        Language::infix_text_operator("sw", |a, b| Ok(Value::Bool(a.starts_with(b)))),
        Language::infix_text_operator("co", |a, b| Ok(Value::Bool(a.contains(b)))),
        Language::infix_text_operator("ew", |a, b| Ok(Value::Bool(a.ends_with(b)))),
        Language::infix_text_operator("mw", matches_pattern),
        regex_operator("=~", false),
        regex_operator("!~", true),
        base(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(expression: &str) -> Result<Value, crate::Error> {
        text().evaluate(expression, &Value::from(json!({"name": "exprkit", "pattern": "^ex"})))
    }

    #[test]
    fn test_concat_and_order() {
        assert_eq!(eval("\"a\" + \"b\""), Ok(Value::from("ab")));
        assert_eq!(eval("\"n\" + 1"), Ok(Value::from("n1")));
        assert_eq!(eval("\"abc\" < \"abd\""), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_substring_operators() {
        assert_eq!(eval("name sw \"expr\""), Ok(Value::Bool(true)));
        assert_eq!(eval("name co \"rk\""), Ok(Value::Bool(true)));
        assert_eq!(eval("name ew \"x\""), Ok(Value::Bool(false)));
        assert_eq!(eval("name mw \"k.t$\""), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_regex_operators() {
        assert_eq!(eval("name =~ \"^e.*t$\""), Ok(Value::Bool(true)));
        assert_eq!(eval("name !~ \"^e\""), Ok(Value::Bool(false)));
        assert_eq!(eval("name =~ pattern"), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_invalid_constant_pattern_fails_compilation() {
        let err = text().compile("name =~ \"(\"").unwrap_err();
        assert!(matches!(err.as_parse(), Some(ParseError::InvalidPattern { .. })));
    }

    #[test]
    fn test_invalid_dynamic_pattern_fails_evaluation() {
        let input = Value::from(json!({"name": "x", "pattern": "("}));
        let err = text().evaluate("name =~ pattern", &input).unwrap_err();
        assert!(matches!(err.as_eval(), Some(EvalError::InvalidPattern { .. })));
    }
}

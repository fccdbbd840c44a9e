//! Array and object literals.

use crate::error::ParseError;
use crate::evaluable::{Evaluable, Evaluables};
use crate::language::Language;
use crate::parser::Parser;
use crate::value::{Map, Value};
use exprkit_scanner::TokenKind;

const COMMA: TokenKind = TokenKind::Symbol(',');
const COLON: TokenKind = TokenKind::Symbol(':');

/// Parses `[a, b, ...]`. A trailing comma is accepted.
fn parse_array(p: &mut Parser<'_>) -> Result<Evaluable, ParseError> {
    const CLOSE: TokenKind = TokenKind::Symbol(']');
    let mut items = Vec::new();
    loop {
        if p.scan() == CLOSE {
            break;
        }
        p.camouflage("array", &[CLOSE]);
        items.push(p.parse_expression()?);
        match p.scan() {
            COMMA => {}
            CLOSE => break,
            _ => return Err(p.expected("array", &[COMMA, CLOSE])),
        }
    }

    if items.all_const() {
        let values = items.iter().filter_map(Evaluable::const_value).cloned().collect();
        return Ok(Evaluable::constant(Value::Array(values)));
    }
    Ok(Evaluable::new(move |ctx, input| Ok(Value::Array(items.eval_all(ctx, input)?))))
}

/// Parses `{key: value, ...}`. Keys are expressions rendered as text when
/// evaluated; a repeated key keeps the last value.
fn parse_object(p: &mut Parser<'_>) -> Result<Evaluable, ParseError> {
    const CLOSE: TokenKind = TokenKind::Symbol('}');
    let mut entries = Vec::new();
    loop {
        if p.scan() == CLOSE {
            break;
        }
        p.camouflage("object", &[CLOSE]);
        let key = p.parse_expression()?;
        if p.scan() != COLON {
            return Err(p.expected("object", &[COLON]));
        }
        let value = p.parse_expression()?;
        entries.push((key, value));
        match p.scan() {
            COMMA => {}
            CLOSE => break,
            _ => return Err(p.expected("object", &[COMMA, CLOSE])),
        }
    }

    Ok(Evaluable::new(move |ctx, input| {
        let mut map = Map::with_capacity(entries.len());
        for (key, value) in &entries {
            let key = key.eval_string(ctx, input)?;
            let value = value.eval(ctx, input)?;
            map.insert(key, value);
        }
        Ok(Value::Object(map))
    }))
}

/// `[...]` array and `{...}` object literals, plus the constant `null`.
pub fn json() -> Language {
    Language::compose([
        Language::prefix_extension(TokenKind::Symbol('['), parse_array),
        Language::prefix_extension(TokenKind::Symbol('{'), parse_object),
        Language::constant("null", Value::Null),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialects::arithmetic;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn lang() -> Language {
        Language::compose([arithmetic(), json()])
    }

    #[test]
    fn test_constant_array_is_folded() {
        let compiled = lang().compile("[1, 2 + 3, \"x\",]").unwrap();
        assert!(compiled.is_const());
        assert_eq!(
            compiled.const_value().map(Value::to_json),
            Some(json!([1.0, 5.0, "x"]))
        );
    }

    #[test]
    fn test_object_with_computed_keys() {
        let input = Value::from(json!({"k": "name", "v": 3}));
        let result = lang().evaluate("{k: v * 2, \"k\": null, \"k\": 1}", &input).unwrap();
        assert_eq!(result.to_json(), json!({"name": 6.0, "k": 1.0}));
    }

    #[test]
    fn test_empty_literals() {
        assert_eq!(lang().evaluate("[]", &Value::Null), Ok(Value::Array(vec![])));
        assert_eq!(lang().evaluate("{}", &Value::Null), Ok(Value::Object(Map::new())));
    }

    #[test]
    fn test_malformed_literals() {
        let err = lang().compile("[1 2]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parsing error at 1:4: unexpected Int \"2\" while scanning array expected ',' or ']'"
        );
        let err = lang().compile("{\"a\" 1}").unwrap_err();
        assert!(err.to_string().contains("while scanning object expected ':'"), "{err}");
    }
}

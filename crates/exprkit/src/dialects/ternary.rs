//! The conditional operator `cond ? then : else`.

use crate::error::ParseError;
use crate::evaluable::Evaluable;
use crate::language::Language;
use crate::parser::Parser;
use crate::value::Value;
use exprkit_scanner::TokenKind;

fn parse_if(p: &mut Parser<'_>, condition: Evaluable) -> Result<Evaluable, ParseError> {
    let then = p.parse_expression()?;
    let otherwise = if p.scan() == TokenKind::Symbol(':') {
        p.parse_expression()?
    } else {
        p.camouflage("ternary", &[TokenKind::Symbol(':')]);
        p.constant(Value::Null)
    };

    if let Some(value) = condition.const_value() {
        return Ok(if value.is_zero() { otherwise } else { then });
    }
    Ok(Evaluable::new(move |ctx, input| {
        if condition.eval(ctx, input)?.is_zero() {
            otherwise.eval(ctx, input)
        } else {
            then.eval(ctx, input)
        }
    }))
}

/// Postfix `?`: `a ? b : c` is `b` unless `a` is the zero value of its type
/// (nil, `false`, `0`, `""`), then `c`. Without `: c` the result is `nil`.
/// Only the selected branch is evaluated.
pub fn ternary_operator() -> Language {
    Language::postfix_operator("?", parse_if)
}

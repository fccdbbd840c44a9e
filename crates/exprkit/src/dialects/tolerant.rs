//! Evaluation of partially missing data.
//!
//! By default an unresolved variable path is an error. The languages here
//! substitute a value instead; [`tolerant_full`] also adjusts comparisons so
//! that an absent field is unequal to everything but another absent field
//! or `nil`, and never greater or smaller than anything.

use super::full::full;
use crate::error::ParseError;
use crate::evaluable::Evaluable;
use crate::language::Language;
use crate::selector::{self, MissingField};
use crate::util;
use crate::value::Value;
use std::cmp::Ordering;

/// Resolves variable paths with `policy` for keys that are absent.
///
/// With [`MissingField::Missing`] this also replaces `==` and `!=`, so that
/// an absent field equals `nil` and never `false`. Compose it after the
/// language whose equality it should override.
pub fn with_missing_field_policy(policy: MissingField) -> Language {
    let tolerant_equality = matches!(policy, MissingField::Missing);
    let selector = Language::variable_selector(move |path| selector::variable(path, policy.clone()));
    if !tolerant_equality {
        return selector;
    }
    Language::compose([
        selector,
        Language::infix_eval_operator("==", equality(false)),
        Language::infix_eval_operator("!=", equality(true)),
    ])
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a.is_nil(), b.is_nil()) {
        (true, true) => return true,
        (true, false) | (false, true) => return false,
        (false, false) => {}
    }
    if let (Some(x), Some(y)) = (util::to_f64(a), util::to_f64(b)) {
        return x == y;
    }
    a == b
}

fn equality(negate: bool) -> impl Fn(Evaluable, Evaluable) -> Result<Evaluable, ParseError> + Send + Sync {
    move |a, b| {
        Ok(Evaluable::new(move |ctx, input| {
            let left = a.eval(ctx, input)?;
            let right = b.eval(ctx, input)?;
            Ok(Value::Bool(loosely_equal(&left, &right) != negate))
        }))
    }
}

fn ordering(name: &str, accept: fn(Ordering) -> bool) -> Language {
    Language::infix_operator(name, move |a, b| {
        if matches!(a, Value::Missing) || matches!(b, Value::Missing) {
            return Ok(Value::Bool(false));
        }
        let order = match (util::to_f64(&a), util::to_f64(&b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => Some(a.to_string().cmp(&b.to_string())),
        };
        Ok(Value::Bool(order.is_some_and(accept)))
    })
}

/// [`full`] where absent fields evaluate to [`Value::Missing`].
///
/// - `==` and `!=` treat `Missing` and `nil` as equal to each other and to
///   nothing else (in particular not to `false`), compare numbers after
///   conversion and everything else structurally;
/// - `> >= < <=` are `false` when either side is `Missing`, numeric when
///   both sides convert to numbers and lexical otherwise;
/// - `&&`, `||` and `!` read `Missing` as `false`.
pub fn tolerant_full() -> Language {
    Language::compose([
        full(),
        with_missing_field_policy(MissingField::Missing),
        ordering(">", Ordering::is_gt),
        ordering(">=", Ordering::is_ge),
        ordering("<", Ordering::is_lt),
        ordering("<=", Ordering::is_le),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(expression: &str) -> Value {
        let input = Value::from(json!({"flag": false, "n": 5, "s": "b", "none": null}));
        tolerant_full().evaluate(expression, &input).unwrap()
    }

    #[test]
    fn test_missing_equality() {
        assert_eq!(eval("absent == nil"), Value::Bool(true));
        assert_eq!(eval("absent == other.absent"), Value::Bool(true));
        assert_eq!(eval("absent == none"), Value::Bool(true));
        assert_eq!(eval("absent == false"), Value::Bool(false));
        assert_eq!(eval("flag == false"), Value::Bool(true));
        assert_eq!(eval("absent != 0"), Value::Bool(true));
    }

    #[test]
    fn test_loose_equality() {
        assert_eq!(eval("n == \"5\""), Value::Bool(true));
        assert_eq!(eval("s != \"b\""), Value::Bool(false));
        assert_eq!(eval("[1, s] == [1, \"b\"]"), Value::Bool(true));
    }

    #[test]
    fn test_ordering() {
        assert_eq!(eval("absent > 1"), Value::Bool(false));
        assert_eq!(eval("absent <= 1"), Value::Bool(false));
        assert_eq!(eval("n > 4"), Value::Bool(true));
        assert_eq!(eval("n >= \"10\""), Value::Bool(false));
        assert_eq!(eval("s < \"c\""), Value::Bool(true));
    }

    #[test]
    fn test_logic_reads_missing_as_false() {
        assert_eq!(eval("!absent"), Value::Bool(true));
        assert_eq!(eval("absent || n > 1"), Value::Bool(true));
        assert_eq!(eval("absent.deeper ?? \"default\""), Value::from("default"));
    }

    #[test]
    fn test_missing_left_operand_short_circuits_and() {
        assert_eq!(eval("absent && (1/0 > 0)"), Value::Bool(false));
        assert_eq!(eval("!absent && n > 1"), Value::Bool(true));
    }

    #[test]
    fn test_missing_policy_over_full_keeps_absent_apart_from_false() {
        let lang = Language::compose([full(), with_missing_field_policy(MissingField::Missing)]);
        let input = Value::from(json!({"flag": false}));
        let eval = |expression: &str| lang.evaluate(expression, &input);
        assert_eq!(eval("absent == false"), Ok(Value::Bool(false)));
        assert_eq!(eval("absent == nil"), Ok(Value::Bool(true)));
        assert_eq!(eval("absent != false"), Ok(Value::Bool(true)));
        assert_eq!(eval("flag == false"), Ok(Value::Bool(true)));
        assert_eq!(eval("absent && (1/0 > 0)"), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_policies() {
        let input = Value::from(json!({"a": 1}));
        let null = Language::compose([full(), with_missing_field_policy(MissingField::Null)]);
        assert_eq!(null.evaluate("b", &input), Ok(Value::Null));
        let zero = Language::compose([
            full(),
            with_missing_field_policy(MissingField::Substitute(Value::Number(0.0))),
        ]);
        assert_eq!(zero.evaluate("b + 1", &input), Ok(Value::Number(1.0)));
        let strict = Language::compose([full(), with_missing_field_policy(MissingField::Error)]);
        assert_eq!(strict.evaluate("b", &input).unwrap_err().to_string(), "unknown parameter b");
    }
}

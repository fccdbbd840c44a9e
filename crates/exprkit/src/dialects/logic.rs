//! Boolean negation, conjunction and disjunction.

use super::base::base;
use crate::error::EvalError;
use crate::language::Language;
use crate::util;
use crate::value::Value;

fn not(value: Value) -> Result<Value, EvalError> {
    util::to_bool(&value)
        .map(|b| Value::Bool(!b))
        .ok_or_else(|| util::type_mismatch("!", &value, "bool"))
}

/// Prefix `!`, `&&` and `||` with short-circuit evaluation, and boolean
/// `==` and `!=`, on top of [`base`].
///
/// `false && x` never evaluates `x`, nor does `true || x`; a missing field
/// on the left of `&&` counts as `false`. Operands are
/// converted to booleans: non-zero numbers and the strings `true`/`false`
/// in any case are accepted.
pub fn propositional_logic() -> Language {
    Language::compose([
        Language::prefix_operator("!", not),
        Language::infix_short_circuit("&&", |left| {
            matches!(left, Value::Bool(false) | Value::Missing).then_some(Value::Bool(false))
        }),
        Language::infix_bool_operator("&&", |a, b| Ok(Value::Bool(a && b))),
        Language::infix_short_circuit("||", |left| {
            matches!(left, Value::Bool(true)).then_some(Value::Bool(true))
        }),
        Language::infix_bool_operator("||", |a, b| Ok(Value::Bool(a || b))),
        Language::infix_bool_operator("==", |a, b| Ok(Value::Bool(a == b))),
        Language::infix_bool_operator("!=", |a, b| Ok(Value::Bool(a != b))),
        base(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn eval(expression: &str) -> Result<Value, crate::Error> {
        propositional_logic().evaluate(expression, &Value::Null)
    }

    #[test]
    fn test_connectives() {
        assert_eq!(eval("true && !false"), Ok(Value::Bool(true)));
        assert_eq!(eval("false || 1"), Ok(Value::Bool(true)));
        assert_eq!(eval("\"TRUE\" && true"), Ok(Value::Bool(true)));
        assert_eq!(eval("true || false && false"), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_right_side_skipped() {
        assert_eq!(eval("false && undefined.path"), Ok(Value::Bool(false)));
        assert_eq!(eval("true || undefined.path"), Ok(Value::Bool(true)));
        assert!(eval("true && undefined.path").is_err());
    }

    #[test]
    fn test_left_operand_evaluated_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let tick = Language::function("tick", move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Bool(false))
        });
        let lang = Language::compose([propositional_logic(), tick]);
        assert_eq!(lang.evaluate("tick() || true", &Value::Null), Ok(Value::Bool(true)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(lang.evaluate("tick() && true", &Value::Null), Ok(Value::Bool(false)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_not_rejects_non_bool() {
        let err = eval("!\"maybe\"").unwrap_err();
        assert_eq!(err.to_string(), "unexpected maybe (string) for operator !, expected bool");
    }
}

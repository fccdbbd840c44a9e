use exprkit::{dialects, Language, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

const NAMES: [&str; 3] = ["x", "y", "z"];

/// Renders each combination of `x`, `y` and `z` distinctly.
const PROBE: &str = "x * 10000 + y * 100 + z";

fn definitions() -> impl Strategy<Value = Vec<(usize, i32)>> {
    prop::collection::vec((0..NAMES.len(), -50i32..50), 0..5)
}

fn constants(defs: &[(usize, i32)]) -> Language {
    Language::compose(defs.iter().map(|&(name, value)| Language::constant(NAMES[name], value)))
}

/// Names not defined as constants fall back to the input.
fn probe(lang: &Language) -> Value {
    let input = Value::from(json!({"x": 1, "y": 2, "z": 3}));
    Language::compose([dialects::arithmetic(), lang.clone()])
        .evaluate(PROBE, &input)
        .unwrap_or_else(|e| panic!("{PROBE} failed: {e}"))
}

proptest! {
    #[test]
    fn compose_is_associative(a in definitions(), b in definitions(), c in definitions()) {
        let (a, b, c) = (constants(&a), constants(&b), constants(&c));
        let left = Language::compose([Language::compose([a.clone(), b.clone()]), c.clone()]);
        let right = Language::compose([a, Language::compose([b, c])]);
        prop_assert_eq!(probe(&left), probe(&right));
    }

    #[test]
    fn compose_is_idempotent(a in definitions()) {
        let a = constants(&a);
        prop_assert_eq!(probe(&Language::compose([a.clone(), a.clone()])), probe(&a));
    }

    #[test]
    fn later_constant_wins(first in -50i32..50, second in -50i32..50) {
        let lang = Language::compose([Language::constant("x", first), Language::constant("x", second)]);
        let expected = f64::from(second) * 10000.0 + 203.0;
        prop_assert_eq!(probe(&lang), Value::Number(expected));
    }
}

#[test]
fn test_empty_composition_is_identity() {
    let a = constants(&[(0, 5), (2, 7)]);
    assert_eq!(probe(&Language::compose([Language::new(), a.clone()])), probe(&a));
    assert_eq!(probe(&Language::compose([a.clone(), Language::new()])), probe(&a));
    assert_eq!(probe(&Language::new()), Value::Number(10203.0));
}

#[test]
fn test_typed_bodies_overlay_in_either_order() {
    let number = Language::infix_number_operator("+", |a, b| Ok(Value::Number(a + b)));
    let text = Language::infix_text_operator("+", |a, b| Ok(Value::String(format!("{a}{b}"))));
    for lang in [
        Language::compose([dialects::base(), number.clone(), text.clone()]),
        Language::compose([dialects::base(), text, number]),
    ] {
        assert_eq!(lang.evaluate("1 + 2", &Value::Null), Ok(Value::Number(3.0)));
        assert_eq!(lang.evaluate("\"a\" + \"b\"", &Value::Null), Ok(Value::from("ab")));
    }
}

#[test]
fn test_later_body_replaces_same_slot() {
    let lang = Language::compose([
        dialects::arithmetic(),
        Language::infix_number_operator("+", |a, b| Ok(Value::Number(a * b))),
    ]);
    assert_eq!(lang.evaluate("2 + 3", &Value::Null), Ok(Value::Number(6.0)));
    assert_eq!(lang.evaluate("2 - 3", &Value::Null), Ok(Value::Number(-1.0)));
}

#[test]
fn test_precedence_can_be_redefined() {
    let lang = Language::compose([dialects::arithmetic(), Language::precedence("+", 200)]);
    assert_eq!(lang.evaluate("2 * 3 + 4", &Value::Null), Ok(Value::Number(14.0)));
    assert_eq!(dialects::arithmetic().evaluate("2 * 3 + 4", &Value::Null), Ok(Value::Number(10.0)));
}

#[test]
fn test_right_associative_precedence() {
    let lang = Language::compose([
        dialects::arithmetic(),
        Language::right_associative("-", 120),
    ]);
    assert_eq!(lang.evaluate("10 - 4 - 3", &Value::Null), Ok(Value::Number(9.0)));
    assert_eq!(dialects::arithmetic().evaluate("10 - 4 - 3", &Value::Null), Ok(Value::Number(3.0)));
}

#[test]
fn test_dialects_stand_alone() {
    let input = Value::from(json!({"a": true, "s": "abc"}));
    assert_eq!(dialects::propositional_logic().evaluate("!a || a", &input), Ok(Value::Bool(true)));
    assert_eq!(dialects::text().evaluate("s + \"d\"", &input), Ok(Value::from("abcd")));
    assert_eq!(dialects::base().evaluate("(s)", &input), Ok(Value::from("abc")));
    assert!(dialects::base().evaluate("1 + 1", &input).is_err());
}

#[test]
fn test_language_debug_lists_operators() {
    let lang = Language::compose([
        Language::infix_number_operator("<>", |a, b| Ok(Value::Bool(a != b))),
        Language::constant("answer", 42.0),
    ]);
    let debug = format!("{lang:?}");
    assert!(debug.contains("\"<>\""), "{debug}");
    assert!(debug.contains("\"answer\""), "{debug}");
}

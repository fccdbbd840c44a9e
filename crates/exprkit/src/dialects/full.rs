//! The complete built-in language.

use super::{
    arithmetic, bitmask, date::date, filter::filters, json, propositional_logic, ternary_operator, text,
};
use crate::error::EvalError;
use crate::language::Language;
use crate::util;
use crate::value::Value;

fn member(needle: Value, haystack: Value) -> Result<Value, EvalError> {
    match haystack.as_array() {
        Some(items) => Ok(Value::Bool(items.contains(&needle))),
        None => Err(util::type_mismatch("in", &haystack, "array")),
    }
}

/// Everything: [`arithmetic`], [`bitmask`], [`text`],
/// [`propositional_logic`], [`json`], [`ternary_operator`] and
///
/// - `a in b`: whether array `b` has an element deeply equal to `a`;
/// - `a ?? b`: `a` unless it is nil or the zero value of its type, then `b`
///   (which is only evaluated in that case);
/// - `cfa` and `cfm` collection filters (see [`super::filter`]);
/// - `date(text)` (see [`super::date`]).
pub fn full() -> Language {
    Language::compose([
        arithmetic(),
        bitmask(),
        text(),
        propositional_logic(),
        json(),
        Language::infix_operator("in", member),
        Language::infix_short_circuit("??", |left| (!left.is_zero()).then(|| left.clone())),
        Language::infix_operator("??", |_, right| Ok(right)),
        filters(),
        ternary_operator(),
        date(),
    ])
}

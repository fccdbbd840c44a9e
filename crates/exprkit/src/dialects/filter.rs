//! The `cfa` and `cfm` collection filters.
//!
//! Both take a match condition as an array literal on the right:
//!
//! - `tags cfa ["prod", "sw"]` is true when some string in `tags` (or in a
//!   nested list of `tags`) starts with `"prod"`;
//! - `items cfm ["kind", "eq", "book"]` is true when some object in `items`
//!   has a string field `kind` equal to `"book"`.
//!
//! Malformed conditions and inputs make the result `false`, never an error.
//! The collection is only read.

use crate::error::EvalError;
use crate::language::Language;
use crate::value::Value;

/// How a candidate string is tested against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Condition {
    Equal,
    NotEqual,
    StartsWith,
    EndsWith,
    Contains,
}

impl Condition {
    /// Unknown names fall back to equality.
    fn parse(name: &str) -> Self {
        match name {
            "notequal" | "ne" | "!=" => Condition::NotEqual,
            "startswith" | "sw" => Condition::StartsWith,
            "endswith" | "ew" => Condition::EndsWith,
            "contains" | "co" => Condition::Contains,
            _ => Condition::Equal,
        }
    }

    fn test(self, value: &str, target: &str) -> bool {
        match self {
            Condition::Equal => value == target,
            Condition::NotEqual => value != target,
            Condition::StartsWith => value.starts_with(target),
            Condition::EndsWith => value.ends_with(target),
            Condition::Contains => value.contains(target),
        }
    }
}

fn strings<const N: usize>(args: &Value) -> Option<[&str; N]> {
    let items = args.as_array()?;
    if items.len() < N {
        return None;
    }
    let mut out = [""; N];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_str()?;
    }
    Some(out)
}

fn any_string(items: &[Value], condition: Condition, target: &str) -> bool {
    items.iter().any(|item| match item {
        Value::String(s) => condition.test(s, target),
        Value::Array(nested) => nested
            .iter()
            .filter_map(Value::as_str)
            .any(|s| condition.test(s, target)),
        _ => false,
    })
}

fn filter_array(list: Value, args: Value) -> Result<Value, EvalError> {
    let matched = match (list.as_array(), strings::<2>(&args)) {
        (Some(items), Some([target, condition])) => any_string(items, Condition::parse(condition), target),
        _ => false,
    };
    Ok(Value::Bool(matched))
}

fn filter_records(list: Value, args: Value) -> Result<Value, EvalError> {
    let matched = match (list.as_array(), strings::<3>(&args)) {
        (Some(items), Some([field, condition, target])) => {
            let condition = Condition::parse(condition);
            items
                .iter()
                .filter_map(|item| item.as_object()?.get(field)?.as_str())
                .any(|value| condition.test(value, target))
        }
        _ => false,
    };
    Ok(Value::Bool(matched))
}

/// `cfa` and `cfm`.
pub fn filters() -> Language {
    Language::compose([
        Language::infix_operator("cfa", filter_array),
        Language::infix_operator("cfm", filter_records),
    ])
}

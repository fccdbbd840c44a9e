//! Variable path resolution.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::evaluable::{Evaluable, Evaluables};
use crate::value::Value;
use std::borrow::Cow;
use std::fmt;

/// Capability of a custom value to resolve named keys itself.
///
/// Selection tries this first, before maps, sequences and records.
pub trait Selector: Send + Sync + fmt::Debug {
    /// Returns `Ok(None)` when `key` is absent. Errors propagate unchanged.
    fn select(&self, ctx: &EvalCtx, key: &str) -> Result<Option<Value>, EvalError>;
}

/// What a variable path yields when a key cannot be resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MissingField {
    /// Fail with [`EvalError::UnknownParameter`] naming the path.
    #[default]
    Error,
    Null,
    /// The explicit [`Value::Missing`] sentinel.
    Missing,
    Substitute(Value),
}

impl MissingField {
    fn on_missing(&self, keys: &[String]) -> Result<Value, EvalError> {
        let path = keys.join(".");
        let value = match self {
            MissingField::Error => return Err(EvalError::UnknownParameter { path }),
            MissingField::Null => Value::Null,
            MissingField::Missing => Value::Missing,
            MissingField::Substitute(v) => v.clone(),
        };
        tracing::trace!(%path, substitute = value.type_name(), "unresolved variable path");
        Ok(value)
    }
}

/// Walks `keys` from `input`.
///
/// At each step the current value is tried, in order, as a [`Selector`], an
/// object, an array (the key must be a non-negative in-range integer) and a
/// serialized record. Anything else, or an absent key, is handed to `policy`
/// with the path walked so far.
pub fn resolve_path(
    ctx: &EvalCtx,
    input: &Value,
    keys: &[String],
    policy: &MissingField,
) -> Result<Value, EvalError> {
    let mut current = Cow::Borrowed(input);
    for (i, key) in keys.iter().enumerate() {
        ctx.check()?;
        let next = match &current {
            Cow::Borrowed(v) => step(ctx, v, key)?,
            Cow::Owned(v) => step(ctx, v, key)?.map(|found| Cow::Owned(found.into_owned())),
        };
        current = match next {
            Some(found) => found,
            None => return policy.on_missing(&keys[..=i]),
        };
    }
    Ok(current.into_owned())
}

fn step<'v>(ctx: &EvalCtx, value: &'v Value, key: &str) -> Result<Option<Cow<'v, Value>>, EvalError> {
    let found = match value {
        Value::Selector(selector) => selector.select(ctx, key)?.map(Cow::Owned),
        Value::Object(map) => map.get(key).map(Cow::Borrowed),
        Value::Array(items) => index(key).and_then(|i| items.get(i)).map(Cow::Borrowed),
        Value::Record(json) => record_field(json, key).map(Cow::Owned),
        _ => None,
    };
    Ok(found)
}

fn index(key: &str) -> Option<usize> {
    key.parse::<usize>().ok()
}

fn record_field(json: &serde_json::Value, key: &str) -> Option<Value> {
    let field = match json {
        serde_json::Value::Object(map) => map.get(key),
        serde_json::Value::Array(items) => index(key).and_then(|i| items.get(i)),
        _ => None,
    };
    field.map(Value::from)
}

/// Builds the evaluable for a variable path. Path elements are rendered as
/// text; constant paths are rendered once up front.
pub fn variable(path: Vec<Evaluable>, policy: MissingField) -> Evaluable {
    if path.all_const() {
        let keys: Vec<String> = path
            .iter()
            .filter_map(|e| e.const_value().map(Value::to_string))
            .collect();
        return Evaluable::new(move |ctx, input| resolve_path(ctx, input, &keys, &policy));
    }
    Evaluable::new(move |ctx, input| {
        let keys = path.eval_strings(ctx, input)?;
        resolve_path(ctx, input, &keys, &policy)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(path: &str) -> Vec<String> {
        path.split('.').map(str::to_string).collect()
    }

    fn resolve(input: serde_json::Value, path: &str, policy: &MissingField) -> Result<Value, EvalError> {
        resolve_path(&EvalCtx::background(), &Value::from(input), &keys(path), policy)
    }

    #[test]
    fn test_nested_object_and_array() {
        let input = json!({"a": {"b": [10, 20, {"c": "deep"}]}});
        assert_eq!(resolve(input.clone(), "a.b.1", &MissingField::Error), Ok(Value::Number(20.0)));
        assert_eq!(resolve(input, "a.b.2.c", &MissingField::Error), Ok(Value::from("deep")));
    }

    #[test]
    fn test_strict_error_names_path_prefix() {
        let input = json!({"a": {"b": [1, 2, 3]}});
        let err = resolve(input, "a.b.5.x", &MissingField::Error).unwrap_err();
        assert_eq!(err, EvalError::UnknownParameter { path: "a.b.5".into() });
        assert_eq!(err.to_string(), "unknown parameter a.b.5");
    }

    #[test]
    fn test_array_key_must_be_non_negative_integer() {
        let input = json!({"a": [1, 2]});
        assert!(resolve(input.clone(), "a.-1", &MissingField::Error).is_err());
        assert!(resolve(input, "a.x", &MissingField::Error).is_err());
    }

    #[test]
    fn test_tolerant_policies() {
        let input = json!({"a": 1});
        assert_eq!(resolve(input.clone(), "b.c", &MissingField::Null), Ok(Value::Null));
        assert_eq!(resolve(input.clone(), "b", &MissingField::Missing), Ok(Value::Missing));
        assert_eq!(
            resolve(input, "a.x", &MissingField::Substitute(Value::Bool(false))),
            Ok(Value::Bool(false))
        );
    }

    #[derive(Debug)]
    struct Upper;

    impl Selector for Upper {
        fn select(&self, _ctx: &EvalCtx, key: &str) -> Result<Option<Value>, EvalError> {
            if key == "fail" {
                return Err(EvalError::Other("selector failed".into()));
            }
            Ok(Some(Value::from(key.to_uppercase())))
        }
    }

    #[test]
    fn test_custom_selector_is_consulted_first() {
        let ctx = EvalCtx::background();
        let input = Value::selector(Upper);
        assert_eq!(
            resolve_path(&ctx, &input, &keys("shout"), &MissingField::Error),
            Ok(Value::from("SHOUT"))
        );
        assert_eq!(
            resolve_path(&ctx, &input, &keys("fail"), &MissingField::Null),
            Err(EvalError::Other("selector failed".into()))
        );
    }

    #[test]
    fn test_record_fields() {
        #[derive(serde::Serialize)]
        struct Order {
            id: u32,
            items: Vec<&'static str>,
        }
        let ctx = EvalCtx::background();
        let input = Value::record(&Order { id: 7, items: vec!["tea", "milk"] }).unwrap();
        assert_eq!(
            resolve_path(&ctx, &input, &keys("items.1"), &MissingField::Error),
            Ok(Value::from("milk"))
        );
        assert_eq!(
            resolve_path(&ctx, &input, &keys("id"), &MissingField::Error),
            Ok(Value::Number(7.0))
        );
    }

    #[test]
    fn test_cancelled_context_stops_walk() {
        let (ctx, handle) = EvalCtx::with_cancel();
        handle.cancel();
        let input = Value::from(json!({"a": 1}));
        assert_eq!(
            resolve_path(&ctx, &input, &keys("a"), &MissingField::Error),
            Err(EvalError::Cancelled)
        );
    }
}

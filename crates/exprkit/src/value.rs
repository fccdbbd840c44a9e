//! Dynamic values flowing through compiled expressions.

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::selector::Selector;
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;
use std::sync::Arc;

/// Insertion-ordered string-keyed map used for object values.
pub type Map = IndexMap<String, Value>;

/// The signature of a callable value. Arguments are already evaluated.
pub type FunctionBody = dyn Fn(&EvalCtx, &[Value]) -> Result<Value, EvalError> + Send + Sync;

/// A callable carried inside a [`Value`], e.g. a function supplied in the
/// input and invoked through a variable path like `user.greet("hi")`.
#[derive(Clone)]
pub struct Function(Arc<FunctionBody>);

impl Function {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&EvalCtx, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Function(Arc::new(f))
    }

    pub fn call(&self, ctx: &EvalCtx, args: &[Value]) -> Result<Value, EvalError> {
        (self.0)(ctx, args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Function")
    }
}

/// Any value an expression can consume or produce.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    /// An absent field, produced only by the tolerant missing-field policy.
    /// Equal to itself and to `Null`, never to `false`.
    Missing,
    Bool(bool),
    Number(f64),
    Decimal(Decimal),
    String(String),
    DateTime(DateTime<FixedOffset>),
    Array(Vec<Value>),
    Object(Map),
    /// A serialized record, navigated structurally (see [`Value::record`]).
    Record(Arc<serde_json::Value>),
    Selector(Arc<dyn Selector>),
    Function(Function),
}

impl Value {
    /// Captures any serializable record for structural field access.
    ///
    /// Access is best-effort: only what the type's `Serialize` impl emits is
    /// visible, so skipped or private fields cannot be selected.
    pub fn record<T: serde::Serialize + ?Sized>(record: &T) -> Result<Value, serde_json::Error> {
        Ok(Value::Record(Arc::new(serde_json::to_value(record)?)))
    }

    pub fn selector<S: Selector + 'static>(selector: S) -> Value {
        Value::Selector(Arc::new(selector))
    }

    pub fn function<F>(f: F) -> Value
    where
        F: Fn(&EvalCtx, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Value::Function(Function::new(f))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Missing => "missing",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Record(_) => "record",
            Value::Selector(_) => "selector",
            Value::Function(_) => "function",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Null | Value::Missing)
    }

    /// True for the zero value of the value's own type: nil, `false`, `0`,
    /// decimal zero and the empty string. Composite values are never zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null | Value::Missing => true,
            Value::Bool(b) => !b,
            Value::Number(n) => *n == 0.0,
            Value::Decimal(d) => d.is_zero(),
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Converts to JSON. Values without a JSON form become `null`; decimals
    /// become strings so no precision is lost.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null | Value::Missing, Value::Null | Value::Missing) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Selector(a), Value::Selector(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Missing => f.write_str("<missing>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::Decimal(d) => write!(f, "{}", d.normalize()),
            Value::String(s) => f.write_str(s),
            Value::DateTime(t) => f.write_str(&t.to_rfc3339()),
            Value::Array(_) | Value::Object(_) | Value::Record(_) => write!(f, "{}", self.to_json()),
            Value::Selector(s) => write!(f, "{s:?}"),
            Value::Function(_) => f.write_str("<function>"),
        }
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Missing | Value::Selector(_) | Value::Function(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Decimal(d) => serializer.serialize_str(&d.normalize().to_string()),
            Value::String(s) => serializer.serialize_str(s),
            Value::DateTime(t) => serializer.serialize_str(&t.to_rfc3339()),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Record(json) => json.serialize(serializer),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        Value::from(v.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Value::DateTime(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

/// Lossy view of a decimal as a float, used when mixing decimals into
/// float arithmetic.
pub(crate) fn decimal_to_f64(d: &Decimal) -> Option<f64> {
    d.to_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_preserves_structure() {
        let v = Value::from(json!({"a": [1, "x", null], "b": true}));
        let Value::Object(map) = &v else { panic!("expected object") };
        assert_eq!(map["a"], Value::Array(vec![Value::Number(1.0), "x".into(), Value::Null]));
        assert_eq!(map["b"], Value::Bool(true));
        assert_eq!(v.to_json(), json!({"a": [1.0, "x", null], "b": true}));
    }

    #[test]
    fn test_deep_equality() {
        let a = Value::from(json!({"x": [1, {"y": 2}]}));
        let b = Value::from(json!({"x": [1, {"y": 2}]}));
        let c = Value::from(json!({"x": [1, {"y": 3}]}));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(Value::Null, Value::Bool(false));
        assert_ne!(Value::Missing, Value::Bool(false));
        assert_eq!(Value::Missing, Value::Null);
    }

    #[test]
    fn test_zero_values() {
        assert!(Value::Null.is_zero());
        assert!(Value::Missing.is_zero());
        assert!(Value::Bool(false).is_zero());
        assert!(Value::Number(0.0).is_zero());
        assert!(Value::from("").is_zero());
        assert!(!Value::Array(vec![]).is_zero());
        assert!(!Value::Number(0.1).is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(14.0).to_string(), "14");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::from("a").to_string(), "a");
        assert_eq!(Value::from(json!([1, 2])).to_string(), "[1.0,2.0]");
        assert_eq!(Value::Decimal(Decimal::new(300, 3)).to_string(), "0.3");
    }

    #[test]
    fn test_record_from_serialize() {
        #[derive(serde::Serialize)]
        struct User {
            name: String,
            #[serde(skip)]
            _secret: u32,
        }
        let v = Value::record(&User { name: "ann".into(), _secret: 7 }).unwrap();
        assert_eq!(v.type_name(), "record");
        assert_eq!(v.to_json(), json!({"name": "ann"}));
    }
}

use crate::error::EvalError;
use crate::eval_ctx::EvalCtx;
use crate::util;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Body of a dynamic [`Evaluable`].
pub type EvalFn = dyn Fn(&EvalCtx, &Value) -> Result<Value, EvalError> + Send + Sync;

/// A compiled expression: a pure function from an input value to a result.
///
/// Evaluables are immutable and cheap to clone, so one compiled expression
/// can be evaluated from many threads at once. Constants are kept apart from
/// dynamic bodies so builders can fold them at compile time.
#[derive(Clone)]
pub struct Evaluable(Inner);

#[derive(Clone)]
enum Inner {
    Const(Value),
    Dynamic(Arc<EvalFn>),
}

impl Evaluable {
    pub fn constant(value: Value) -> Self {
        Evaluable(Inner::Const(value))
    }

    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&EvalCtx, &Value) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Evaluable(Inner::Dynamic(Arc::new(f)))
    }

    pub fn is_const(&self) -> bool {
        matches!(self.0, Inner::Const(_))
    }

    pub fn const_value(&self) -> Option<&Value> {
        match &self.0 {
            Inner::Const(v) => Some(v),
            Inner::Dynamic(_) => None,
        }
    }

    /// Evaluates against `input`, checking `ctx` for cancellation first.
    pub fn eval(&self, ctx: &EvalCtx, input: &Value) -> Result<Value, EvalError> {
        ctx.check()?;
        match &self.0 {
            Inner::Const(v) => Ok(v.clone()),
            Inner::Dynamic(f) => f(ctx, input),
        }
    }

    pub fn eval_string(&self, ctx: &EvalCtx, input: &Value) -> Result<String, EvalError> {
        Ok(self.eval(ctx, input)?.to_string())
    }

    pub fn eval_bool(&self, ctx: &EvalCtx, input: &Value) -> Result<bool, EvalError> {
        let value = self.eval(ctx, input)?;
        util::to_bool(&value).ok_or_else(|| conversion(&value, "bool"))
    }

    pub fn eval_f64(&self, ctx: &EvalCtx, input: &Value) -> Result<f64, EvalError> {
        let value = self.eval(ctx, input)?;
        util::to_f64(&value).ok_or_else(|| conversion(&value, "number"))
    }

    pub fn eval_i64(&self, ctx: &EvalCtx, input: &Value) -> Result<i64, EvalError> {
        let value = self.eval(ctx, input)?;
        util::to_i64(&value).ok_or_else(|| conversion(&value, "integer"))
    }
}

fn conversion(value: &Value, expected: &'static str) -> EvalError {
    EvalError::Conversion {
        value: value.to_string(),
        actual: value.type_name(),
        expected,
    }
}

impl fmt::Debug for Evaluable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Inner::Const(v) => f.debug_tuple("Const").field(v).finish(),
            Inner::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

/// Evaluation helpers over an ordered list of evaluables.
pub trait Evaluables {
    /// Evaluates each element in order and renders it as text. Stops at the
    /// first error.
    fn eval_strings(&self, ctx: &EvalCtx, input: &Value) -> Result<Vec<String>, EvalError>;

    fn eval_all(&self, ctx: &EvalCtx, input: &Value) -> Result<Vec<Value>, EvalError>;

    fn all_const(&self) -> bool;
}

impl Evaluables for [Evaluable] {
    fn eval_strings(&self, ctx: &EvalCtx, input: &Value) -> Result<Vec<String>, EvalError> {
        self.iter().map(|e| e.eval_string(ctx, input)).collect()
    }

    fn eval_all(&self, ctx: &EvalCtx, input: &Value) -> Result<Vec<Value>, EvalError> {
        self.iter().map(|e| e.eval(ctx, input)).collect()
    }

    fn all_const(&self) -> bool {
        self.iter().all(Evaluable::is_const)
    }
}

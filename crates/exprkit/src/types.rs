//! Operator and extension definitions stored in a [`crate::Language`].

use crate::error::{EvalError, ParseError};
use crate::evaluable::Evaluable;
use crate::parser::Parser;
use crate::util;
use crate::value::Value;
use exprkit_scanner::TokenKind;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Parses a prefix position (literal, keyword, bracket construct...).
pub type Extension = Arc<dyn Fn(&mut Parser<'_>) -> Result<Evaluable, ParseError> + Send + Sync>;

/// Continues parsing after an already-parsed left operand.
pub type PostfixFn = Arc<dyn Fn(&mut Parser<'_>, Evaluable) -> Result<Evaluable, ParseError> + Send + Sync>;

/// Combines two operand evaluables into one.
pub type InfixBuilder = Arc<dyn Fn(Evaluable, Evaluable) -> Result<Evaluable, ParseError> + Send + Sync>;

/// Builds the evaluable for a variable path.
pub type SelectorFn = Arc<dyn Fn(Vec<Evaluable>) -> Evaluable + Send + Sync>;

pub type NumberFn = Arc<dyn Fn(f64, f64) -> Result<Value, EvalError> + Send + Sync>;
pub type DecimalFn = Arc<dyn Fn(Decimal, Decimal) -> Result<Value, EvalError> + Send + Sync>;
pub type BoolFn = Arc<dyn Fn(bool, bool) -> Result<Value, EvalError> + Send + Sync>;
pub type TextFn = Arc<dyn Fn(&str, &str) -> Result<Value, EvalError> + Send + Sync>;
pub type ArbitraryFn = Arc<dyn Fn(Value, Value) -> Result<Value, EvalError> + Send + Sync>;

/// Returns `Some(result)` when the left operand alone decides the outcome.
pub type ShortCircuitFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Where a prefix extension is registered: a token kind, or the text of an
/// identifier (keywords, constants, functions).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrefixKey {
    Token(TokenKind),
    Name(String),
}

impl PrefixKey {
    /// A single non-letter character names its symbol token; anything else
    /// is an identifier.
    pub fn for_name(name: &str) -> Self {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_alphabetic() => PrefixKey::Token(TokenKind::Symbol(c)),
            _ => PrefixKey::Name(name.to_string()),
        }
    }
}

impl From<TokenKind> for PrefixKey {
    fn from(kind: TokenKind) -> Self {
        PrefixKey::Token(kind)
    }
}

impl From<&str> for PrefixKey {
    fn from(name: &str) -> Self {
        PrefixKey::for_name(name)
    }
}

/// Binding strength of an operator. Higher binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Precedence {
    pub level: i32,
    pub right_assoc: bool,
}

/// An infix operator assembled from typed bodies.
///
/// Several languages may each contribute a body for the same name (numeric
/// `+` and text `+`); composition overlays them slot by slot. The body run
/// for a pair of operands is chosen by [`InfixOperator::apply`].
#[derive(Clone, Default)]
pub(crate) struct InfixOperator {
    pub number: Option<NumberFn>,
    pub decimal: Option<DecimalFn>,
    pub boolean: Option<BoolFn>,
    pub text: Option<TextFn>,
    pub arbitrary: Option<ArbitraryFn>,
    pub short_circuit: Option<ShortCircuitFn>,
    // Replaced a non-infix definition: must not absorb slots composed in
    // from the left later on.
    pub sealed: bool,
}

impl InfixOperator {
    fn overlay(&self, later: &InfixOperator) -> InfixOperator {
        InfixOperator {
            number: later.number.clone().or_else(|| self.number.clone()),
            decimal: later.decimal.clone().or_else(|| self.decimal.clone()),
            boolean: later.boolean.clone().or_else(|| self.boolean.clone()),
            text: later.text.clone().or_else(|| self.text.clone()),
            arbitrary: later.arbitrary.clone().or_else(|| self.arbitrary.clone()),
            short_circuit: later.short_circuit.clone().or_else(|| self.short_circuit.clone()),
            sealed: self.sealed,
        }
    }

    /// Runs the body matching the operand types.
    ///
    /// Exact matches are tried first (decimal, number, bool, text), then the
    /// same bodies with coercion, then the generic body. Text coercion only
    /// applies when there is no generic body.
    pub fn apply(&self, name: &str, a: Value, b: Value) -> Result<Value, EvalError> {
        if let (Some(f), Value::Decimal(x), Value::Decimal(y)) = (&self.decimal, &a, &b) {
            return f(*x, *y);
        }
        if let (Some(f), Value::Number(x), Value::Number(y)) = (&self.number, &a, &b) {
            return f(*x, *y);
        }
        if let (Some(f), Value::Bool(x), Value::Bool(y)) = (&self.boolean, &a, &b) {
            return f(*x, *y);
        }
        if let (Some(f), Value::String(x), Value::String(y)) = (&self.text, &a, &b) {
            return f(x, y);
        }

        if let Some(f) = &self.decimal {
            if let (Some(x), Some(y)) = (util::to_decimal(&a), util::to_decimal(&b)) {
                return f(x, y);
            }
        }
        if let Some(f) = &self.number {
            if let (Some(x), Some(y)) = (util::to_f64(&a), util::to_f64(&b)) {
                return f(x, y);
            }
        }
        if let Some(f) = &self.boolean {
            if let (Some(x), Some(y)) = (util::to_bool(&a), util::to_bool(&b)) {
                return f(x, y);
            }
        }
        if self.arbitrary.is_none() {
            if let Some(f) = &self.text {
                if let (Some(x), Some(y)) = (util::to_text(&a), util::to_text(&b)) {
                    return f(&x, &y);
                }
            }
        }
        if let Some(f) = &self.arbitrary {
            return f(a, b);
        }
        Err(self.mismatch(name, &a, &b))
    }

    pub fn short_circuit(&self, left: &Value) -> Option<Value> {
        self.short_circuit.as_ref().and_then(|f| f(left))
    }

    // With a single typed body the offending operand can be named precisely.
    fn mismatch(&self, name: &str, a: &Value, b: &Value) -> EvalError {
        type Check = fn(&Value) -> bool;
        let typed: [(bool, &'static str, Check); 4] = [
            (self.decimal.is_some(), "decimal", |v| util::to_decimal(v).is_some()),
            (self.number.is_some(), "number", |v| util::to_f64(v).is_some()),
            (self.boolean.is_some(), "bool", |v| util::to_bool(v).is_some()),
            (self.text.is_some(), "string", |v| util::to_text(v).is_some()),
        ];
        let mut present = typed.iter().filter(|(present, _, _)| *present);
        if let (Some((_, expected, accepts)), None) = (present.next(), present.next()) {
            let offending = if accepts(a) { b } else { a };
            return util::type_mismatch(name, offending, *expected);
        }
        EvalError::InvalidOperation {
            operator: name.to_string(),
            left: a.type_name(),
            right: b.type_name(),
        }
    }
}

/// Everything an operator name can be bound to.
#[derive(Clone)]
pub(crate) enum Operator {
    Infix(InfixOperator),
    /// Receives unevaluated operands, e.g. to precompile a regex.
    Eval(InfixBuilder),
    Postfix(PostfixFn),
}

impl Operator {
    /// Composes a later definition over an earlier one for the same name.
    ///
    /// Typed infix bodies overlay slot by slot. Eval and postfix definitions
    /// replace whatever was there; a typed infix composed over one of them
    /// replaces it too and is sealed against later left-hand overlays.
    pub fn merge(earlier: Option<&Operator>, later: &Operator) -> Operator {
        match (earlier, later) {
            (Some(Operator::Infix(prev)), Operator::Infix(next)) if !next.sealed => {
                Operator::Infix(prev.overlay(next))
            }
            (Some(Operator::Eval(_) | Operator::Postfix(_)), Operator::Infix(next)) => {
                Operator::Infix(InfixOperator {
                    sealed: true,
                    ..next.clone()
                })
            }
            _ => later.clone(),
        }
    }

    pub fn builder(&self, name: &str) -> Option<InfixBuilder> {
        match self {
            Operator::Infix(op) => {
                let op = Arc::new(op.clone());
                let name: Arc<str> = Arc::from(name);
                let builder: InfixBuilder = Arc::new(move |a: Evaluable, b: Evaluable| Ok(build_infix(&op, &name, a, b)));
                Some(builder)
            }
            Operator::Eval(builder) => Some(Arc::clone(builder)),
            Operator::Postfix(_) => None,
        }
    }
}

fn build_infix(op: &Arc<InfixOperator>, name: &Arc<str>, a: Evaluable, b: Evaluable) -> Evaluable {
    if let (Some(x), Some(y)) = (a.const_value(), b.const_value()) {
        let folded = match op.short_circuit(x) {
            Some(decided) => Ok(decided),
            None => op.apply(name, x.clone(), y.clone()),
        };
        match folded {
            Ok(value) => return Evaluable::constant(value),
            Err(err) => tracing::trace!(operator = %name, %err, "constant operands left unfolded"),
        }
    }

    let op = Arc::clone(op);
    let name = Arc::clone(name);
    Evaluable::new(move |ctx, input| {
        let left = a.eval(ctx, input)?;
        if let Some(decided) = op.short_circuit(&left) {
            return Ok(decided);
        }
        let right = b.eval(ctx, input)?;
        op.apply(&name, left, right)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_body() -> InfixOperator {
        InfixOperator {
            number: Some(Arc::new(|a: f64, b: f64| Ok(Value::Number(a + b)))),
            ..Default::default()
        }
    }

    fn text_body() -> InfixOperator {
        InfixOperator {
            text: Some(Arc::new(|a: &str, b: &str| Ok(Value::String(format!("{a}{b}"))))),
            ..Default::default()
        }
    }

    #[test]
    fn test_prefix_key_for_name() {
        assert_eq!(PrefixKey::for_name("-"), PrefixKey::Token(TokenKind::Symbol('-')));
        assert_eq!(PrefixKey::for_name("x"), PrefixKey::Name("x".into()));
        assert_eq!(PrefixKey::for_name("not"), PrefixKey::Name("not".into()));
    }

    #[test]
    fn test_dispatch_prefers_exact_types() {
        let Operator::Infix(plus) = Operator::merge(Some(&Operator::Infix(number_body())), &Operator::Infix(text_body()))
        else {
            panic!("expected infix");
        };
        assert_eq!(plus.apply("+", Value::Number(1.0), Value::Number(2.0)), Ok(Value::Number(3.0)));
        assert_eq!(plus.apply("+", "a".into(), "b".into()), Ok(Value::from("ab")));
        assert_eq!(plus.apply("+", "1".into(), Value::Number(2.0)), Ok(Value::Number(3.0)));
        assert_eq!(plus.apply("+", "a".into(), Value::Number(2.0)), Ok(Value::from("a2")));
    }

    #[test]
    fn test_single_body_mismatch_names_operand() {
        let err = number_body().apply("+", Value::Number(1.0), Value::Bool(true)).unwrap_err();
        assert_eq!(err.to_string(), "unexpected true (bool) for operator +, expected number");
    }

    #[test]
    fn test_eval_definition_replaces_typed_bodies() {
        fn left(a: Evaluable, _: Evaluable) -> Result<Evaluable, ParseError> {
            Ok(a)
        }
        let eval = Operator::Eval(Arc::new(left));
        let merged = Operator::merge(Some(&Operator::Infix(number_body())), &eval);
        assert!(matches!(merged, Operator::Eval(_)));
        let back = Operator::merge(Some(&merged), &Operator::Infix(text_body()));
        let Operator::Infix(op) = back else { panic!("expected infix") };
        assert!(op.sealed);
        assert!(op.number.is_none());
    }
}

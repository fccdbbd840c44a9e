//! Operator registries and their composition.

use crate::error::{Error, EvalError, ParseError};
use crate::eval_ctx::EvalCtx;
use crate::evaluable::{Evaluable, Evaluables};
use crate::parser::Parser;
use crate::types::{
    Extension, InfixBuilder, InfixOperator, Operator, PostfixFn, Precedence, PrefixKey, SelectorFn,
};
use crate::value::Value;
use exprkit_scanner::TokenKind;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Options for [`Language::compile_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Maximum nesting of sub-expressions before compilation fails.
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { max_depth: 256 }
    }
}

#[derive(Clone, Default)]
struct Definitions {
    tokens: HashMap<TokenKind, Extension>,
    keywords: HashMap<String, Extension>,
    operators: HashMap<String, Operator>,
    precedences: HashMap<String, Precedence>,
    init: Option<Extension>,
    default: Option<Extension>,
    selector: Option<SelectorFn>,
    // Derived from `operators`.
    operator_prefixes: HashSet<String>,
    operator_symbols: HashSet<char>,
}

fn extension<F>(f: F) -> Extension
where
    F: Fn(&mut Parser<'_>) -> Result<Evaluable, ParseError> + Send + Sync + 'static,
{
    Arc::new(f)
}

impl Definitions {
    fn add_prefix(&mut self, key: PrefixKey, extension: Extension) {
        match key {
            PrefixKey::Token(kind) => self.tokens.insert(kind, extension),
            PrefixKey::Name(name) => self.keywords.insert(name, extension),
        };
    }

    fn reindex(&mut self) {
        self.operator_prefixes.clear();
        self.operator_symbols.clear();
        for name in self.operators.keys() {
            for (i, c) in name.char_indices() {
                self.operator_prefixes.insert(name[..i + c.len_utf8()].to_string());
                if !c.is_alphanumeric() && c != '_' {
                    self.operator_symbols.insert(c);
                }
            }
        }
    }
}

/// An immutable registry of prefix extensions, operators and precedences.
///
/// Languages are built from single-definition constructors and combined
/// with [`Language::compose`]. Composition is right-biased: for every name a
/// later language defines, its definition wins. Typed infix bodies for the
/// same name are overlaid slot by slot, so composing a numeric `+` with a
/// text `+` yields an operator that handles both.
///
/// ```
/// use exprkit::{dialects, Language, Value};
///
/// let lang = Language::compose([
///     dialects::arithmetic(),
///     Language::constant("answer", 42.0),
/// ]);
/// assert_eq!(lang.evaluate("answer / 2", &Value::Null).unwrap(), Value::Number(21.0));
/// ```
#[derive(Clone, Default)]
pub struct Language(Arc<Definitions>);

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operators: Vec<&String> = self.0.operators.keys().collect();
        operators.sort();
        let mut keywords: Vec<&String> = self.0.keywords.keys().collect();
        keywords.sort();
        f.debug_struct("Language")
            .field("operators", &operators)
            .field("keywords", &keywords)
            .field("tokens", &self.0.tokens.len())
            .finish_non_exhaustive()
    }
}

impl Language {
    pub fn new() -> Self {
        Language::default()
    }

    fn single(define: impl FnOnce(&mut Definitions)) -> Self {
        let mut defs = Definitions::default();
        define(&mut defs);
        defs.reindex();
        Language(Arc::new(defs))
    }

    /// Combines languages left to right; later definitions win.
    pub fn compose<I: IntoIterator<Item = Language>>(languages: I) -> Language {
        languages
            .into_iter()
            .fold(Language::default(), |acc, next| acc.merge(&next))
    }

    /// `self` composed with `other`, `other` taking precedence.
    pub fn merge(&self, other: &Language) -> Language {
        let mut defs = (*self.0).clone();
        let next = &*other.0;
        for (kind, ext) in &next.tokens {
            defs.tokens.insert(*kind, Arc::clone(ext));
        }
        for (name, ext) in &next.keywords {
            defs.keywords.insert(name.clone(), Arc::clone(ext));
        }
        for (name, op) in &next.operators {
            let merged = Operator::merge(defs.operators.get(name), op);
            defs.operators.insert(name.clone(), merged);
        }
        for (name, precedence) in &next.precedences {
            defs.precedences.insert(name.clone(), *precedence);
        }
        if next.init.is_some() {
            defs.init = next.init.clone();
        }
        if next.default.is_some() {
            defs.default = next.default.clone();
        }
        if next.selector.is_some() {
            defs.selector = next.selector.clone();
        }
        defs.reindex();
        Language(Arc::new(defs))
    }

    // ------------------------------------------------------------ Constructors

    /// A named constant, resolved at compile time.
    pub fn constant(name: &str, value: impl Into<Value>) -> Language {
        let value = value.into();
        let key = PrefixKey::for_name(name);
        Language::single(|defs| {
            defs.add_prefix(key, extension(move |_| Ok(Evaluable::constant(value.clone()))));
        })
    }

    /// A function over already-evaluated arguments. `name(a, b)` calls it
    /// with the arguments; a bare `name` calls it with none.
    pub fn function<F>(name: &str, f: F) -> Language
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Language::function_with_context(name, move |_, args| f(args))
    }

    pub fn function_with_context<F>(name: &str, f: F) -> Language
    where
        F: Fn(&EvalCtx, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let key = PrefixKey::for_name(name);
        Language::single(|defs| {
            defs.add_prefix(
                key,
                extension(move |p| {
                    let args = if p.scan() == TokenKind::Symbol('(') {
                        p.parse_arguments()?
                    } else {
                        p.camouflage("function call", &[TokenKind::Symbol('(')]);
                        Vec::new()
                    };
                    let f = Arc::clone(&f);
                    Ok(Evaluable::new(move |ctx, input| {
                        let values = args.eval_all(ctx, input)?;
                        f(ctx, &values)
                    }))
                }),
            );
        })
    }

    /// A unary operator applied to the next operand (not the whole rest of
    /// the expression), so `-a * b` is `(-a) * b`.
    pub fn prefix_operator<F>(name: &str, f: F) -> Language
    where
        F: Fn(Value) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let key = PrefixKey::for_name(name);
        let op_name: Arc<str> = Arc::from(name);
        Language::single(|defs| {
            defs.add_prefix(
                key,
                extension(move |p| {
                    let operand = p.parse_next_expression()?;
                    if let Some(value) = operand.const_value() {
                        match f(value.clone()) {
                            Ok(folded) => return Ok(Evaluable::constant(folded)),
                            Err(err) => {
                                tracing::trace!(operator = %op_name, %err, "constant operand left unfolded")
                            }
                        }
                    }
                    let f = Arc::clone(&f);
                    Ok(Evaluable::new(move |ctx, input| f(operand.eval(ctx, input)?)))
                }),
            );
        })
    }

    /// A custom parser for a token kind or keyword.
    pub fn prefix_extension<F>(key: impl Into<PrefixKey>, f: F) -> Language
    where
        F: Fn(&mut Parser<'_>) -> Result<Evaluable, ParseError> + Send + Sync + 'static,
    {
        let key = key.into();
        Language::single(|defs| defs.add_prefix(key, extension(f)))
    }

    /// Fallback for any token without a prefix extension (except end of input).
    pub fn default_extension<F>(f: F) -> Language
    where
        F: Fn(&mut Parser<'_>) -> Result<Evaluable, ParseError> + Send + Sync + 'static,
    {
        Language::single(|defs| defs.default = Some(Arc::new(f)))
    }

    /// Replaces the top-level parse of this language, also when entered as a
    /// sub-language.
    pub fn init<F>(f: F) -> Language
    where
        F: Fn(&mut Parser<'_>) -> Result<Evaluable, ParseError> + Send + Sync + 'static,
    {
        Language::single(|defs| defs.init = Some(Arc::new(f)))
    }

    /// Infix operator over any pair of values.
    pub fn infix_operator<F>(name: &str, f: F) -> Language
    where
        F: Fn(Value, Value) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Language::infix(name, InfixOperator {
            arbitrary: Some(Arc::new(f)),
            ..Default::default()
        })
    }

    /// Infix operator over numbers; operands are coerced when needed.
    pub fn infix_number_operator<F>(name: &str, f: F) -> Language
    where
        F: Fn(f64, f64) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Language::infix(name, InfixOperator {
            number: Some(Arc::new(f)),
            ..Default::default()
        })
    }

    pub fn infix_decimal_operator<F>(name: &str, f: F) -> Language
    where
        F: Fn(Decimal, Decimal) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Language::infix(name, InfixOperator {
            decimal: Some(Arc::new(f)),
            ..Default::default()
        })
    }

    pub fn infix_bool_operator<F>(name: &str, f: F) -> Language
    where
        F: Fn(bool, bool) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Language::infix(name, InfixOperator {
            boolean: Some(Arc::new(f)),
            ..Default::default()
        })
    }

    pub fn infix_text_operator<F>(name: &str, f: F) -> Language
    where
        F: Fn(&str, &str) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Language::infix(name, InfixOperator {
            text: Some(Arc::new(f)),
            ..Default::default()
        })
    }

    /// Short-circuit predicate for an infix operator. When it returns
    /// `Some`, the right operand is never evaluated. Either way the left
    /// operand is evaluated exactly once: when the predicate returns `None`
    /// its value is passed on to the operator body.
    pub fn infix_short_circuit<F>(name: &str, f: F) -> Language
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        Language::infix(name, InfixOperator {
            short_circuit: Some(Arc::new(f)),
            ..Default::default()
        })
    }

    /// Infix operator receiving its operands unevaluated.
    pub fn infix_eval_operator<F>(name: &str, f: F) -> Language
    where
        F: Fn(Evaluable, Evaluable) -> Result<Evaluable, ParseError> + Send + Sync + 'static,
    {
        let builder: InfixBuilder = Arc::new(f);
        let name = name.to_string();
        Language::single(|defs| {
            defs.operators.insert(name, Operator::Eval(builder));
        })
    }

    /// Operator that takes over parsing after its left operand, like the
    /// ternary `?`.
    pub fn postfix_operator<F>(name: &str, f: F) -> Language
    where
        F: Fn(&mut Parser<'_>, Evaluable) -> Result<Evaluable, ParseError> + Send + Sync + 'static,
    {
        let postfix: PostfixFn = Arc::new(f);
        let name = name.to_string();
        Language::single(|defs| {
            defs.operators.insert(name, Operator::Postfix(postfix));
        })
    }

    pub fn precedence(name: &str, level: i32) -> Language {
        let name = name.to_string();
        Language::single(|defs| {
            defs.precedences.insert(name, Precedence { level, right_assoc: false });
        })
    }

    /// Precedence for an operator that groups to the right: `a ** b ** c`
    /// is `a ** (b ** c)`.
    pub fn right_associative(name: &str, level: i32) -> Language {
        let name = name.to_string();
        Language::single(|defs| {
            defs.precedences.insert(name, Precedence { level, right_assoc: true });
        })
    }

    /// Replaces how variable paths are resolved.
    pub fn variable_selector<F>(f: F) -> Language
    where
        F: Fn(Vec<Evaluable>) -> Evaluable + Send + Sync + 'static,
    {
        Language::single(|defs| defs.selector = Some(Arc::new(f)))
    }

    fn infix(name: &str, op: InfixOperator) -> Language {
        let name = name.to_string();
        Language::single(|defs| {
            defs.operators.insert(name, Operator::Infix(op));
        })
    }

    // ------------------------------------------------------------ Lookups

    pub fn has_operator(&self, name: &str) -> bool {
        self.0.operators.contains_key(name)
    }

    pub fn has_prefix(&self, key: &PrefixKey) -> bool {
        match key {
            PrefixKey::Token(kind) => self.0.tokens.contains_key(kind),
            PrefixKey::Name(name) => self.0.keywords.contains_key(name),
        }
    }

    /// Precedence of `name`; operators without one bind at level 0.
    pub fn precedence_of(&self, name: &str) -> Precedence {
        self.0.precedences.get(name).copied().unwrap_or_default()
    }

    pub(crate) fn token_extension(&self, kind: TokenKind) -> Option<Extension> {
        self.0.tokens.get(&kind).cloned()
    }

    pub(crate) fn keyword_extension(&self, name: &str) -> Option<Extension> {
        self.0.keywords.get(name).cloned()
    }

    pub(crate) fn default_ext(&self) -> Option<Extension> {
        self.0.default.clone()
    }

    pub(crate) fn init_ext(&self) -> Option<Extension> {
        self.0.init.clone()
    }

    pub(crate) fn selector(&self) -> Option<SelectorFn> {
        self.0.selector.clone()
    }

    pub(crate) fn operator(&self, name: &str) -> Option<Operator> {
        self.0.operators.get(name).cloned()
    }

    pub(crate) fn is_operator_symbol(&self, c: char) -> bool {
        self.0.operator_symbols.contains(&c)
    }

    pub(crate) fn is_operator_prefix(&self, text: &str) -> bool {
        self.0.operator_prefixes.contains(text)
    }

    // ------------------------------------------------------------ Entry points

    pub fn compile(&self, expression: &str) -> Result<Evaluable, Error> {
        self.compile_with(expression, &CompileOptions::default())
    }

    #[tracing::instrument(level = "debug", skip(self, options), err)]
    pub fn compile_with(&self, expression: &str, options: &CompileOptions) -> Result<Evaluable, Error> {
        let mut parser = Parser::new(expression, self.clone(), options.max_depth);
        parser.parse_all().map_err(|source| Error::Parse {
            position: parser.position(),
            source,
        })
    }

    /// Compiles and evaluates once with a background context.
    pub fn evaluate(&self, expression: &str, input: &Value) -> Result<Value, Error> {
        self.evaluate_with_context(&EvalCtx::background(), expression, input)
    }

    #[tracing::instrument(level = "debug", skip(self, ctx, input), err)]
    pub fn evaluate_with_context(&self, ctx: &EvalCtx, expression: &str, input: &Value) -> Result<Value, Error> {
        let evaluable = self.compile(expression)?;
        Ok(evaluable.eval(ctx, input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_index_tracks_symbols_and_prefixes() {
        let lang = Language::compose([
            Language::infix_number_operator("**", |a, b| Ok(Value::Number(a.powf(b)))),
            Language::infix_text_operator("sw", |a, b| Ok(Value::Bool(a.starts_with(b)))),
        ]);
        assert!(lang.is_operator_symbol('*'));
        assert!(!lang.is_operator_symbol('s'));
        assert!(lang.is_operator_prefix("*"));
        assert!(lang.is_operator_prefix("**"));
        assert!(!lang.is_operator_prefix("***"));
    }

    #[test]
    fn test_later_precedence_wins() {
        let lang = Language::compose([Language::precedence("+", 10), Language::precedence("+", 20)]);
        assert_eq!(lang.precedence_of("+").level, 20);
        assert_eq!(lang.precedence_of("-"), Precedence::default());
    }

    #[test]
    fn test_constant_key_kinds() {
        let lang = Language::compose([Language::constant("half", 0.5), Language::constant("$", 1.0)]);
        assert!(lang.has_prefix(&PrefixKey::Name("half".into())));
        assert!(lang.has_prefix(&PrefixKey::Token(TokenKind::Symbol('$'))));
    }
}

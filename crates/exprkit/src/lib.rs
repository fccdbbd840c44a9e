//! Composable expression languages.
//!
//! # Overview
//!
//! An expression such as `order.total > 100 && "vip" in customer.tags` is
//! compiled once into an [`Evaluable`] and then evaluated against any number
//! of input [`Value`]s. What the expression may contain is decided by a
//! [`Language`]: a table of literals, prefix, infix and postfix operators,
//! functions and precedences. Languages are plain values. They are built
//! from small definitions and combined with [`Language::compose`], where
//! later definitions override earlier ones, so a dialect can be assembled
//! from the building blocks in [`dialects`] and extended with its own
//! operators.
//!
//! # Example
//!
//! ```
//! use exprkit::{dialects, EvalCtx, Language, Value};
//! use serde_json::json;
//!
//! let input = Value::from(json!({"order": {"total": 120, "items": ["tea", "cake"]}}));
//! assert_eq!(
//!     exprkit::evaluate("order.total > 100 && \"tea\" in order.items", &input).unwrap(),
//!     Value::Bool(true),
//! );
//!
//! let lang = Language::compose([
//!     dialects::full(),
//!     Language::function("discount", |args| Ok(Value::Number(args.len() as f64 * 5.0))),
//! ]);
//! let compiled = lang.compile("order.total - discount(1, 2)").unwrap();
//! assert_eq!(compiled.eval(&EvalCtx::background(), &input).unwrap(), Value::Number(110.0));
//! ```

pub mod dialects;
pub mod error;
pub mod eval_ctx;
pub mod evaluable;
pub mod language;
pub mod parser;
pub mod selector;
mod types;
pub mod util;
pub mod value;

pub use error::{Error, EvalError, ParseError};
pub use eval_ctx::{CancelHandle, EvalCtx};
pub use evaluable::{Evaluable, Evaluables};
pub use exprkit_scanner::{Position, TokenKind};
pub use language::{CompileOptions, Language};
pub use parser::Parser;
pub use selector::{MissingField, Selector};
pub use types::{Precedence, PrefixKey};
pub use value::{Function, Map, Value};

/// Evaluates `expression` against `input` with [`dialects::full`].
pub fn evaluate(expression: &str, input: &Value) -> Result<Value, Error> {
    dialects::full().evaluate(expression, input)
}

/// Like [`evaluate`], with `extensions` composed over [`dialects::full`].
pub fn evaluate_with<I>(expression: &str, input: &Value, extensions: I) -> Result<Value, Error>
where
    I: IntoIterator<Item = Language>,
{
    let lang = std::iter::once(dialects::full()).chain(extensions);
    Language::compose(lang).evaluate(expression, input)
}

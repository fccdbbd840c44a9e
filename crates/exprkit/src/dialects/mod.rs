//! Built-in languages.
//!
//! Each function returns a [`Language`](crate::Language) that can be used on
//! its own or composed with others. Most include [`base`], so
//! `arithmetic()` alone already understands literals, variables and
//! parentheses. [`full`] combines all of them.

mod arithmetic;
mod base;
mod bitmask;
pub mod date;
mod decimal;
pub mod filter;
mod full;
mod json;
mod logic;
mod ternary;
mod text;
mod tolerant;

pub use arithmetic::arithmetic;
pub use base::{base, ident, parentheses};
pub use bitmask::bitmask;
pub use date::date;
pub use decimal::decimal_arithmetic;
pub use filter::filters;
pub use full::full;
pub use json::json;
pub use logic::propositional_logic;
pub use ternary::ternary_operator;
pub use text::text;
pub use tolerant::{tolerant_full, with_missing_field_policy};

//! Token source for exprkit expression languages.
//!
//! The [`Scanner`] splits an expression into identifiers, numbers, quoted
//! literals and single pass-through characters. It keeps a one-token pushback
//! buffer so a parser can hand a token it could not use back to whoever reads
//! next, and exposes the raw character stream through [`Scanner::peek`] and
//! [`Scanner::next`] for greedy multi-character operators.
//!
//! # Example
//!
//! ```
//! use exprkit_scanner::{Scanner, TokenKind};
//!
//! let mut scanner = Scanner::new("price * 1.5");
//! assert_eq!(scanner.scan(), TokenKind::Ident);
//! assert_eq!(scanner.token_text(), "price");
//! assert_eq!(scanner.scan(), TokenKind::Symbol('*'));
//! assert_eq!(scanner.scan(), TokenKind::Float);
//! assert_eq!(scanner.scan(), TokenKind::Eof);
//! ```

mod scanner;
mod token;
mod unquote;

pub use scanner::{default_is_ident_char, default_is_whitespace, IdentPredicate, Scanner, WhitespacePredicate};
pub use token::{Position, Token, TokenKind};
pub use unquote::{unquote, UnquoteError};

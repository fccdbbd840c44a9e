//! Character-level scanner producing [`Token`]s.

use crate::token::{Position, Token, TokenKind};
use std::fmt;
use std::sync::Arc;

/// Decides which characters separate tokens.
pub type WhitespacePredicate = Arc<dyn Fn(char) -> bool + Send + Sync>;

/// Decides whether `c` may appear at index `index` of an identifier.
pub type IdentPredicate = Arc<dyn Fn(char, usize) -> bool + Send + Sync>;

pub fn default_is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

pub fn default_is_ident_char(c: char, index: usize) -> bool {
    c.is_alphabetic() || c == '_' || (index > 0 && c.is_ascii_digit())
}

/// Splits an expression into tokens.
///
/// Recognized shapes:
/// - identifiers, as decided by the identifier predicate;
/// - integers (`42`, `0x2a`) and floats (`1.5`, `.5`, `2e10`);
/// - `"double"` strings, `'single'` char literals and `` `raw` `` strings,
///   returned with their quotes (see [`crate::unquote`]);
/// - any other character as [`TokenKind::Symbol`].
///
/// Malformed literals are never rejected here. An unterminated string runs
/// to the end of input and fails later when it is unquoted.
pub struct Scanner<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    token: Token,
    pushback: Option<Token>,
    is_whitespace: WhitespacePredicate,
    is_ident_char: IdentPredicate,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        let start = Position { offset: 0, line: 1, column: 1 };
        Scanner {
            src,
            offset: 0,
            line: 1,
            column: 1,
            token: Token::eof(start),
            pushback: None,
            is_whitespace: Arc::new(default_is_whitespace),
            is_ident_char: Arc::new(default_is_ident_char),
        }
    }

    /// Reads the next token, or returns the pushed-back one if present.
    pub fn scan(&mut self) -> TokenKind {
        if let Some(token) = self.pushback.take() {
            self.token = token;
            return token.kind;
        }
        self.skip_whitespace();
        let position = self.here();
        let Some(c) = self.peek() else {
            self.token = Token::eof(position);
            return TokenKind::Eof;
        };

        let kind = if (self.is_ident_char)(c, 0) {
            self.scan_ident()
        } else if c.is_ascii_digit() || (c == '.' && self.peek_second().is_some_and(|d| d.is_ascii_digit())) {
            self.scan_number()
        } else {
            self.bump();
            match c {
                '"' => {
                    self.scan_quoted('"', true);
                    TokenKind::String
                }
                '\'' => {
                    self.scan_quoted('\'', true);
                    TokenKind::Char
                }
                '`' => {
                    self.scan_quoted('`', false);
                    TokenKind::RawString
                }
                _ => TokenKind::Symbol(c),
            }
        };

        self.token = Token {
            kind,
            start: position.offset,
            end: self.offset,
            position,
        };
        kind
    }

    /// Pushes the current token back so the next [`Scanner::scan`] returns it
    /// again. Returns `false`, leaving the buffer untouched, when a token is
    /// already pushed back.
    pub fn unscan(&mut self) -> bool {
        if self.pushback.is_some() {
            return false;
        }
        self.pushback = Some(self.token);
        true
    }

    pub fn has_pushback(&self) -> bool {
        self.pushback.is_some()
    }

    /// The most recently scanned token.
    pub fn token(&self) -> Token {
        self.token
    }

    /// Source text of the most recently scanned token.
    pub fn token_text(&self) -> &'a str {
        &self.src[self.token.start..self.token.end]
    }

    /// Position of the most recently scanned token.
    pub fn position(&self) -> Position {
        self.token.position
    }

    /// The next raw character, without consuming it. Whitespace is not skipped.
    pub fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    /// Consumes and returns the next raw character.
    pub fn next(&mut self) -> Option<char> {
        self.bump()
    }

    pub fn is_at_end(&self) -> bool {
        self.pushback.is_none() && self.offset >= self.src.len()
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    pub fn set_whitespace(&mut self, predicate: WhitespacePredicate) {
        self.is_whitespace = predicate;
    }

    pub fn whitespace(&self) -> WhitespacePredicate {
        Arc::clone(&self.is_whitespace)
    }

    pub fn set_is_ident_char(&mut self, predicate: IdentPredicate) {
        self.is_ident_char = predicate;
    }

    pub fn is_ident_char(&self) -> IdentPredicate {
        Arc::clone(&self.is_ident_char)
    }

    fn here(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !(self.is_whitespace)(c) {
                break;
            }
            self.bump();
        }
    }

    fn scan_ident(&mut self) -> TokenKind {
        self.bump();
        let mut index = 1;
        while let Some(c) = self.peek() {
            if !(self.is_ident_char)(c, index) {
                break;
            }
            self.bump();
            index += 1;
        }
        TokenKind::Ident
    }

    fn scan_number(&mut self) -> TokenKind {
        if self.peek() == Some('0') && matches!(self.peek_second(), Some('x' | 'X')) {
            self.bump();
            self.bump();
            self.skip_digits(16);
            return TokenKind::Int;
        }

        let mut kind = TokenKind::Int;
        self.skip_digits(10);
        if self.peek() == Some('.') {
            self.bump();
            self.skip_digits(10);
            kind = TokenKind::Float;
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            self.skip_digits(10);
            kind = TokenKind::Float;
        }
        kind
    }

    fn skip_digits(&mut self, radix: u32) {
        while self.peek().is_some_and(|c| c.is_digit(radix)) {
            self.bump();
        }
    }

    // The opening quote is already consumed.
    fn scan_quoted(&mut self, quote: char, escapes: bool) {
        while let Some(c) = self.bump() {
            if c == quote {
                return;
            }
            if escapes && c == '\\' {
                self.bump();
            }
        }
    }
}

impl fmt::Debug for Scanner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("offset", &self.offset)
            .field("token", &self.token)
            .field("pushback", &self.pushback)
            .finish_non_exhaustive()
    }
}

use std::fmt;

/// Kind of a scanned token.
///
/// Every character that does not start an identifier, number or quoted
/// literal is passed through as [`TokenKind::Symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Ident,
    Int,
    Float,
    Char,
    String,
    RawString,
    Symbol(char),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Eof => f.write_str("EOF"),
            TokenKind::Ident => f.write_str("Ident"),
            TokenKind::Int => f.write_str("Int"),
            TokenKind::Float => f.write_str("Float"),
            TokenKind::Char => f.write_str("Char"),
            TokenKind::String => f.write_str("String"),
            TokenKind::RawString => f.write_str("RawString"),
            TokenKind::Symbol(c) => write!(f, "{c:?}"),
        }
    }
}

/// Line and column (both 1-based) of a token start, plus its byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A scanned token: its kind, byte span in the source and start position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub position: Position,
}

impl Token {
    pub(crate) fn eof(position: Position) -> Self {
        Token {
            kind: TokenKind::Eof,
            start: position.offset,
            end: position.offset,
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_display_is_quoted() {
        assert_eq!(TokenKind::Symbol('(').to_string(), "'('");
        assert_eq!(TokenKind::Eof.to_string(), "EOF");
    }

    #[test]
    fn test_position_display() {
        let pos = Position { offset: 4, line: 2, column: 3 };
        assert_eq!(pos.to_string(), "2:3");
    }
}

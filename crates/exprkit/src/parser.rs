//! Precedence-climbing parser driven by a [`Language`].

use crate::error::ParseError;
use crate::evaluable::Evaluable;
use crate::language::Language;
use crate::selector::{self, MissingField};
use crate::types::{InfixBuilder, Operator, Precedence};
use crate::value::Value;
use exprkit_scanner::{Position, Scanner, TokenKind};
use std::sync::Arc;

/// Why the current token was pushed back; reported if nobody consumes it.
#[derive(Debug)]
struct Expectation {
    unit: String,
    expected: Vec<TokenKind>,
}

/// An operand waiting for its right-hand side.
struct Stage {
    left: Evaluable,
    builder: InfixBuilder,
    precedence: Precedence,
}

#[derive(Default)]
struct StageStack(Vec<Stage>);

impl StageStack {
    /// Pushes `stage`, first folding every pending stage that binds at least
    /// as tightly into its left operand.
    fn push(&mut self, mut stage: Stage) -> Result<(), ParseError> {
        while let Some(top) = self.0.last() {
            let binds_left = top.precedence.level > stage.precedence.level
                || (top.precedence.level == stage.precedence.level && !stage.precedence.right_assoc);
            if !binds_left {
                break;
            }
            let Some(top) = self.0.pop() else { break };
            stage.left = (top.builder)(top.left, stage.left)?;
        }
        self.0.push(stage);
        Ok(())
    }

    /// Folds pending stages at or above `level` into `operand`.
    fn reduce(&mut self, level: i32, mut operand: Evaluable) -> Result<Evaluable, ParseError> {
        while self.0.last().is_some_and(|top| top.precedence.level >= level) {
            let Some(top) = self.0.pop() else { break };
            operand = (top.builder)(top.left, operand)?;
        }
        Ok(operand)
    }

    fn finish(mut self, mut operand: Evaluable) -> Result<Evaluable, ParseError> {
        while let Some(top) = self.0.pop() {
            operand = (top.builder)(top.left, operand)?;
        }
        Ok(operand)
    }
}

enum Step {
    Infix(Stage),
    Done(Evaluable),
}

/// Parser state handed to extensions.
///
/// Extensions read tokens with [`Parser::scan`], recurse with
/// [`Parser::parse_expression`] or [`Parser::parse_next_expression`], and
/// hand back a token they cannot use with [`Parser::camouflage`].
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    language: Language,
    pending: Option<Expectation>,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(expression: &'a str, language: Language, max_depth: usize) -> Self {
        Parser {
            scanner: Scanner::new(expression),
            language,
            pending: None,
            depth: 0,
            max_depth,
        }
    }

    /// Parses a whole expression and requires the input to be consumed.
    pub(crate) fn parse_all(&mut self) -> Result<Evaluable, ParseError> {
        let evaluable = self.parse_language()?;
        self.expect_end()?;
        Ok(evaluable)
    }

    fn parse_language(&mut self) -> Result<Evaluable, ParseError> {
        match self.language.init_ext() {
            Some(init) => init(self),
            None => self.parse_expression(),
        }
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        if self.scanner.has_pushback() {
            if self.scanner.token().kind == TokenKind::Eof {
                return Ok(());
            }
            let (unit, expected) = match self.pending.take() {
                Some(Expectation { unit, expected }) => (unit, expected),
                None => ("end of expression".to_string(), vec![TokenKind::Eof]),
            };
            return Err(self.expected(&unit, &expected));
        }
        match self.scan() {
            TokenKind::Eof => Ok(()),
            _ => Err(self.expected("end of expression", &[TokenKind::Eof])),
        }
    }

    // ------------------------------------------------------------ Tokens

    /// Reads the next token, taking a pushed-back one first.
    pub fn scan(&mut self) -> TokenKind {
        self.pending = None;
        self.scanner.scan()
    }

    /// Pushes the current token back for the next reader. `unit` and
    /// `expected` describe what this caller was looking for and end up in
    /// the error if the token is never consumed.
    ///
    /// # Panics
    ///
    /// If a token is already pushed back. Only one token can be, so every
    /// camouflage must follow a scan.
    pub fn camouflage(&mut self, unit: &str, expected: &[TokenKind]) {
        assert!(
            self.scanner.unscan(),
            "camouflage({unit}) called with a token already pushed back"
        );
        self.pending = Some(Expectation {
            unit: unit.to_string(),
            expected: expected.to_vec(),
        });
    }

    pub fn is_camouflaged(&self) -> bool {
        self.scanner.has_pushback()
    }

    /// The next raw character after the current token.
    pub fn peek(&self) -> Option<char> {
        self.scanner.peek()
    }

    /// Consumes the next raw character.
    pub fn next(&mut self) -> Option<char> {
        self.scanner.next()
    }

    pub fn token_text(&self) -> &'a str {
        self.scanner.token_text()
    }

    pub fn token_kind(&self) -> TokenKind {
        self.scanner.token().kind
    }

    pub fn position(&self) -> Position {
        self.scanner.position()
    }

    /// Error for the current token, naming what `unit` would have accepted.
    pub fn expected(&self, unit: &str, expected: &[TokenKind]) -> ParseError {
        let kind = self.token_kind();
        let found = match kind {
            TokenKind::Eof | TokenKind::Symbol(_) => kind.to_string(),
            _ => format!("{kind} {:?}", self.token_text()),
        };
        ParseError::Unexpected {
            found,
            unit: unit.to_string(),
            expected: expected.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn set_whitespace<F>(&mut self, f: F)
    where
        F: Fn(char) -> bool + Send + Sync + 'static,
    {
        self.scanner.set_whitespace(Arc::new(f));
    }

    pub fn set_is_ident_char<F>(&mut self, f: F)
    where
        F: Fn(char, usize) -> bool + Send + Sync + 'static,
    {
        self.scanner.set_is_ident_char(Arc::new(f));
    }

    // ------------------------------------------------------------ Building blocks

    pub fn constant(&self, value: impl Into<Value>) -> Evaluable {
        Evaluable::constant(value.into())
    }

    /// Variable path through the language's selector, strict by default.
    pub fn var(&self, path: Vec<Evaluable>) -> Evaluable {
        match self.language.selector() {
            Some(select) => select(path),
            None => selector::variable(path, MissingField::Error),
        }
    }

    /// Parses `a, b, c)` after an opening parenthesis was scanned.
    pub fn parse_arguments(&mut self) -> Result<Vec<Evaluable>, ParseError> {
        let mut args = Vec::new();
        if self.scan() == TokenKind::Symbol(')') {
            return Ok(args);
        }
        self.camouflage("arguments", &[TokenKind::Symbol(')')]);
        loop {
            args.push(self.parse_expression()?);
            match self.scan() {
                TokenKind::Symbol(')') => return Ok(args),
                TokenKind::Symbol(',') => {}
                _ => return Err(self.expected("arguments", &[TokenKind::Symbol(')'), TokenKind::Symbol(',')])),
            }
        }
    }

    // ------------------------------------------------------------ Expressions

    /// Parses a full expression: operands joined by infix and postfix
    /// operators, stopping at the first token that is not an operator.
    pub fn parse_expression(&mut self) -> Result<Evaluable, ParseError> {
        self.descend()?;
        let result = self.parse_stages();
        self.depth -= 1;
        result
    }

    /// Parses one operand: a literal, a prefix construct or a prefix
    /// operator applied to the following operand.
    pub fn parse_next_expression(&mut self) -> Result<Evaluable, ParseError> {
        self.descend()?;
        let result = self.parse_prefix();
        self.depth -= 1;
        result
    }

    /// Parses the following input with `language`, then switches back.
    ///
    /// The outer language and scanner settings are restored whether or not
    /// parsing succeeds.
    ///
    /// # Panics
    ///
    /// If a token is pushed back, since it was scanned under the outer
    /// language's rules.
    pub fn parse_sublanguage(&mut self, language: &Language) -> Result<Evaluable, ParseError> {
        assert!(
            !self.scanner.has_pushback(),
            "parse_sublanguage called with a token pushed back"
        );
        tracing::trace!(?language, "entering sub-language");
        let outer = std::mem::replace(&mut self.language, language.clone());
        let whitespace = self.scanner.whitespace();
        let is_ident_char = self.scanner.is_ident_char();
        self.scanner.set_whitespace(Arc::new(exprkit_scanner::default_is_whitespace));
        self.scanner.set_is_ident_char(Arc::new(exprkit_scanner::default_is_ident_char));

        let result = self.parse_language();

        self.language = outer;
        self.scanner.set_whitespace(whitespace);
        self.scanner.set_is_ident_char(is_ident_char);
        result
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        if self.depth >= self.max_depth {
            return Err(ParseError::TooDeep(self.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_stages(&mut self) -> Result<Evaluable, ParseError> {
        let mut stages = StageStack::default();
        loop {
            let operand = self.parse_next_expression()?;
            match self.parse_operator(&mut stages, operand)? {
                Step::Infix(stage) => stages.push(stage)?,
                Step::Done(evaluable) => return stages.finish(evaluable),
            }
        }
    }

    fn parse_prefix(&mut self) -> Result<Evaluable, ParseError> {
        let kind = self.scan();
        if kind == TokenKind::Ident {
            if let Some(keyword) = self.language.keyword_extension(self.token_text()) {
                return keyword(self);
            }
        }
        if let Some(extension) = self.language.token_extension(kind) {
            return extension(self);
        }
        if kind != TokenKind::Eof {
            if let Some(fallback) = self.language.default_ext() {
                return fallback(self);
            }
        }
        Err(self.expected("extensions", &[]))
    }

    fn parse_operator(&mut self, stages: &mut StageStack, mut operand: Evaluable) -> Result<Step, ParseError> {
        loop {
            let kind = self.scan();
            let mut name = self.token_text().to_string();
            let mut must_be_operator = false;
            match kind {
                TokenKind::Symbol(c) if self.language.is_operator_symbol(c) => {
                    while let Some(next) = self.peek() {
                        if !self.language.is_operator_symbol(next) {
                            break;
                        }
                        name.push(next);
                        if !self.language.is_operator_prefix(&name) {
                            name.pop();
                            break;
                        }
                        self.next();
                        must_be_operator = true;
                    }
                }
                TokenKind::Ident => {}
                _ => {
                    self.camouflage("operator", &[]);
                    return Ok(Step::Done(operand));
                }
            }

            match self.language.operator(&name) {
                Some(Operator::Postfix(postfix)) => {
                    let level = self.language.precedence_of(&name).level;
                    operand = stages.reduce(level, operand)?;
                    operand = postfix(self, operand)?;
                }
                Some(operator) => {
                    let Some(builder) = operator.builder(&name) else {
                        return Err(ParseError::UnknownOperator(name));
                    };
                    return Ok(Step::Infix(Stage {
                        left: operand,
                        builder,
                        precedence: self.language.precedence_of(&name),
                    }));
                }
                None if must_be_operator => return Err(ParseError::UnknownOperator(name)),
                None => {
                    self.camouflage("operator", &[]);
                    return Ok(Step::Done(operand));
                }
            }
        }
    }
}

impl std::fmt::Debug for Parser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("scanner", &self.scanner)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

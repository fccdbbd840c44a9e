use exprkit_scanner::{Position, UnquoteError};
use thiserror::Error;

/// Errors raised while compiling an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A token did not fit. `expected` lists what would have been accepted,
    /// empty when anything else was acceptable.
    #[error("unexpected {found} while scanning {unit}{}", expected_suffix(.expected))]
    Unexpected {
        found: String,
        unit: String,
        expected: Vec<String>,
    },

    #[error("unknown operator {0}")]
    UnknownOperator(String),

    #[error("could not parse string {text}: {source}")]
    InvalidString {
        text: String,
        #[source]
        source: UnquoteError,
    },

    #[error("could not parse number {0}")]
    InvalidNumber(String),

    #[error("invalid regular expression {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("expression nesting exceeds {0} levels")]
    TooDeep(usize),

    #[error("{0}")]
    Custom(String),
}

fn expected_suffix(expected: &[String]) -> String {
    match expected {
        [] => String::new(),
        [only] => format!(" expected {only}"),
        [init @ .., last] => format!(" expected {} or {last}", init.join(", ")),
    }
}

/// Errors raised while evaluating a compiled expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A variable path did not resolve. `path` is the dotted prefix up to and
    /// including the key that failed.
    #[error("unknown parameter {path}")]
    UnknownParameter { path: String },

    #[error("unknown function {name}")]
    UnknownFunction { name: String },

    #[error("could not call {name}: not a function")]
    NotAFunction { name: String },

    #[error("unexpected {value} ({actual}) for operator {operator}, expected {expected}")]
    TypeMismatch {
        operator: String,
        value: String,
        actual: &'static str,
        expected: &'static str,
    },

    #[error("cannot convert {value} ({actual}) to {expected}")]
    Conversion {
        value: String,
        actual: &'static str,
        expected: &'static str,
    },

    #[error("invalid operation ({left}) {operator} ({right})")]
    InvalidOperation {
        operator: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric overflow in {0}")]
    Overflow(String),

    #[error("invalid regular expression {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{name}: {message}")]
    Function { name: String, message: String },

    #[error("evaluation cancelled")]
    Cancelled,

    #[error("evaluation deadline exceeded")]
    DeadlineExceeded,

    #[error("{0}")]
    Other(String),
}

impl EvalError {
    /// True for both explicit cancellation and deadline expiry.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, EvalError::Cancelled | EvalError::DeadlineExceeded)
    }

    pub fn function(name: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Function {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Error returned by the compile-and-evaluate entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("parsing error at {position}: {source}")]
    Parse {
        position: Position,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl Error {
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Error::Parse { source, .. } => Some(source),
            Error::Eval(_) => None,
        }
    }

    pub fn as_eval(&self) -> Option<&EvalError> {
        match self {
            Error::Eval(err) => Some(err),
            Error::Parse { .. } => None,
        }
    }
}

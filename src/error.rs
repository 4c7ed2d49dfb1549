//! Error types for the two failure surfaces the crate exposes: parsing and evaluation.

use thiserror::Error;

/// One accumulated parse failure. The parser does not stop at the first error (see
/// [`crate::parser`]'s synchronize-and-continue recovery); it collects every `ParseError` it
/// hits and reports them all together.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            line,
            message: message.into(),
        }
    }
}

/// Any error raised while evaluating a parsed program.
///
/// Unlike [`ParseError`], these short-circuit: the first one raised propagates immediately up
/// through the call stack via `?` and aborts the rest of the evaluation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("identifier not found: {name}")]
    NameNotFound { name: String },

    #[error("unsupported operation: {op} on {type_name}")]
    UnsupportedOperation { op: String, type_name: &'static str },

    #[error("unsupported operation: {left} {op} {right}")]
    UnsupportedInfix {
        op: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("wrong number of arguments: expected {expected}, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("not a function: {type_name}")]
    NotCallable { type_name: &'static str },

    #[error("break outside of a loop")]
    BreakOutsideLoop,

    #[error("assignment to undefined name: {name}")]
    UndefinedAssignTarget { name: String },

    #[error("{0}")]
    Other(String),
}

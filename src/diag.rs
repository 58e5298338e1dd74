//! Fault reporting.
//!
//! Lexing and parsing accumulate syntax faults into a [`Diagnostics`] value instead of
//! aborting, so a single run reports every broken statement.  The evaluator stops at its first
//! runtime fault, which is recorded in the same place for the driver to inspect.

use std::fmt;

use thiserror::Error;

use crate::eval::RuntimeError;
use crate::token::{Token, TokenKind};

/// Line number (starting at one).
pub type Position = u32;

/// Where on its line a syntax fault was detected.
#[derive(Debug, PartialEq, Clone)]
pub enum Location {
    /// Reported by the scanner, which has no token to point at.
    Line,
    /// At the end of input.
    End,
    /// At the given lexeme.
    Lexeme(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Line => Ok(()),
            Location::End => write!(f, " at end"),
            Location::Lexeme(lexeme) => write!(f, " at '{}'", lexeme),
        }
    }
}

/// A lexical or grammatical fault.
#[derive(Debug, PartialEq, Clone, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct SyntaxError {
    pub line: Position,
    pub location: Location,
    pub message: String,
}

impl SyntaxError {
    pub fn at_line(line: Position, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            line,
            location: Location::Line,
            message: message.into(),
        }
    }

    pub fn at_token(token: &Token, message: impl Into<String>) -> SyntaxError {
        let location = if token.is(TokenKind::Eof) {
            Location::End
        } else {
            Location::Lexeme(token.lexeme.name().to_owned())
        };
        SyntaxError {
            line: token.line,
            location,
            message: message.into(),
        }
    }
}

/// Fault accumulator threaded through scanning, parsing and evaluation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    syntax_errors: Vec<SyntaxError>,
    runtime_error: Option<RuntimeError>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn syntax(&mut self, error: SyntaxError) {
        tracing::debug!(%error, "syntax fault");
        self.syntax_errors.push(error);
    }

    pub fn runtime(&mut self, error: RuntimeError) {
        tracing::debug!(%error, "runtime fault");
        self.runtime_error = Some(error);
    }

    pub fn had_syntax_error(&self) -> bool {
        !self.syntax_errors.is_empty()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.runtime_error.is_some()
    }

    pub fn syntax_errors(&self) -> &[SyntaxError] {
        &self.syntax_errors
    }

    pub fn runtime_error(&self) -> Option<&RuntimeError> {
        self.runtime_error.as_ref()
    }

    /// Forget syntax faults so that an interactive session survives a bad line.
    pub fn reset_syntax(&mut self) {
        self.syntax_errors.clear();
    }

    pub fn take_syntax(&mut self) -> Vec<SyntaxError> {
        std::mem::take(&mut self.syntax_errors)
    }

    pub fn take_runtime(&mut self) -> Option<RuntimeError> {
        self.runtime_error.take()
    }
}

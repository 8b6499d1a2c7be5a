//! Crate-wide error type for the AgeRun language core.

use std::fmt;

use thiserror::Error;

use crate::instr_ast::InstructionKind;

/// Result alias used throughout the core.
pub type AgeRunResult<T> = Result<T, AgeRunError>;

/// Every way a parse or evaluation step in the core can fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgeRunError {
    #[error("syntax error at byte {offset}: {message}")]
    Syntax { message: String, offset: usize },

    #[error("type error in {kind}: {message}")]
    Type {
        message: String,
        kind: InstructionKind,
    },

    #[error("path error: {message}")]
    Path { message: String },

    #[error("wrong number of arguments: expected {expected}, got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("arithmetic error: {message}")]
    Arithmetic { message: String },

    #[error("ownership error: {message}")]
    Ownership { message: String },
}

impl AgeRunError {
    pub fn syntax(message: impl Into<String>, offset: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            offset,
        }
    }

    pub fn type_error(message: impl Into<String>, kind: InstructionKind) -> Self {
        Self::Type {
            message: message.into(),
            kind,
        }
    }

    pub fn path(message: impl Into<String>) -> Self {
        Self::Path {
            message: message.into(),
        }
    }

    pub fn arity(expected: usize, actual: usize) -> Self {
        Self::Arity { expected, actual }
    }

    pub fn arithmetic(message: impl Into<String>) -> Self {
        Self::Arithmetic {
            message: message.into(),
        }
    }

    pub fn ownership(message: impl Into<String>) -> Self {
        Self::Ownership {
            message: message.into(),
        }
    }

    /// Byte offset carried by syntax errors, for callers that need to report `(line, error)`.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Syntax { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// A single reported error, as handed to a [`crate::log::LogSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedError {
    pub message: String,
    pub byte_offset: Option<usize>,
}

impl fmt::Display for LoggedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.byte_offset {
            Some(offset) => write!(f, "{} (at byte {offset})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

//! The external diagnostic-reporting contract (spec §6) and the two stock
//! implementations this crate ships. Parsers and evaluators only ever report
//! failures through this trait; none of them depend on a structured-logging
//! crate.

use std::cell::RefCell;

use crate::error::LoggedError;

/// Borrowed by parsers/evaluators; never owned or dropped by them.
pub trait LogSink {
    /// Report an error with no position information.
    fn error(&self, message: &str);

    /// Report an error at a specific byte offset within the source being parsed.
    fn error_at(&self, message: &str, byte_offset: usize);
}

/// The zero-cost no-op sink. Used whenever a caller does not care about
/// diagnostics; parsing and evaluation still fail via their `Result`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLogSink;

impl LogSink for NoLogSink {
    fn error(&self, _message: &str) {}
    fn error_at(&self, _message: &str, _byte_offset: usize) {}
}

/// An in-memory sink that records everything reported to it, for tests that
/// want to assert on exact error messages and offsets.
#[derive(Debug, Default)]
pub struct VecLogSink {
    entries: RefCell<Vec<LoggedError>>,
}

impl VecLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far, in report order.
    pub fn entries(&self) -> Vec<LoggedError> {
        self.entries.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl LogSink for VecLogSink {
    fn error(&self, message: &str) {
        self.entries.borrow_mut().push(LoggedError {
            message: message.to_string(),
            byte_offset: None,
        });
    }

    fn error_at(&self, message: &str, byte_offset: usize) {
        self.entries.borrow_mut().push(LoggedError {
            message: message.to_string(),
            byte_offset: Some(byte_offset),
        });
    }
}

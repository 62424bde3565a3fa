//! # Math Tools
//!
//! The arithmetic toolset handed to the math expert agent: integer addition and
//! subtraction, each recorded into an operation log, plus a query over the
//! log's most recent entries.
//!
//! ## Quick Start
//!
//! ```rust
//! use mathexpert::tools::MathTools;
//!
//! let math = MathTools::new();
//! assert_eq!(math.add(5, 3).unwrap(), 8);
//! assert_eq!(math.subtract(10, 4).unwrap(), 6);
//! assert_eq!(math.recent_history(), "5 + 3 = 8\n10 - 4 = 6");
//! ```
//!
//! ## History Window
//!
//! The log keeps every entry for the lifetime of the instance, but
//! [`MathTools::recent_history`] only ever surfaces the last
//! [`HISTORY_WINDOW`] of them, oldest first.
//!
//! ```rust
//! use mathexpert::tools::MathTools;
//!
//! let math = MathTools::new();
//! for i in 0..7 {
//!     math.add(i, 1).unwrap();
//! }
//! let history = math.recent_history();
//! assert_eq!(history.lines().count(), 5);
//! assert!(history.starts_with("2 + 1 = 3"));
//! assert_eq!(math.len(), 7);
//! ```
//!
//! ## Integer Policy
//!
//! Operands and results are `i64`. An operation whose result does not fit
//! fails with [`MathError::Overflow`] and leaves the log untouched.
//!
//! ## Thread Safety
//!
//! Appends happen under a mutex, so a single `MathTools` shared through an
//! `Arc` never loses an entry or records it out of order relative to the value
//! returned to its caller. The agent creates one instance per run.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Number of entries surfaced by [`MathTools::recent_history`].
pub const HISTORY_WINDOW: usize = 5;

/// Text returned by [`MathTools::recent_history`] before any operation ran.
pub const EMPTY_HISTORY: &str = "No previous operations";

/// The two operations the toolset knows how to record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
}

impl Operator {
    /// Symbol used when rendering a log entry.
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
        }
    }

    fn apply(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Operator::Add => a.checked_add(b),
            Operator::Subtract => a.checked_sub(b),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Errors raised by the arithmetic operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    /// The result of `a <op> b` does not fit in an `i64`.
    #[error("integer overflow computing {a} {op} {b}")]
    Overflow { op: Operator, a: i64, b: i64 },
}

/// Integer calculator that records every completed operation.
///
/// See the [module documentation](self) for the history semantics.
#[derive(Debug, Default)]
pub struct MathTools {
    history: Mutex<Vec<String>>,
}

impl MathTools {
    /// Create a toolset with an empty operation log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `a + b` and append `"<a> + <b> = <result>"` to the log.
    pub fn add(&self, a: i64, b: i64) -> Result<i64, MathError> {
        self.record(Operator::Add, a, b)
    }

    /// Return `a - b` and append `"<a> - <b> = <result>"` to the log.
    ///
    /// Negative operands are rendered as-is, so `subtract(-5, -2)` records
    /// `"-5 - -2 = -3"`.
    pub fn subtract(&self, a: i64, b: i64) -> Result<i64, MathError> {
        self.record(Operator::Subtract, a, b)
    }

    /// The last [`HISTORY_WINDOW`] entries joined by newlines, oldest first,
    /// or [`EMPTY_HISTORY`] when nothing has been recorded.
    ///
    /// This is a pure query: the underlying log is never truncated.
    pub fn recent_history(&self) -> String {
        let history = self.lock();
        if history.is_empty() {
            return EMPTY_HISTORY.to_string();
        }
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        history[start..].join("\n")
    }

    /// Total number of operations recorded so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the full log, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    fn record(&self, op: Operator, a: i64, b: i64) -> Result<i64, MathError> {
        let result = op.apply(a, b).ok_or(MathError::Overflow { op, a, b })?;
        let mut history = self.lock();
        history.push(format!("{} {} {} = {}", a, op, b, result));
        Ok(result)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

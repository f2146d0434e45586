//! Centralised error hierarchy for the **Quill interpreter**.
//!
//! All subsystems (scanner, parser, runtime, CLI) convert their internal
//! failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic
//! inter‑operation with `anyhow`, while still preserving rich diagnostic
//! detail.
//!
//! Resolution-phase problems are deliberately *not* part of [`QuillError`]:
//! the resolver never aborts on them.  They flow through the
//! [`Diagnostics`] accumulator instead, so a single pass can surface every
//! static error in one run and the driver gates execution on the aggregate.

use std::fmt;
use std::io;

use log::info;
use thiserror::Error;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuillError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Runtime evaluation error.
    #[error("[line {line}] Runtime error: {message}")]
    Runtime { message: String, line: usize },

    /// Division by the literal number zero.  Kept separate from the
    /// generic type errors so callers can distinguish the two.
    #[error("[line {line}] Runtime error: Division by zero.")]
    DivisionByZero { line: usize },

    /// A control-flow signal escaped its statically-checked boundary.
    /// Reaching this indicates a resolver bug, not a user error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl QuillError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        QuillError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        QuillError::Parse { message, line }
    }

    /// Helper constructor for the **evaluator**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        QuillError::Runtime { message, line }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, QuillError>;

/// Severity of a resolver diagnostic.  Warnings (e.g. an unused `let`)
/// never gate execution; errors do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One line-tagged message produced by the resolution pass.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: usize,

    /// The lexeme the message is about, when one exists.
    pub context: String,

    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: &str = match self.severity {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        };

        if self.context.is_empty() {
            write!(f, "[line {}] {}: {}", self.line, label, self.message)
        } else {
            write!(
                f,
                "[line {}] {} at '{}': {}",
                self.line, label, self.context, self.message
            )
        }
    }
}

/// Accumulator for resolution diagnostics, scoped to one program run so
/// successive runs (REPL, tests) cannot leak state into each other.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.  `context` names the offending lexeme and may be
    /// empty when no single token is to blame.
    pub fn error<S: Into<String>>(&mut self, line: usize, context: &str, message: S) {
        let message: String = message.into();

        info!("Resolution error: line={}, msg={}", line, message);

        self.entries.push(Diagnostic {
            severity: Severity::Error,
            line,
            context: context.to_string(),
            message,
        });
    }

    /// Record a warning.
    pub fn warning<S: Into<String>>(&mut self, line: usize, context: &str, message: S) {
        let message: String = message.into();

        info!("Resolution warning: line={}, msg={}", line, message);

        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            line,
            context: context.to_string(),
            message,
        });
    }

    /// True if at least one `Error`-severity entry was recorded.
    pub fn had_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! This module provides types for creating, collecting, and querying
//! compiler diagnostics (errors, warnings, notes, and help messages).
//!
//! # Examples
//!
//! ```
//! use velac_util::diagnostic::{DiagnosticBuilder, Handler};
//! use velac_util::Span;
//!
//! let handler = Handler::new();
//! DiagnosticBuilder::error("unexpected token")
//!     .span(Span::DUMMY)
//!     .emit(&handler);
//!
//! assert!(handler.has_errors());
//! ```

mod builder;
mod codes;

pub use builder::DiagnosticBuilder;
pub use codes::DiagnosticCode;

pub use codes::{
    E_LEX_INVALID_NUMBER, E_LEX_UNEXPECTED_CHAR, E_LEX_UNTERMINATED_STRING,
    E_PARSE_EXPECTED_TOKEN, E_PARSE_UNEXPECTED_EOF, E_PARSE_UNEXPECTED_TOKEN, E_STR_DECODE,
    E_STR_INTERNAL, E_STR_SYNTAX, W_INVALID_ESCAPE,
};

use crate::Span;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that prevents compilation.
    Error,
    /// A warning that doesn't prevent compilation.
    Warning,
    /// Additional information about a diagnostic.
    Note,
    /// A suggestion for fixing an issue.
    Help,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
            Level::Help => write!(f, "help"),
        }
    }
}

/// A diagnostic message with severity and location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Diagnostic severity level.
    pub level: Level,
    /// Main diagnostic message.
    pub message: String,
    /// Source location.
    pub span: Span,
    /// Optional diagnostic code.
    pub code: Option<DiagnosticCode>,
    /// Additional notes for context.
    pub notes: Vec<String>,
    /// Help suggestions for fixing the issue.
    pub helps: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(level: Level, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            message: message.into(),
            span,
            code: None,
            notes: Vec::new(),
            helps: Vec::new(),
        }
    }

    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, message, span)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Warning, message, span)
    }

    /// Set the diagnostic code.
    pub fn with_code(mut self, code: DiagnosticCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a note to the diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Add a help suggestion.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.helps.push(help.into());
        self
    }
}

/// Handler for collecting and reporting diagnostics.
///
/// The `Handler` collects diagnostics and provides methods for querying
/// them. It is shared by reference between the lexer, the parser, and any
/// embedded re-parse of an f-string expression, so every diagnostic for one
/// compilation lands in the same place.
///
/// # Examples
///
/// ```
/// use velac_util::diagnostic::{Diagnostic, Handler};
/// use velac_util::Span;
///
/// let handler = Handler::new();
/// handler.emit_diagnostic(Diagnostic::error("unexpected token", Span::DUMMY));
/// assert_eq!(handler.error_count(), 1);
/// ```
pub struct Handler {
    /// Collected diagnostics.
    diagnostics: RefCell<Vec<Diagnostic>>,
    /// Whether to panic on errors (for testing).
    panic_on_error: bool,
}

impl Handler {
    /// Create a new handler.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            panic_on_error: false,
        }
    }

    /// Create a handler that panics on errors (for testing).
    pub fn new_panicking() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            panic_on_error: true,
        }
    }

    /// Emit a pre-built diagnostic.
    pub fn emit_diagnostic(&self, diagnostic: Diagnostic) {
        if self.panic_on_error && diagnostic.level == Level::Error {
            panic!("diagnostic error: {}", diagnostic.message);
        }
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Check if any errors have been reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// True if some collected error message contains `needle`.
    ///
    /// This is the query the test suites lean on: the string parser promises
    /// specific message substrings ("single '}' is not allowed", ...).
    pub fn has_error_containing(&self, needle: &str) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error && d.message.contains(needle))
    }

    /// Clear all diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}

//! Diagnostic builder for fluent diagnostic construction.

use super::{Diagnostic, DiagnosticCode, Handler, Level};
use crate::Span;

/// A fluent builder for diagnostics.
///
/// # Examples
///
/// ```
/// use velac_util::diagnostic::{DiagnosticBuilder, Handler};
/// use velac_util::Span;
///
/// let handler = Handler::new();
/// DiagnosticBuilder::error("f-string: expecting '}'")
///     .span(Span::DUMMY)
///     .help("close the expression with '}'")
///     .emit(&handler);
/// ```
#[derive(Debug)]
pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    /// Start building an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic::new(Level::Error, message, Span::DUMMY),
        }
    }

    /// Start building a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic::new(Level::Warning, message, Span::DUMMY),
        }
    }

    /// Set the primary span.
    pub fn span(mut self, span: Span) -> Self {
        self.diagnostic.span = span;
        self
    }

    /// Set the diagnostic code.
    pub fn code(mut self, code: DiagnosticCode) -> Self {
        self.diagnostic.code = Some(code);
        self
    }

    /// Attach a note.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic.notes.push(note.into());
        self
    }

    /// Attach a help suggestion.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic.helps.push(help.into());
        self
    }

    /// Finish building without emitting.
    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }

    /// Emit the diagnostic through the given handler.
    pub fn emit(self, handler: &Handler) {
        handler.emit_diagnostic(self.diagnostic);
    }
}

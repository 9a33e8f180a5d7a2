//! velac-util - Core Utilities and Foundation Types
//!
//! Foundation types shared by every phase of the velac front end:
//!
//! - [`span`]: source locations (`Span`, `FileId`) carrying byte offsets and
//!   full start/end line/column coordinates.
//! - [`diagnostic`]: error and warning reporting (`Handler`,
//!   `DiagnosticBuilder`, numbered `DiagnosticCode`s).
//! - [`symbol`]: global string interning (`Symbol`).
//! - [`arena`]: the bump [`Arena`] that owns AST nodes and decoded literal
//!   values for a single parse.
//!
//! The crate has no knowledge of tokens or AST shapes; it only supplies the
//! plumbing the lexer and parser build on.

pub mod arena;
pub mod diagnostic;
pub mod span;
pub mod symbol;

pub use arena::Arena;
pub use diagnostic::{Diagnostic, DiagnosticBuilder, DiagnosticCode, Handler, Level};
pub use span::{FileId, Span};
pub use symbol::Symbol;

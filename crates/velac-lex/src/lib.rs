//! velac-lex - Lexical Analyzer
//!
//! Transforms Vela expression source into a stream of tokens. The crate
//! serves two callers:
//!
//! - the surrounding grammar, which lexes file source and hands runs of
//!   adjacent string-literal tokens to the string parser in `velac-par`;
//! - the string parser itself, which re-lexes each embedded f-string
//!   expression from a scratch buffer via [`Lexer::embedded`], with line,
//!   column, and byte offsets folded into every produced span so that inner
//!   diagnostics point at the original file.
//!
//! String literals are tokenized *raw*: a [`Token::Str`] payload is the
//! literal exactly as written (prefix letters, quotes, body, trailing regex
//! flags). Decoding escapes and parsing f-string structure are the parser's
//! responsibility, which needs the original text for location mapping.

pub mod cursor;
mod lexer;
pub mod token;
pub mod unicode;

#[cfg(test)]
mod edge_cases;

pub use lexer::Lexer;
pub use token::{keyword_from_ident, Token, TokenWithSpan};

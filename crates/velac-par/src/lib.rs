//! velac-par - Parser (Syntactic Analyzer)
//!
//! Expression parsing for Vela, built around the string-literal parser:
//!
//! - [`ast`]: arena-allocated expression nodes.
//! - [`expr`]: a Pratt (top-down operator precedence) expression parser.
//! - [`string`]: the string-literal and f-string parser. It decodes plain,
//!   bytes, raw, regex, and char literals, and tokenizes f-string bodies
//!   into literal pieces and embedded expressions. Each embedded expression
//!   is re-lexed from a scratch buffer and parsed by a fresh [`Parser`]
//!   whose spans are shifted back into original-file coordinates.
//!
//! A [`Parser`] instance is the unit of state: it owns a token stream and a
//! cursor into it, borrows the [`Arena`] that owns all produced nodes, and
//! reports through a shared diagnostic [`Handler`]. The first error sets
//! [`Parser::error_indicator`] and unwinds the parse; there is no recovery
//! inside string literals.

pub mod ast;
pub mod expr;
pub mod string;

#[cfg(test)]
mod edge_cases;

pub use ast::Expr;
pub use string::{ParsedLiteral, ParsedValue, StrToken, StringFlags};

use velac_lex::{Lexer, Token, TokenWithSpan};
use velac_util::diagnostic::{
    DiagnosticBuilder, E_PARSE_EXPECTED_TOKEN, E_PARSE_UNEXPECTED_TOKEN, E_STR_INTERNAL,
};
use velac_util::{Arena, Handler, Span};

/// Parse configuration shared with nested parser instances.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParseFlags {
    /// Promote invalid-escape deprecation warnings to syntax errors, the
    /// way an escalating warning filter would.
    pub warnings_as_errors: bool,
}

/// Recursive-descent parser over a token stream.
///
/// The stream always ends with an `Eof` token (see
/// [`Lexer::tokenize`](velac_lex::Lexer::tokenize)).
pub struct Parser<'a> {
    /// Token stream from the lexer.
    tokens: Vec<TokenWithSpan>,

    /// Current position in the token stream.
    position: usize,

    /// Diagnostic sink, shared with any embedded re-parse.
    handler: &'a Handler,

    /// Owner of all AST nodes and decoded literal values.
    arena: &'a Arena,

    /// Language feature gate: f-strings need >= 6, `=` expressions >= 8.
    feature_version: u32,

    /// Configuration inherited by embedded parsers.
    flags: ParseFlags,

    /// Set on the first error; callers short-circuit once it is set.
    pub error_indicator: bool,

    /// When set, the next syntax error is reported at this span instead of
    /// the offending position (used when a promoted escape warning must
    /// point at the enclosing string token).
    known_err_span: Option<Span>,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `tokens`.
    pub fn new(
        tokens: Vec<TokenWithSpan>,
        handler: &'a Handler,
        arena: &'a Arena,
        feature_version: u32,
    ) -> Self {
        Self::with_flags(tokens, handler, arena, feature_version, ParseFlags::default())
    }

    /// Creates a parser with explicit configuration flags.
    pub fn with_flags(
        tokens: Vec<TokenWithSpan>,
        handler: &'a Handler,
        arena: &'a Arena,
        feature_version: u32,
        flags: ParseFlags,
    ) -> Self {
        debug_assert!(matches!(
            tokens.last(),
            Some(TokenWithSpan {
                token: Token::Eof,
                ..
            })
        ));
        Self {
            tokens,
            position: 0,
            handler,
            arena,
            feature_version,
            flags,
            error_indicator: false,
            known_err_span: None,
        }
    }

    /// Parses f-string input: exactly one parenthesized expression followed
    /// by end of input.
    ///
    /// This is the dedicated input mode used for embedded f-string
    /// expressions. The expression compiler wraps every expression in
    /// parentheses before re-lexing, which makes leading whitespace and
    /// embedded newlines legal; the parentheses parse as a group, so the
    /// result is the inner expression itself.
    pub fn parse_fstring_input(&mut self) -> Option<&'a Expr<'a>> {
        let expr = self.parse_expr()?;
        if self.current() != Token::Eof {
            let span = self.current_span();
            self.syntax_error(
                span,
                format!("unexpected {} after expression", self.current()),
            );
            return None;
        }
        Some(expr)
    }

    // =========================================================================
    // Token stream access
    // =========================================================================

    /// The current token.
    pub(crate) fn current(&self) -> Token {
        self.tokens[self.position.min(self.tokens.len() - 1)].token
    }

    /// The token `n` positions ahead.
    pub(crate) fn peek(&self, n: usize) -> Token {
        let idx = (self.position + n).min(self.tokens.len() - 1);
        self.tokens[idx].token
    }

    /// The current token's span.
    pub(crate) fn current_span(&self) -> Span {
        self.tokens[self.position.min(self.tokens.len() - 1)].span
    }

    /// Advance past the current token.
    pub(crate) fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    /// Consume `expected`, reporting an error if something else is next.
    /// Returns the consumed token's span.
    pub(crate) fn expect(&mut self, expected: Token) -> Option<Span> {
        if self.current() == expected {
            let span = self.current_span();
            self.advance();
            Some(span)
        } else {
            let span = self.current_span();
            let message = format!("expected {}, found {}", expected, self.current());
            self.error_indicator = true;
            DiagnosticBuilder::error(message)
                .code(E_PARSE_EXPECTED_TOKEN)
                .span(span)
                .emit(self.handler);
            None
        }
    }

    // =========================================================================
    // Shared plumbing
    // =========================================================================

    /// The arena owning everything this parser produces.
    #[inline]
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// The diagnostic handler.
    #[inline]
    pub fn handler(&self) -> &'a Handler {
        self.handler
    }

    /// The configured feature version.
    #[inline]
    pub fn feature_version(&self) -> u32 {
        self.feature_version
    }

    /// The configured parse flags.
    #[inline]
    pub(crate) fn parse_flags(&self) -> ParseFlags {
        self.flags
    }

    /// Allocate an expression in the arena.
    #[inline]
    pub(crate) fn alloc(&self, expr: Expr<'a>) -> &'a Expr<'a> {
        self.arena.alloc(expr)
    }

    /// Raise a syntax error and set the error indicator.
    pub(crate) fn syntax_error(&mut self, span: Span, message: impl Into<String>) {
        self.syntax_error_with(velac_util::diagnostic::E_STR_SYNTAX, span, message);
    }

    /// Raise a syntax error with an explicit code.
    pub(crate) fn syntax_error_with(
        &mut self,
        code: velac_util::DiagnosticCode,
        span: Span,
        message: impl Into<String>,
    ) {
        let span = self.known_err_span.take().unwrap_or(span);
        self.error_indicator = true;
        DiagnosticBuilder::error(message.into())
            .code(code)
            .span(span)
            .emit(self.handler);
    }

    /// Report an unexpected token at the current position.
    pub(crate) fn unexpected_token(&mut self) {
        let span = self.current_span();
        let message = format!("unexpected {}", self.current());
        self.error_indicator = true;
        DiagnosticBuilder::error(message)
            .code(E_PARSE_UNEXPECTED_TOKEN)
            .span(span)
            .emit(self.handler);
    }

    /// Report a malformed input that the tokenizer should have rejected.
    pub(crate) fn internal_error(&mut self, span: Span, message: impl Into<String>) {
        self.error_indicator = true;
        DiagnosticBuilder::error(format!("bad internal call: {}", message.into()))
            .code(E_STR_INTERNAL)
            .span(span)
            .emit(self.handler);
    }

    /// Pin the span of the next raised syntax error.
    pub(crate) fn set_known_err_span(&mut self, span: Span) {
        self.known_err_span = Some(span);
    }
}

/// Lex and parse a single expression from `source`.
pub fn parse_expr_source<'a>(
    source: &str,
    arena: &'a Arena,
    handler: &'a Handler,
    feature_version: u32,
) -> Option<&'a Expr<'a>> {
    let tokens = Lexer::new(source, handler).tokenize();
    let mut parser = Parser::new(tokens, handler, arena, feature_version);
    let expr = parser.parse_expr()?;
    if parser.current() != Token::Eof {
        parser.unexpected_token();
        return None;
    }
    Some(expr)
}

/// Lex `source`, which must consist of adjacent string literals, and parse
/// the whole run into one expression the way the surrounding grammar does:
/// every token is concatenated into a single f-string parser state, then
/// finished into a `Constant` or a `JoinedStr`.
pub fn parse_string_source<'a>(
    source: &str,
    arena: &'a Arena,
    handler: &'a Handler,
    feature_version: u32,
) -> Option<&'a Expr<'a>> {
    parse_string_source_with_flags(source, arena, handler, feature_version, ParseFlags::default())
}

/// [`parse_string_source`] with explicit parse flags.
pub fn parse_string_source_with_flags<'a>(
    source: &str,
    arena: &'a Arena,
    handler: &'a Handler,
    feature_version: u32,
    flags: ParseFlags,
) -> Option<&'a Expr<'a>> {
    let tokens = Lexer::new(source, handler).tokenize();
    let mut group = Vec::new();
    for tok in &tokens {
        match tok.token {
            Token::Str(sym) => group.push(StrToken::new(sym.as_str(), tok.span)),
            Token::Eof => break,
            _ => {
                DiagnosticBuilder::error(format!("expected string literal, found {}", tok.token))
                    .code(E_PARSE_UNEXPECTED_TOKEN)
                    .span(tok.span)
                    .emit(handler);
                return None;
            }
        }
    }
    if group.is_empty() {
        DiagnosticBuilder::error("expected string literal".to_string())
            .code(E_PARSE_UNEXPECTED_TOKEN)
            .span(Span::DUMMY)
            .emit(handler);
        return None;
    }
    let mut parser = Parser::with_flags(tokens, handler, arena, feature_version, flags);
    parser.parse_string_group(&group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ConstantValue;

    fn with_parse<R>(source: &str, f: impl FnOnce(Option<&Expr<'_>>, &Handler) -> R) -> R {
        let arena = Arena::new();
        let handler = Handler::new();
        let expr = parse_expr_source(source, &arena, &handler, 8);
        f(expr, &handler)
    }

    #[test]
    fn test_parse_fstring_input_accepts_wrapped_expression() {
        let arena = Arena::new();
        let handler = Handler::new();
        let tokens = Lexer::new("( x )", &handler).tokenize();
        let mut parser = Parser::new(tokens, &handler, &arena, 8);
        let expr = parser.parse_fstring_input().expect("parse");
        assert!(matches!(expr, Expr::Name(_)));
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_parse_fstring_input_rejects_trailing_tokens() {
        let arena = Arena::new();
        let handler = Handler::new();
        let tokens = Lexer::new("(x) y", &handler).tokenize();
        let mut parser = Parser::new(tokens, &handler, &arena, 8);
        assert!(parser.parse_fstring_input().is_none());
        assert!(handler.has_errors());
    }

    #[test]
    fn test_expect_reports_expected_and_found() {
        let arena = Arena::new();
        let handler = Handler::new();
        let tokens = Lexer::new("]", &handler).tokenize();
        let mut parser = Parser::new(tokens, &handler, &arena, 8);
        assert!(parser.expect(Token::RParen).is_none());
        assert!(handler.has_error_containing("expected ')'"));
        assert!(parser.error_indicator);
    }

    #[test]
    fn test_parse_expr_source_simple() {
        with_parse("1 + 2", |expr, handler| {
            assert!(!handler.has_errors());
            match expr.expect("parse") {
                Expr::BinOp(b) => {
                    assert!(matches!(
                        b.left,
                        Expr::Constant(c) if c.value == ConstantValue::Int(1)
                    ));
                }
                other => panic!("expected BinOp, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_parse_string_source_rejects_non_strings() {
        let arena = Arena::new();
        let handler = Handler::new();
        assert!(parse_string_source("42", &arena, &handler, 8).is_none());
        assert!(handler.has_error_containing("expected string literal"));
    }
}

//! Core lexer implementation.
//!
//! This module contains the main `Lexer` struct, the token dispatch loop,
//! and the span bookkeeping that maps embedded re-parses back to original
//! source coordinates.

use velac_util::diagnostic::{DiagnosticBuilder, DiagnosticCode, E_LEX_UNEXPECTED_CHAR};
use velac_util::{FileId, Handler, Span};

use crate::cursor::Cursor;
use crate::token::{Token, TokenWithSpan};

/// Lexer for Vela expression source.
///
/// The lexer transforms source text into a stream of tokens. Two kinds of
/// callers construct one:
///
/// - the surrounding grammar, over a file's source ([`Lexer::new`]);
/// - the string-literal parser, over a scratch buffer holding one embedded
///   f-string expression ([`Lexer::embedded`]). In that case the scratch
///   coordinates are shifted as tokens are produced, so every downstream
///   span and diagnostic already points into the original file.
pub struct Lexer<'a> {
    /// Character cursor for source traversal.
    pub(crate) cursor: Cursor<'a>,

    /// Diagnostic handler for error reporting.
    handler: &'a Handler,

    /// Starting position of the current token (byte offset).
    token_start: usize,

    /// Line number where the current token starts (1-based).
    token_start_line: u32,

    /// Column number where the current token starts (1-based).
    token_start_column: u32,

    /// Added to every line number (embedded re-parse only).
    line_offset: u32,

    /// Added to column numbers on the first physical line (embedded only).
    col_shift: u32,

    /// Added to every byte offset (embedded only).
    byte_base: usize,

    /// File the spans belong to.
    file_id: FileId,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over file source.
    pub fn new(source: &'a str, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
            line_offset: 0,
            col_shift: 0,
            byte_base: 0,
            file_id: FileId::DUMMY,
        }
    }

    /// Creates a lexer over a scratch buffer holding an embedded f-string
    /// expression.
    ///
    /// `line_offset` is added to every reported line, `col_shift` to columns
    /// on the scratch buffer's first line, and `byte_base` to byte offsets,
    /// so that errors from the inner parse land on the original source.
    pub fn embedded(
        source: &'a str,
        handler: &'a Handler,
        line_offset: u32,
        col_shift: u32,
        byte_base: usize,
        file_id: FileId,
    ) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
            line_offset,
            col_shift,
            byte_base,
            file_id,
        }
    }

    /// Lex the whole input, always ending with an `Eof` token.
    pub fn tokenize(mut self) -> Vec<TokenWithSpan> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token_spanned();
            let done = tok.token == Token::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        tokens
    }

    /// Returns the next token paired with its (already shifted) span.
    pub fn next_token_spanned(&mut self) -> TokenWithSpan {
        let token = self.next_token();
        TokenWithSpan::new(token, self.token_span())
    }

    /// Returns the next token from the source code.
    ///
    /// Skips whitespace and comments, then dispatches on the current
    /// character.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        self.token_start = self.cursor.position();
        self.token_start_line = self.cursor.line();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Token::Eof;
        }

        match self.cursor.current_char() {
            '(' => {
                self.cursor.advance();
                Token::LParen
            }
            ')' => {
                self.cursor.advance();
                Token::RParen
            }
            '[' => {
                self.cursor.advance();
                Token::LBracket
            }
            ']' => {
                self.cursor.advance();
                Token::RBracket
            }
            '{' => {
                self.cursor.advance();
                Token::LBrace
            }
            '}' => {
                self.cursor.advance();
                Token::RBrace
            }
            ',' => {
                self.cursor.advance();
                Token::Comma
            }
            ':' => {
                self.cursor.advance();
                Token::Colon
            }
            '.' => {
                if self.cursor.peek_char(1).is_ascii_digit() {
                    self.lex_number()
                } else {
                    self.cursor.advance();
                    Token::Dot
                }
            }
            '+' => {
                self.cursor.advance();
                Token::Plus
            }
            '-' => {
                self.cursor.advance();
                Token::Minus
            }
            '*' => self.lex_star(),
            '/' => self.lex_slash(),
            '%' => {
                self.cursor.advance();
                Token::Percent
            }
            '=' => self.lex_equals(),
            '!' => self.lex_bang(),
            '<' => self.lex_less(),
            '>' => self.lex_greater(),
            '&' => {
                self.cursor.advance();
                Token::Amp
            }
            '|' => {
                self.cursor.advance();
                Token::Pipe
            }
            '^' => {
                self.cursor.advance();
                Token::Caret
            }
            '~' => {
                self.cursor.advance();
                Token::Tilde
            }
            '"' | '\'' => self.lex_string(0),
            c if crate::unicode::is_ident_start(c) => {
                if let Some(prefix_len) = self.string_prefix_len() {
                    self.lex_string(prefix_len)
                } else {
                    self.lex_identifier()
                }
            }
            c if c.is_ascii_digit() => self.lex_number(),
            c => {
                self.report_error(
                    E_LEX_UNEXPECTED_CHAR,
                    format!("unexpected character '{}'", c),
                );
                self.cursor.advance();
                Token::Invalid(c)
            }
        }
    }

    /// The span of the token currently being lexed, shifted into original
    /// source coordinates.
    pub(crate) fn token_span(&self) -> Span {
        Span {
            start: self.token_start + self.byte_base,
            end: self.cursor.position() + self.byte_base,
            line: self.shift_line(self.token_start_line),
            column: self.shift_column(self.token_start_line, self.token_start_column),
            end_line: self.shift_line(self.cursor.line()),
            end_column: self.shift_column(self.cursor.line(), self.cursor.column()),
            file_id: self.file_id,
        }
    }

    #[inline]
    fn shift_line(&self, line: u32) -> u32 {
        line + self.line_offset
    }

    #[inline]
    fn shift_column(&self, line: u32, column: u32) -> u32 {
        if line == 1 {
            column + self.col_shift
        } else {
            column
        }
    }

    /// Reports a lexical error at the current token position.
    pub(crate) fn report_error(&mut self, code: DiagnosticCode, message: String) {
        DiagnosticBuilder::error(message)
            .code(code)
            .span(self.token_span())
            .emit(self.handler);
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token == Token::Eof {
            None
        } else {
            Some(token)
        }
    }
}

//! Operator lexing for one- and two-character operators.

use velac_util::diagnostic::E_LEX_UNEXPECTED_CHAR;

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes `*` or `**`.
    pub(crate) fn lex_star(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('*') {
            Token::StarStar
        } else {
            Token::Star
        }
    }

    /// Lexes `/` or `//`.
    pub(crate) fn lex_slash(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('/') {
            Token::SlashSlash
        } else {
            Token::Slash
        }
    }

    /// Lexes `=` or `==`.
    pub(crate) fn lex_equals(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::EqEq
        } else {
            Token::Assign
        }
    }

    /// Lexes `!=`. A bare `!` is not an operator in this grammar.
    pub(crate) fn lex_bang(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::NotEq
        } else {
            self.report_error(
                E_LEX_UNEXPECTED_CHAR,
                "unexpected character '!'".to_string(),
            );
            Token::Invalid('!')
        }
    }

    /// Lexes `<`, `<=` or `<<`.
    pub(crate) fn lex_less(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::Le
        } else if self.cursor.match_char('<') {
            Token::Shl
        } else {
            Token::Lt
        }
    }

    /// Lexes `>`, `>=` or `>>`.
    pub(crate) fn lex_greater(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::Ge
        } else if self.cursor.match_char('>') {
            Token::Shr
        } else {
            Token::Gt
        }
    }
}

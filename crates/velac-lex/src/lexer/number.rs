//! Number literal lexing.
//!
//! Handles decimal and radix-prefixed integers and floating-point literals.
//!
//! - Decimal: `42`, `1_000`
//! - Hexadecimal: `0xFF`, binary: `0b1010`, octal: `0o777`
//! - Float: `3.14`, `.5`, `1e10`, `2.5e-3`

use velac_util::diagnostic::E_LEX_INVALID_NUMBER;

use crate::token::Token;
use crate::unicode::is_digit_in_base;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a number literal. The current character is a digit or a dot
    /// followed by a digit.
    pub(crate) fn lex_number(&mut self) -> Token {
        if self.cursor.current_char() == '0' {
            match self.cursor.peek_char(1) {
                'x' | 'X' => {
                    self.cursor.advance_n(2);
                    return self.lex_integer(16);
                }
                'o' | 'O' => {
                    self.cursor.advance_n(2);
                    return self.lex_integer(8);
                }
                'b' | 'B' => {
                    self.cursor.advance_n(2);
                    return self.lex_integer(2);
                }
                _ => {}
            }
        }

        let start = self.cursor.position();

        self.eat_decimal_digits();

        let mut is_float = false;
        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            is_float = true;
            self.cursor.advance();
            self.eat_decimal_digits();
        }
        if matches!(self.cursor.current_char(), 'e' | 'E') {
            let mut lookahead = 1;
            if matches!(self.cursor.peek_char(1), '+' | '-') {
                lookahead = 2;
            }
            if self.cursor.peek_char(lookahead).is_ascii_digit() {
                is_float = true;
                self.cursor.advance_n(lookahead + 1);
                self.eat_decimal_digits();
            }
        }

        let text: String = self
            .cursor
            .slice_from(start)
            .chars()
            .filter(|&c| c != '_')
            .collect();

        if is_float {
            match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Token::Float(value),
                _ => {
                    self.report_error(
                        E_LEX_INVALID_NUMBER,
                        format!("invalid floating point literal '{}'", text),
                    );
                    Token::Float(0.0)
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Token::Int(value),
                Err(_) => {
                    self.report_error(
                        E_LEX_INVALID_NUMBER,
                        format!("integer literal '{}' out of range", text),
                    );
                    Token::Int(0)
                }
            }
        }
    }

    /// Lexes the digits of a radix-prefixed integer, prefix already
    /// consumed.
    fn lex_integer(&mut self, radix: u32) -> Token {
        let start = self.cursor.position();
        while is_digit_in_base(self.cursor.current_char(), radix)
            || self.cursor.current_char() == '_'
        {
            self.cursor.advance();
        }
        let text: String = self
            .cursor
            .slice_from(start)
            .chars()
            .filter(|&c| c != '_')
            .collect();
        if text.is_empty() {
            self.report_error(
                E_LEX_INVALID_NUMBER,
                "missing digits after integer base prefix".to_string(),
            );
            return Token::Int(0);
        }
        match i64::from_str_radix(&text, radix) {
            Ok(value) => Token::Int(value),
            Err(_) => {
                self.report_error(
                    E_LEX_INVALID_NUMBER,
                    format!("integer literal '{}' out of range", text),
                );
                Token::Int(0)
            }
        }
    }

    fn eat_decimal_digits(&mut self) {
        while self.cursor.current_char().is_ascii_digit() || self.cursor.current_char() == '_' {
            self.cursor.advance();
        }
    }
}

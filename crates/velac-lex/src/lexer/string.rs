//! String-literal tokenization.
//!
//! The lexer's job for string literals is deliberately shallow: find where
//! the token ends and hand the *raw* text (prefix letters, quotes, body,
//! and any trailing regex flags) to the parser. All escape decoding, prefix
//! validation, and f-string structure lives in the string parser, which
//! needs the original bytes to compute precise locations for embedded
//! expressions.
//!
//! Rules the scan follows:
//!
//! - up to three prefix letters from `b u r f c` (case-insensitive), with
//!   `e`/`E` allowed directly after `r`/`R` for regex literals;
//! - `'...'` and `"..."` bodies end at the first unescaped matching quote,
//!   `'''...'''` and `"""...."""` at three of them;
//! - a backslash escapes the next character even in raw mode (it cannot end
//!   the string);
//! - single-quoted bodies do not span lines;
//! - for `re`-prefixed literals, trailing ASCII letters after the closing
//!   quote belong to the token (the regex flags).

use velac_util::diagnostic::E_LEX_UNTERMINATED_STRING;
use velac_util::Symbol;

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// If the characters at the cursor start a prefixed string literal,
    /// returns the prefix length in bytes.
    pub(crate) fn string_prefix_len(&self) -> Option<usize> {
        let mut len = 0;
        let mut after_r = false;
        while len < 3 {
            let c = self.cursor.peek_char(len);
            match c {
                'b' | 'B' | 'u' | 'U' | 'f' | 'F' | 'c' | 'C' => {
                    after_r = false;
                }
                'r' | 'R' => {
                    after_r = true;
                }
                'e' | 'E' if after_r => {
                    after_r = false;
                }
                '\'' | '"' if len > 0 => return Some(len),
                _ => return None,
            }
            len += 1;
        }
        if matches!(self.cursor.peek_char(len), '\'' | '"') {
            Some(len)
        } else {
            None
        }
    }

    /// Lexes one string literal, prefix included, returning the raw text.
    pub(crate) fn lex_string(&mut self, prefix_len: usize) -> Token {
        let start = self.cursor.position();

        let mut remode = false;
        for _ in 0..prefix_len {
            // Prefix validation guaranteed 'e' only appears after 'r'.
            if matches!(self.cursor.current_char(), 'e' | 'E') {
                remode = true;
            }
            self.cursor.advance();
        }

        let quote = self.cursor.current_char();
        self.cursor.advance();

        let triple = self.cursor.current_char() == quote && self.cursor.peek_char(1) == quote;
        if triple {
            self.cursor.advance_n(2);
        }

        let mut closed = false;
        while !self.cursor.is_at_end() {
            let c = self.cursor.current_char();
            if c == '\\' {
                self.cursor.advance();
                if !self.cursor.is_at_end() {
                    self.cursor.advance();
                }
                continue;
            }
            if c == quote {
                if triple {
                    if self.cursor.peek_char(1) == quote && self.cursor.peek_char(2) == quote {
                        self.cursor.advance_n(3);
                        closed = true;
                        break;
                    }
                    self.cursor.advance();
                    continue;
                }
                self.cursor.advance();
                closed = true;
                break;
            }
            if c == '\n' && !triple {
                break;
            }
            self.cursor.advance();
        }

        if !closed {
            let what = if triple {
                "unterminated triple-quoted string literal"
            } else {
                "unterminated string literal"
            };
            self.report_error(E_LEX_UNTERMINATED_STRING, what.to_string());
            return Token::Invalid(quote);
        }

        if remode {
            while self.cursor.current_char().is_ascii_alphabetic() {
                self.cursor.advance();
            }
        }

        Token::Str(Symbol::intern(self.cursor.slice_from(start)))
    }
}

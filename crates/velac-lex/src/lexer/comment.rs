//! Trivia handling: whitespace and `#` line comments.

use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Skips whitespace and `#` comments before the next token.
    ///
    /// Newlines are trivia here: expression source reaching this lexer is
    /// either a single logical line or a parenthesized scratch buffer, so
    /// line structure carries no token significance.
    pub(crate) fn skip_trivia(&mut self) {
        loop {
            let c = self.cursor.current_char();
            if c == '#' {
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance();
                }
                continue;
            }
            if c.is_whitespace() {
                self.cursor.advance();
                continue;
            }
            break;
        }
    }
}

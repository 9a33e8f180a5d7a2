//! Identifier and keyword lexing.

use velac_util::Symbol;

use crate::token::{keyword_from_ident, Token};
use crate::unicode::is_ident_continue;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes an identifier or keyword.
    ///
    /// The current character is known to start an identifier.
    pub(crate) fn lex_identifier(&mut self) -> Token {
        let start = self.cursor.position();
        while is_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        keyword_from_ident(text).unwrap_or_else(|| Token::Ident(Symbol::intern(text)))
    }
}

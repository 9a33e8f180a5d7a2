//! String-literal parsing.
//!
//! This module owns everything between a raw string-literal token and the
//! AST: prefix and quote recognition, escape decoding, and the f-string
//! machinery that interleaves literal pieces with embedded expressions.
//!
//! - [`escape`]: backslash-escape decoding for text and bytes bodies.
//! - [`fstring`]: the f-string scanner/assembler and the embedded
//!   expression compiler.
//! - this file: the token-level entry ([`Parser::parse_string_token`]) and
//!   the group driver ([`Parser::parse_string_group`]) the surrounding
//!   grammar calls for a run of adjacent string literals.

pub mod escape;
pub mod fstring;

use velac_util::diagnostic::{DiagnosticBuilder, E_STR_DECODE, W_INVALID_ESCAPE};
use velac_util::Span;

use crate::ast::{ConstantExpr, ConstantValue, Expr, RegexExpr};
use crate::string::fstring::FstringParser;
use crate::Parser;

/// A string-literal token as the tokenizer produced it: the raw text
/// (prefix letters, quotes, body, trailing regex flags) plus its span.
#[derive(Clone, Copy, Debug)]
pub struct StrToken<'s> {
    /// The literal exactly as written in source.
    pub text: &'s str,
    /// Location of the literal in the original file.
    pub span: Span,
}

impl<'s> StrToken<'s> {
    /// Pair raw literal text with its location.
    pub fn new(text: &'s str, span: Span) -> Self {
        Self { text, span }
    }

    /// True when the literal carries the `u` prefix, which is kept as the
    /// produced constant's `kind`.
    pub(crate) fn has_u_prefix(&self) -> bool {
        self.text.starts_with(['u', 'U'])
    }
}

/// Prefix and shape flags recognized on a string literal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StringFlags {
    /// `b` prefix: the literal is a bytes constant.
    pub bytes_mode: bool,
    /// `r` prefix (or no backslash in the body): escapes are not decoded.
    pub raw_mode: bool,
    /// `re` prefix: raw mode plus trailing regex flags.
    pub regex_mode: bool,
    /// `c` prefix: raw single-character text.
    pub char_mode: bool,
    /// `f` prefix: the body is an f-string.
    pub format_mode: bool,
    /// Single-quoted with no prefix: a char constant.
    pub is_char: bool,
}

/// The decoded payload of one string-literal token.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedValue {
    /// Decoded text.
    Text(String),
    /// Decoded bytes.
    Bytes(Vec<u8>),
    /// An f-string body, returned undecoded as a byte range into the
    /// token text; the caller drives the f-string parser over it.
    FormatBody {
        /// Start of the body within the token text.
        start: usize,
        /// End of the body within the token text.
        end: usize,
    },
}

/// Result of [`Parser::parse_string_token`].
#[derive(Clone, Debug)]
pub struct ParsedLiteral {
    /// Recognized prefix and shape flags. `raw_mode` reflects the
    /// no-backslash fast path, not just the written prefix.
    pub flags: StringFlags,
    /// For `regex_mode`, the decoded trailing flag characters.
    pub regex_flags: Option<String>,
    /// The decoded value or the f-string body range.
    pub value: ParsedValue,
}

impl<'a> Parser<'a> {
    /// Parse one string-literal token: recognize prefixes and quotes, strip
    /// them, and either decode the body or hand back the f-string range.
    ///
    /// On error the parser's `error_indicator` is set and `None` returned.
    pub fn parse_string_token(&mut self, t: &StrToken<'_>) -> Option<ParsedLiteral> {
        let bytes = t.text.as_bytes();
        let mut flags = StringFlags::default();
        let mut i = 0;

        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            match bytes[i] {
                b'b' | b'B' => {
                    flags.bytes_mode = true;
                    i += 1;
                }
                b'u' | b'U' => {
                    i += 1;
                }
                b'r' | b'R' => {
                    flags.raw_mode = true;
                    i += 1;
                    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
                        flags.regex_mode = true;
                        i += 1;
                    }
                }
                b'f' | b'F' => {
                    flags.format_mode = true;
                    i += 1;
                }
                b'c' | b'C' => {
                    flags.raw_mode = true;
                    flags.char_mode = true;
                    i += 1;
                }
                _ => break,
            }
        }

        let quote = bytes.get(i).copied().unwrap_or(0);

        if quote == b'\'' {
            if flags.format_mode
                || flags.bytes_mode
                || flags.raw_mode
                || flags.regex_mode
                || flags.char_mode
            {
                self.syntax_error(t.span, "characters cannot have a prefix");
                return None;
            }
            flags.is_char = true;
        }

        if flags.format_mode && self.feature_version() < 6 {
            self.syntax_error(
                t.span,
                "f-strings are only supported with feature version 6 and greater",
            );
            return None;
        }
        if flags.format_mode && flags.bytes_mode {
            self.internal_error(t.span, "f-string with bytes prefix");
            return None;
        }
        if quote != b'\'' && quote != b'"' {
            self.internal_error(t.span, "string token has no quote");
            return None;
        }

        // Skip the leading quote char.
        i += 1;
        let mut len = bytes.len() - i;
        if len > i32::MAX as usize {
            self.internal_error(t.span, "string to parse is too long");
            return None;
        }

        let mut regex_flags = None;
        if flags.regex_mode {
            let mut flagslen = 0;
            while flagslen < len && bytes[i + len - flagslen - 1] != quote {
                flagslen += 1;
            }
            if flagslen == len {
                self.internal_error(t.span, "unterminated regex literal");
                return None;
            }
            len -= flagslen;
            regex_flags = Some(t.text[i + len..i + len + flagslen].to_string());
        }

        // Last quote char must match the first.
        if len == 0 || bytes[i + len - 1] != quote {
            self.internal_error(t.span, "unterminated string token");
            return None;
        }
        len -= 1;

        if len >= 4 && bytes[i] == quote && bytes[i + 1] == quote {
            if flags.is_char {
                self.syntax_error(t.span, "characters cannot be triple quoted");
                return None;
            }
            // Already skipped one quote at each end; skip two more at the
            // start and check two more at the end.
            i += 2;
            len -= 2;
            if bytes[i + len - 1] != quote || bytes[i + len - 2] != quote {
                self.internal_error(t.span, "unterminated string token");
                return None;
            }
            len -= 2;
        }

        let body = &t.text[i..i + len];

        if flags.format_mode {
            // Return the undecoded body; the caller parses it.
            return Some(ParsedLiteral {
                flags,
                regex_flags: None,
                value: ParsedValue::FormatBody {
                    start: i,
                    end: i + len,
                },
            });
        }

        // Avoid the escape decoder when nothing in the body needs it.
        flags.raw_mode = flags.raw_mode || !body.contains('\\');

        if flags.bytes_mode {
            if body.bytes().any(|b| b >= 0x80) {
                self.syntax_error(t.span, "bytes can only contain ASCII literal characters");
                return None;
            }
            let value = if flags.raw_mode {
                body.as_bytes().to_vec()
            } else {
                self.decode_bytes_checked(body.as_bytes(), t)?
            };
            return Some(ParsedLiteral {
                flags,
                regex_flags,
                value: ParsedValue::Bytes(value),
            });
        }

        let value = if flags.raw_mode {
            body.to_string()
        } else {
            self.decode_text_checked(body, t)?
        };
        Some(ParsedLiteral {
            flags,
            regex_flags,
            value: ParsedValue::Text(value),
        })
    }

    /// Parse a run of adjacent string-literal tokens into one expression.
    ///
    /// This is the driver the surrounding grammar uses: each token is
    /// concatenated into a single f-string parser state (plain literals via
    /// `concat`, f-strings via `concat_fstring`), and the state is finished
    /// into a `Constant` or a `JoinedStr` spanning the whole run.
    pub fn parse_string_group(&mut self, tokens: &[StrToken<'_>]) -> Option<&'a Expr<'a>> {
        let (first, last) = match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                self.internal_error(Span::DUMMY, "empty string-literal group");
                return None;
            }
        };
        let group_span = Span::between(first.span, last.span);

        let mut state = FstringParser::new();
        state.kind_u = first.has_u_prefix();
        let mut bytes_value: Option<Vec<u8>> = None;
        let mut saw_text = false;

        for t in tokens {
            let literal = self.parse_string_token(t)?;

            if literal.flags.regex_mode {
                if tokens.len() != 1 {
                    self.syntax_error(t.span, "regex literals cannot be concatenated");
                    return None;
                }
                let ParsedValue::Text(pattern) = literal.value else {
                    self.internal_error(t.span, "regex literal without text value");
                    return None;
                };
                let flags_text = literal.regex_flags.unwrap_or_default();
                return Some(self.alloc(Expr::Regex(RegexExpr {
                    pattern: self.arena().alloc_str(&pattern),
                    flags: self.arena().alloc_str(&flags_text),
                    span: group_span,
                })));
            }

            match literal.value {
                ParsedValue::Text(text) => {
                    saw_text = true;
                    state.concat(text);
                }
                ParsedValue::Bytes(value) => {
                    bytes_value.get_or_insert_with(Vec::new).extend(value);
                }
                ParsedValue::FormatBody { start, end } => {
                    saw_text = true;
                    let body = &t.text[start..end];
                    let mut pos = 0;
                    state.concat_fstring(
                        self,
                        body,
                        &mut pos,
                        literal.flags.raw_mode,
                        0,
                        t,
                        group_span,
                    )?;
                }
            }

            if bytes_value.is_some() && saw_text {
                self.syntax_error(t.span, "cannot mix bytes and nonbytes literals");
                return None;
            }
        }

        if let Some(value) = bytes_value {
            return Some(self.alloc(Expr::Constant(ConstantExpr {
                value: ConstantValue::Bytes(self.arena().alloc_bytes(&value)),
                kind: None,
                span: group_span,
            })));
        }

        state.finish(self, group_span)
    }

    /// Decode a text body, reporting decode errors and escape warnings.
    pub(crate) fn decode_text_checked(
        &mut self,
        src: &str,
        t: &StrToken<'_>,
    ) -> Option<String> {
        match escape::decode_text_with_escapes(src) {
            Ok(decoded) => {
                if let Some(c) = decoded.first_invalid_escape {
                    self.warn_invalid_escape_sequence(c, t)?;
                }
                Some(decoded.value)
            }
            Err(err) => {
                self.decode_error(err, t);
                None
            }
        }
    }

    /// Decode a bytes body, reporting decode errors and escape warnings.
    pub(crate) fn decode_bytes_checked(
        &mut self,
        src: &[u8],
        t: &StrToken<'_>,
    ) -> Option<Vec<u8>> {
        match escape::decode_bytes_with_escapes(src) {
            Ok(decoded) => {
                if let Some(c) = decoded.first_invalid_escape {
                    self.warn_invalid_escape_sequence(c, t)?;
                }
                Some(decoded.value)
            }
            Err(err) => {
                self.decode_error(err, t);
                None
            }
        }
    }

    fn decode_error(&mut self, err: escape::EscapeError, t: &StrToken<'_>) {
        self.error_indicator = true;
        DiagnosticBuilder::error(err.to_string())
            .code(E_STR_DECODE)
            .span(t.span)
            .emit(self.handler());
    }

    /// Emit the deprecation warning for an unknown escape sequence, or
    /// promote it to a syntax error under `warnings_as_errors`.
    pub(crate) fn warn_invalid_escape_sequence(
        &mut self,
        first_invalid: u8,
        t: &StrToken<'_>,
    ) -> Option<()> {
        let message = format!("invalid escape sequence \\{}", first_invalid as char);
        if self.parse_flags().warnings_as_errors {
            // Make the promoted error point at the string token itself.
            self.set_known_err_span(t.span);
            self.syntax_error(t.span, message);
            return None;
        }
        DiagnosticBuilder::warning(message)
            .code(W_INVALID_ESCAPE)
            .span(t.span)
            .emit(self.handler());
        Some(())
    }
}

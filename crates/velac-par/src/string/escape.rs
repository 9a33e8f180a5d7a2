//! Escape-sequence decoding for text and bytes literals.
//!
//! Text decoding runs in two passes. A pre-pass rewrites every non-ASCII
//! UTF-8 run into `\U00xxxxxx` form (and a backslash directly before a
//! non-ASCII byte, or at the end of input, into the escaped form of the
//! backslash itself, U+005C), so the escape pass only ever sees ASCII. The escape pass then interprets the standard
//! escapes, `\xHH`, `\uHHHH`, `\UHHHHHHHH`, octal, and `\N{NAME}` named
//! characters. A worst-case input like `"\ä"` grows from 3 bytes to 16, so
//! the pre-pass buffer is sized at six bytes per input byte, with an
//! overflow guard on the multiplication.
//!
//! Unknown escapes are not errors: the backslash and the character are kept
//! verbatim and the first offender is reported back so the caller can emit
//! a deprecation warning.

use thiserror::Error;

/// A decoding failure, carrying the offending position.
///
/// For text decoding, positions refer to the pre-processed ASCII buffer;
/// for bytes decoding, to the literal body itself.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EscapeError {
    /// The 6x pre-pass buffer size would overflow.
    #[error("string too long to decode")]
    TooLong,

    /// `\x` not followed by two hex digits.
    #[error("invalid \\x escape at position {pos}")]
    InvalidHexEscape {
        /// Byte offset of the backslash.
        pos: usize,
    },

    /// `\u` or `\U` not followed by enough hex digits.
    #[error("truncated \\{escape} escape at position {pos}")]
    TruncatedUnicodeEscape {
        /// The escape letter, `u` or `U`.
        escape: char,
        /// Byte offset of the backslash.
        pos: usize,
    },

    /// A `\U` value beyond the Unicode range, or a surrogate.
    #[error("illegal Unicode character at position {pos}")]
    IllegalCodepoint {
        /// Byte offset of the backslash.
        pos: usize,
    },

    /// `\N` not followed by a braced name.
    #[error("malformed \\N character escape at position {pos}")]
    MalformedNamedEscape {
        /// Byte offset of the backslash.
        pos: usize,
    },

    /// `\N{NAME}` naming no known character.
    #[error("unknown Unicode character name at position {pos}")]
    UnknownCharacterName {
        /// Byte offset of the backslash.
        pos: usize,
    },
}

/// Result of a text decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    /// The decoded value.
    pub value: String,
    /// First unknown escape character kept verbatim, if any.
    pub first_invalid_escape: Option<u8>,
}

/// Result of a bytes decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBytes {
    /// The decoded value.
    pub value: Vec<u8>,
    /// First unknown escape character kept verbatim, if any.
    pub first_invalid_escape: Option<u8>,
}

/// Decode a text literal body.
pub fn decode_text_with_escapes(src: &str) -> Result<DecodedText, EscapeError> {
    let pre = pre_escape_non_ascii(src)?;
    decode_unicode_escape(&pre)
}

/// Decode a bytes literal body. The caller has already verified the body
/// is pure ASCII.
pub fn decode_bytes_with_escapes(src: &[u8]) -> Result<DecodedBytes, EscapeError> {
    let mut out = Vec::with_capacity(src.len());
    let mut first_invalid_escape = None;
    let mut i = 0;
    while i < src.len() {
        let b = src[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }
        let esc_pos = i;
        i += 1;
        if i >= src.len() {
            out.push(b'\\');
            break;
        }
        let c = src[i];
        i += 1;
        match c {
            // Backslash-newline is a line continuation.
            b'\n' => {}
            b'\\' => out.push(b'\\'),
            b'\'' => out.push(b'\''),
            b'"' => out.push(b'"'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'0'..=b'7' => {
                let mut value = (c - b'0') as u32;
                let mut digits = 1;
                while digits < 3 && i < src.len() && matches!(src[i], b'0'..=b'7') {
                    value = value * 8 + (src[i] - b'0') as u32;
                    i += 1;
                    digits += 1;
                }
                // Values above \377 wrap to the low byte.
                out.push((value & 0xff) as u8);
            }
            b'x' => {
                let value = read_hex(src, &mut i, 2)
                    .ok_or(EscapeError::InvalidHexEscape { pos: esc_pos })?;
                out.push(value as u8);
            }
            _ => {
                out.push(b'\\');
                out.push(c);
                if first_invalid_escape.is_none() {
                    first_invalid_escape = Some(c);
                }
            }
        }
    }
    Ok(DecodedBytes {
        value: out,
        first_invalid_escape,
    })
}

/// Rewrite non-ASCII runs as `\U00xxxxxx` escapes so the escape pass sees
/// pure ASCII. A backslash directly before a non-ASCII byte (or at end of
/// input) is rewritten to the escape naming U+005C, turning an input like
/// `"\ä"` into the two-escape sequence the decoder expects.
fn pre_escape_non_ascii(src: &str) -> Result<Vec<u8>, EscapeError> {
    let len = src.len();
    if len > usize::MAX / 6 {
        return Err(EscapeError::TooLong);
    }
    let bytes = src.as_bytes();
    let mut out = Vec::with_capacity(len * 6);
    let mut i = 0;
    while i < len {
        if bytes[i] == b'\\' {
            out.push(b'\\');
            i += 1;
            if i >= len || bytes[i] >= 0x80 {
                out.extend_from_slice(b"u005c");
                if i >= len {
                    break;
                }
            }
        }
        if bytes[i] >= 0x80 {
            let start = i;
            while i < len && bytes[i] >= 0x80 {
                i += 1;
            }
            // The run starts after an ASCII byte and ends before one, so
            // both bounds are char boundaries.
            for ch in src[start..i].chars() {
                let escaped = format!("\\U{:08x}", ch as u32);
                out.extend_from_slice(escaped.as_bytes());
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// The escape pass over a pure-ASCII buffer.
fn decode_unicode_escape(bytes: &[u8]) -> Result<DecodedText, EscapeError> {
    let mut out = String::with_capacity(bytes.len());
    let mut first_invalid_escape = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' {
            out.push(b as char);
            i += 1;
            continue;
        }
        let esc_pos = i;
        i += 1;
        if i >= bytes.len() {
            // Unreachable through the pre-pass, which rewrites a trailing
            // backslash to its U+005C escape.
            out.push('\\');
            break;
        }
        let c = bytes[i];
        i += 1;
        match c {
            // Backslash-newline is a line continuation.
            b'\n' => {}
            b'\\' => out.push('\\'),
            b'\'' => out.push('\''),
            b'"' => out.push('"'),
            b'a' => out.push('\x07'),
            b'b' => out.push('\x08'),
            b'f' => out.push('\x0c'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'v' => out.push('\x0b'),
            b'0'..=b'7' => {
                let mut value = (c - b'0') as u32;
                let mut digits = 1;
                while digits < 3 && i < bytes.len() && matches!(bytes[i], b'0'..=b'7') {
                    value = value * 8 + (bytes[i] - b'0') as u32;
                    i += 1;
                    digits += 1;
                }
                // \0..\777 are all valid scalar values.
                if let Some(ch) = char::from_u32(value) {
                    out.push(ch);
                }
            }
            b'x' => {
                let value = read_hex(bytes, &mut i, 2)
                    .ok_or(EscapeError::InvalidHexEscape { pos: esc_pos })?;
                match char::from_u32(value) {
                    Some(ch) => out.push(ch),
                    None => return Err(EscapeError::IllegalCodepoint { pos: esc_pos }),
                }
            }
            b'u' => {
                let value = read_hex(bytes, &mut i, 4).ok_or(EscapeError::TruncatedUnicodeEscape {
                    escape: 'u',
                    pos: esc_pos,
                })?;
                match char::from_u32(value) {
                    Some(ch) => out.push(ch),
                    None => return Err(EscapeError::IllegalCodepoint { pos: esc_pos }),
                }
            }
            b'U' => {
                let value = read_hex(bytes, &mut i, 8).ok_or(EscapeError::TruncatedUnicodeEscape {
                    escape: 'U',
                    pos: esc_pos,
                })?;
                match char::from_u32(value) {
                    Some(ch) => out.push(ch),
                    None => return Err(EscapeError::IllegalCodepoint { pos: esc_pos }),
                }
            }
            b'N' => {
                if i >= bytes.len() || bytes[i] != b'{' {
                    return Err(EscapeError::MalformedNamedEscape { pos: esc_pos });
                }
                i += 1;
                let name_start = i;
                while i < bytes.len() && bytes[i] != b'}' {
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(EscapeError::MalformedNamedEscape { pos: esc_pos });
                }
                let name = std::str::from_utf8(&bytes[name_start..i])
                    .map_err(|_| EscapeError::MalformedNamedEscape { pos: esc_pos })?;
                i += 1;
                match unicode_names2::character(name) {
                    Some(ch) => out.push(ch),
                    None => return Err(EscapeError::UnknownCharacterName { pos: esc_pos }),
                }
            }
            _ => {
                out.push('\\');
                out.push(c as char);
                if first_invalid_escape.is_none() {
                    first_invalid_escape = Some(c);
                }
            }
        }
    }
    Ok(DecodedText {
        value: out,
        first_invalid_escape,
    })
}

/// Read exactly `count` hex digits, advancing `i` past them.
fn read_hex(bytes: &[u8], i: &mut usize, count: usize) -> Option<u32> {
    if *i + count > bytes.len() {
        return None;
    }
    let mut value = 0u32;
    for _ in 0..count {
        let digit = (bytes[*i] as char).to_digit(16)?;
        value = value * 16 + digit;
        *i += 1;
    }
    Some(value)
}

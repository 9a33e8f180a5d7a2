//! F-string parsing: scanning, embedded expression compilation, assembly.
//!
//! An f-string body alternates literal runs with `{...}` expressions. The
//! literal scanner finds the next run, un-doubling `{{`/`}}` at the top
//! level and treating `\N{...}` as opaque. The expression scanner finds the
//! byte range of one embedded expression, tracking nested strings (single
//! and triple quoted), a bracket stack, and the `!` / `:` / `=` / `}`
//! terminators. The expression compiler re-lexes the range from a scratch
//! buffer and runs a fresh parser over it, with all locations mapped back
//! to the original file. The assembler drives the three and folds the
//! pieces into a `Constant` or a `JoinedStr`.
//!
//! Scanning works on bytes: every structural character is ASCII, so byte
//! positions at decision points are always UTF-8 boundaries.

use smallvec::SmallVec;
use velac_util::{Span, Symbol};

use crate::ast::{
    ConstantExpr, ConstantValue, Conversion, Expr, FormattedValueExpr, JoinedStrExpr,
};
use crate::string::StrToken;
use crate::Parser;

/// Maximum bracket nesting inside one embedded expression.
pub(crate) const MAXLEVEL: usize = 200;

/// Inline capacity of the expression list; f-strings rarely carry more
/// than a handful of pieces.
const EXPRLIST_CACHED: usize = 5;

/// One round of "find the next literal and expression".
struct FoundPiece<'a> {
    /// Literal text before the expression, if any was collected.
    literal: Option<String>,
    /// Self-documenting source text (the `expr=` form), if present.
    expr_text: Option<String>,
    /// The formatted value, absent at end of body.
    expression: Option<&'a Expr<'a>>,
    /// True after an un-doubled-brace round: emit the literal and rescan.
    again: bool,
}

impl<'a> Parser<'a> {
    /// Scan the next literal run of an f-string body.
    ///
    /// On return `pos` sits on the `{`/`}` that stopped the scan (or at the
    /// end of the body; after a doubled brace, past its second character).
    /// The boolean is true for the doubled-brace case: the caller should
    /// emit the literal collected so far and call again.
    fn fstring_find_literal(
        &mut self,
        body: &str,
        pos: &mut usize,
        raw: bool,
        recurse_lvl: u32,
        t: &StrToken<'_>,
    ) -> Option<(Option<String>, bool)> {
        let bytes = body.as_bytes();
        let end = bytes.len();
        let literal_start = *pos;
        let mut s = *pos;
        let mut doubled = false;
        let lit_end;

        'scan: {
            while s < end {
                let mut ch = bytes[s];
                s += 1;
                if !raw && ch == b'\\' && s < end {
                    ch = bytes[s];
                    s += 1;
                    if ch == b'N' {
                        // A unicode name escape is opaque here: skip to the
                        // closing brace without validating the name.
                        if s < end {
                            if bytes[s] == b'{' {
                                s += 1;
                                while s < end {
                                    let c = bytes[s];
                                    s += 1;
                                    if c == b'}' {
                                        break;
                                    }
                                }
                                continue;
                            }
                            if bytes[s] < 0x80 {
                                s += 1;
                            }
                        }
                        break;
                    }
                    if ch == b'{' {
                        self.warn_invalid_escape_sequence(b'{', t)?;
                    }
                }
                if ch == b'{' || ch == b'}' {
                    // Doubled braces only count at the top level; inside a
                    // format spec the second '}' ends the spec.
                    if recurse_lvl == 0 {
                        if s < end && bytes[s] == ch {
                            // The literal ends here (keeping one brace) but
                            // the caller should keep scanning after the
                            // second one.
                            *pos = s + 1;
                            lit_end = s;
                            doubled = true;
                            break 'scan;
                        }
                        if ch == b'}' {
                            *pos = s - 1;
                            self.syntax_error(t.span, "f-string: single '}' is not allowed");
                            return None;
                        }
                    }
                    // Either a '{' starting an expression or a '}' ending a
                    // nested format spec.
                    s -= 1;
                    break;
                }
            }
            *pos = s;
            lit_end = s;
        }

        let literal = if literal_start != lit_end {
            let text = &body[literal_start..lit_end];
            if raw {
                Some(text.to_string())
            } else {
                Some(self.decode_text_checked(text, t)?)
            }
        } else {
            None
        };
        Some((literal, doubled))
    }

    /// Scan one embedded expression starting at the `{` under `pos`, parse
    /// it, and return the resulting `FormattedValue` (plus the
    /// self-documenting text when `=` was used).
    fn fstring_find_expr(
        &mut self,
        body: &str,
        pos: &mut usize,
        raw: bool,
        recurse_lvl: u32,
        t: &StrToken<'_>,
        group_span: Span,
    ) -> Option<(Option<String>, &'a Expr<'a>)> {
        let bytes = body.as_bytes();
        let end = bytes.len();

        // The quote char we are trying to match inside a nested string, or
        // 0 outside one; 1 = single quoted, 3 = triple quoted.
        let mut quote_char = 0u8;
        let mut string_type = 0u8;

        let mut nested_depth = 0usize;
        let mut parenstack = [0u8; MAXLEVEL];

        let mut expr_text: Option<String> = None;
        let mut conversion_char: Option<u8> = None;
        let mut format_spec: Option<&'a Expr<'a>> = None;

        // Only one level of format-spec nesting is allowed.
        if recurse_lvl >= 2 {
            self.syntax_error(t.span, "f-string: expressions nested too deeply");
            return None;
        }

        // Skip the opening '{'.
        *pos += 1;
        let expr_start = *pos;
        let mut i = expr_start;

        while i < end {
            let ch = bytes[i];

            // Nowhere inside an expression is a backslash allowed.
            if ch == b'\\' {
                self.syntax_error(
                    t.span,
                    "f-string expression part cannot include a backslash",
                );
                return None;
            }

            if quote_char != 0 {
                // Inside a nested string: only its end matters here; any
                // real string error surfaces when the expression is parsed.
                if ch == quote_char {
                    if string_type == 3 {
                        if i + 2 < end && bytes[i + 1] == ch && bytes[i + 2] == ch {
                            i += 3;
                            string_type = 0;
                            quote_char = 0;
                            continue;
                        }
                    } else {
                        quote_char = 0;
                        string_type = 0;
                        i += 1;
                        continue;
                    }
                }
                i += 1;
            } else if ch == b'\'' || ch == b'"' {
                if i + 2 < end && bytes[i + 1] == ch && bytes[i + 2] == ch {
                    string_type = 3;
                    i += 2;
                } else {
                    string_type = 1;
                }
                quote_char = ch;
                i += 1;
            } else if ch == b'[' || ch == b'{' || ch == b'(' {
                if nested_depth >= MAXLEVEL {
                    self.syntax_error(t.span, "f-string: too many nested parenthesis");
                    return None;
                }
                parenstack[nested_depth] = ch;
                nested_depth += 1;
                i += 1;
            } else if ch == b'#' {
                self.syntax_error(t.span, "f-string expression part cannot include '#'");
                return None;
            } else if nested_depth == 0
                && matches!(ch, b'!' | b':' | b'}' | b'=' | b'>' | b'<')
            {
                if i + 1 < end {
                    let next = bytes[i + 1];

                    // Two-character operators pass through; '=' is not a
                    // conversion char, so nothing is lost treating "!=" so.
                    if (ch == b'!' && next == b'=')
                        || (ch == b'=' && next == b'=')
                        || (ch == b'<' && next == b'=')
                        || (ch == b'>' && next == b'=')
                    {
                        i += 2;
                        continue;
                    }
                    // Single '<' and '>' are comparison operators, not
                    // expression terminators.
                    if ch == b'>' || ch == b'<' {
                        i += 1;
                        continue;
                    }
                }

                // Normal way out of this loop.
                break;
            } else if ch == b']' || ch == b'}' || ch == b')' {
                if nested_depth == 0 {
                    self.syntax_error(t.span, format!("f-string: unmatched '{}'", ch as char));
                    return None;
                }
                nested_depth -= 1;
                let opening = parenstack[nested_depth];
                if !((opening == b'(' && ch == b')')
                    || (opening == b'[' && ch == b']')
                    || (opening == b'{' && ch == b'}'))
                {
                    self.syntax_error(
                        t.span,
                        format!(
                            "f-string: closing parenthesis '{}' does not match opening \
                             parenthesis '{}'",
                            ch as char, opening as char
                        ),
                    );
                    return None;
                }
                i += 1;
            } else {
                i += 1;
            }
        }
        let expr_end = i;

        // Better messages for states the expression parser would reject
        // anyway.
        if quote_char != 0 {
            self.syntax_error(t.span, "f-string: unterminated string");
            return None;
        }
        if nested_depth > 0 {
            let opening = parenstack[nested_depth - 1];
            self.syntax_error(t.span, format!("f-string: unmatched '{}'", opening as char));
            return None;
        }
        *pos = i;
        if i >= end {
            self.syntax_error(t.span, "f-string: expecting '}'");
            return None;
        }

        // Compile the expression first, so its errors come before errors
        // about the conversion or format spec.
        let simple_expression = self.fstring_compile_expr(t, &body[expr_start..expr_end])?;

        // '=' puts the source text of the expression in expr_text.
        if bytes[i] == b'=' {
            if self.feature_version() < 8 {
                self.syntax_error(
                    t.span,
                    "f-string: self documenting expressions are only supported with feature \
                     version 8 and greater",
                );
                return None;
            }
            i += 1;
            while i < end && matches!(bytes[i], b' ' | b'\t' | b'\n' | b'\x0c') {
                i += 1;
            }
            expr_text = Some(body[expr_start..i].to_string());
        }

        // Conversion char.
        if i < end && bytes[i] == b'!' {
            i += 1;
            if i >= end {
                *pos = i;
                self.syntax_error(t.span, "f-string: expecting '}'");
                return None;
            }
            let c = bytes[i];
            i += 1;
            if !matches!(c, b's' | b'r' | b'a') {
                self.syntax_error(
                    t.span,
                    "f-string: invalid conversion character: expected 's', 'r', or 'a'",
                );
                return None;
            }
            conversion_char = Some(c);
        }

        // Format spec: a nested f-string parse at the next recursion level.
        if i >= end {
            *pos = i;
            self.syntax_error(t.span, "f-string: expecting '}'");
            return None;
        }
        if bytes[i] == b':' {
            i += 1;
            *pos = i;
            if i >= end {
                self.syntax_error(t.span, "f-string: expecting '}'");
                return None;
            }
            format_spec = Some(self.fstring_parse(body, pos, raw, recurse_lvl + 1, t)?);
            i = *pos;
        }

        if i >= end || bytes[i] != b'}' {
            *pos = i;
            self.syntax_error(t.span, "f-string: expecting '}'");
            return None;
        }
        i += 1;
        *pos = i;

        // In '=' mode with no format spec and no explicit conversion, repr
        // is the default.
        let conversion = match conversion_char {
            Some(b's') => Conversion::Str,
            Some(b'r') => Conversion::Repr,
            Some(b'a') => Conversion::Ascii,
            _ => {
                if expr_text.is_some() && format_spec.is_none() {
                    Conversion::Repr
                } else {
                    Conversion::None
                }
            }
        };

        let expression = self.alloc(Expr::FormattedValue(FormattedValueExpr {
            value: simple_expression,
            conversion,
            format_spec,
            span: group_span,
        }));
        Some((expr_text, expression))
    }

    /// One round of the assembler loop: a literal (possibly empty), then an
    /// expression (absent at end of body).
    fn fstring_find_literal_and_expr(
        &mut self,
        body: &str,
        pos: &mut usize,
        raw: bool,
        recurse_lvl: u32,
        t: &StrToken<'_>,
        group_span: Span,
    ) -> Option<FoundPiece<'a>> {
        let (literal, doubled) = self.fstring_find_literal(body, pos, raw, recurse_lvl, t)?;
        if doubled {
            return Some(FoundPiece {
                literal,
                expr_text: None,
                expression: None,
                again: true,
            });
        }

        let bytes = body.as_bytes();
        if *pos >= bytes.len() || bytes[*pos] == b'}' {
            // End of the body, or end of a nested format spec: no
            // expression here.
            return Some(FoundPiece {
                literal,
                expr_text: None,
                expression: None,
                again: false,
            });
        }

        let (expr_text, expression) =
            self.fstring_find_expr(body, pos, raw, recurse_lvl, t, group_span)?;
        Some(FoundPiece {
            literal,
            expr_text,
            expression: Some(expression),
            again: false,
        })
    }

    /// Compile one embedded expression: reject the all-whitespace case,
    /// wrap the text in parentheses, re-lex it with locations mapped back
    /// to the original token, and run a fresh parser over it.
    fn fstring_compile_expr(
        &mut self,
        t: &StrToken<'_>,
        expr_src: &str,
    ) -> Option<&'a Expr<'a>> {
        // Catch the all-whitespace case here: wrapping it in parentheses
        // would turn an invalid expression into a valid one.
        if expr_src
            .bytes()
            .all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\x0c'))
        {
            self.syntax_error(t.span, "f-string: empty expression not allowed");
            return None;
        }

        // The brace-wrapped form is what appears verbatim in the token, so
        // it is what the location finder can search for.
        let mut scratch = String::with_capacity(expr_src.len() + 2);
        scratch.push('{');
        scratch.push_str(expr_src);
        scratch.push('}');

        let (lines, cols, byte_base) = find_expr_location(t, &scratch);

        // Now swap the braces for parentheses: the parenthesized form is
        // what actually gets parsed, allowing leading whitespace.
        let mut buf = scratch.into_bytes();
        let last = buf.len() - 1;
        buf[0] = b'(';
        buf[last] = b')';
        let scratch = match String::from_utf8(buf) {
            Ok(s) => s,
            Err(_) => {
                self.internal_error(t.span, "expression scratch buffer is not UTF-8");
                return None;
            }
        };

        let line_offset = t.span.line + lines - 1;
        let col_shift = if t.span.line == t.span.end_line {
            (t.span.column - 1) + cols
        } else {
            cols
        };

        let tokens = velac_lex::Lexer::embedded(
            &scratch,
            self.handler(),
            line_offset,
            col_shift,
            byte_base,
            t.span.file_id,
        )
        .tokenize();

        let mut inner = Parser::with_flags(
            tokens,
            self.handler(),
            self.arena(),
            self.feature_version(),
            self.parse_flags(),
        );
        let expr = inner.parse_fstring_input();
        if inner.error_indicator {
            self.error_indicator = true;
        }
        expr
    }

    /// Parse a complete (possibly nested) f-string body region: the entry
    /// used for format specs.
    pub(crate) fn fstring_parse(
        &mut self,
        body: &str,
        pos: &mut usize,
        raw: bool,
        recurse_lvl: u32,
        t: &StrToken<'_>,
    ) -> Option<&'a Expr<'a>> {
        let mut state = FstringParser::new();
        state.kind_u = t.has_u_prefix();
        state.concat_fstring(self, body, pos, raw, recurse_lvl, t, t.span)?;
        state.finish(self, t.span)
    }
}

/// Locate `brace_wrapped` (the `{...}` form of an embedded expression)
/// inside the raw token text, returning the newline count before it, the
/// column distance from the preceding line start, and the absolute byte
/// offset of the brace.
///
/// Substring search finds the first occurrence; a textually duplicated
/// expression maps to the first one, which is as precise as the token
/// bytes allow.
fn find_expr_location(t: &StrToken<'_>, brace_wrapped: &str) -> (u32, u32, usize) {
    let parent = t.text;
    let Some(pos) = parent.find(brace_wrapped) else {
        return (0, 0, t.span.start);
    };
    let bytes = parent.as_bytes();

    // If only blanks separate the opening brace from a newline, the
    // expression starts on its own line and no column shift applies.
    let mut newline_after_brace = true;
    let mut probe = pos + 1;
    while probe < bytes.len() && bytes[probe] != b'}' && bytes[probe] != b'\n' {
        if !matches!(bytes[probe], b' ' | b'\t' | b'\x0c') {
            newline_after_brace = false;
            break;
        }
        probe += 1;
    }

    let mut cols = 0u32;
    if !newline_after_brace {
        // Distance from the last newline to our left (or the token start)
        // to the brace.
        let mut line_start = pos;
        while line_start > 0 && bytes[line_start] != b'\n' {
            line_start -= 1;
        }
        cols = (pos - line_start) as u32;
    }

    let lines = parent[..pos].bytes().filter(|&b| b == b'\n').count() as u32;
    (lines, cols, t.span.start + pos)
}

/// Assembler state: the pending literal and the expression list.
///
/// `last_str` is `None` or non-empty; adjacent literal pieces always merge
/// into it before any node is made, so a `JoinedStr` never carries two
/// adjacent constants.
pub(crate) struct FstringParser<'a> {
    last_str: Option<String>,
    exprs: SmallVec<[&'a Expr<'a>; EXPRLIST_CACHED]>,
    fmode: bool,
    /// Give flushed constants the "u" kind (first token had a `u` prefix).
    pub(crate) kind_u: bool,
}

impl<'a> FstringParser<'a> {
    pub(crate) fn new() -> Self {
        Self {
            last_str: None,
            exprs: SmallVec::new(),
            fmode: false,
            kind_u: false,
        }
    }

    /// Add a plain literal piece. Empty pieces are dropped; adjacent
    /// pieces concatenate.
    pub(crate) fn concat(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        match &mut self.last_str {
            Some(last) => last.push_str(&text),
            None => self.last_str = Some(text),
        }
    }

    /// Feed one f-string body (or format-spec region) through the state.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn concat_fstring(
        &mut self,
        p: &mut Parser<'a>,
        body: &str,
        pos: &mut usize,
        raw: bool,
        recurse_lvl: u32,
        t: &StrToken<'_>,
        group_span: Span,
    ) -> Option<()> {
        loop {
            let piece =
                p.fstring_find_literal_and_expr(body, pos, raw, recurse_lvl, t, group_span)?;

            if let Some(literal) = piece.literal {
                self.concat(literal);
            }
            if let Some(text) = piece.expr_text {
                self.concat(text);
            }

            // A doubled brace: emit nothing yet, scan the next round.
            if piece.again {
                continue;
            }

            let Some(expression) = piece.expression else {
                break;
            };

            // An actual formatted value makes this a joined string. A body
            // holding only literal or doubled-brace text stays a constant.
            self.fmode = true;

            // Flush any pending literal before the expression so pieces
            // stay in source order.
            if let Some(last) = self.last_str.take() {
                let node = make_str_node(p, last, self.kind_u, group_span);
                self.exprs.push(node);
            }
            self.exprs.push(expression);
        }

        // At the top level we must have consumed the body (the final
        // position may sit on the last byte); inside a format spec we must
        // sit on the closing '}' for the caller to consume.
        if recurse_lvl == 0 && *pos + 1 < body.len() {
            p.syntax_error(t.span, "f-string: unexpected end of string");
            return None;
        }
        if recurse_lvl != 0 && (*pos >= body.len() || body.as_bytes()[*pos] != b'}') {
            p.syntax_error(t.span, "f-string: expecting '}'");
            return None;
        }

        Some(())
    }

    /// Convert the accumulated state into a `Constant` (no expressions
    /// seen) or a `JoinedStr`.
    pub(crate) fn finish(mut self, p: &mut Parser<'a>, group_span: Span) -> Option<&'a Expr<'a>> {
        if !self.fmode {
            debug_assert!(self.exprs.is_empty());
            let last = self.last_str.take().unwrap_or_default();
            return Some(make_str_node(p, last, self.kind_u, group_span));
        }

        if let Some(last) = self.last_str.take() {
            let node = make_str_node(p, last, self.kind_u, group_span);
            self.exprs.push(node);
        }

        let values = p.arena().alloc_slice(&self.exprs);
        Some(p.alloc(Expr::JoinedStr(JoinedStrExpr {
            values,
            span: group_span,
        })))
    }
}

/// Make a `Constant` text node, moving the decoded value into the arena.
fn make_str_node<'a>(
    p: &mut Parser<'a>,
    text: String,
    kind_u: bool,
    span: Span,
) -> &'a Expr<'a> {
    let kind = if kind_u {
        Some(Symbol::intern("u"))
    } else {
        None
    };
    let value = ConstantValue::Str(p.arena().alloc_str(&text));
    p.alloc(Expr::Constant(ConstantExpr { value, kind, span }))
}

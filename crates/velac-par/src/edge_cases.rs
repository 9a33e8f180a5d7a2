//! Edge case tests for velac-par, centered on string-literal parsing.

use crate::ast::{ConstantValue, Conversion, Expr};
use crate::{parse_string_source, Parser, StrToken};
use velac_lex::{Lexer, Token};
use velac_util::{Arena, Handler, Span};

fn parse<'a>(arena: &'a Arena, handler: &'a Handler, source: &str) -> &'a Expr<'a> {
    parse_string_source(source, arena, handler, 8)
        .unwrap_or_else(|| panic!("parse failed: {:?}", handler.diagnostics()))
}

fn parse_err(source: &str) -> Handler {
    let arena = Arena::new();
    let handler = Handler::new();
    assert!(
        parse_string_source(source, &arena, &handler, 8).is_none(),
        "expected a parse failure for {:?}",
        source
    );
    handler
}

// ==================== EDGE CASES ====================

/// EDGE CASE: Empty body yields a zero-length constant
#[test]
fn test_edge_empty_string() {
    let arena = Arena::new();
    let handler = Handler::new();
    match parse(&arena, &handler, "\"\"") {
        Expr::Constant(c) => assert_eq!(c.value, ConstantValue::Str("")),
        other => panic!("expected Constant, got {:?}", other),
    }
}

/// EDGE CASE: A body of only doubled braces is a constant, not a JoinedStr
#[test]
fn test_edge_only_doubled_braces() {
    let arena = Arena::new();
    let handler = Handler::new();
    match parse(&arena, &handler, "f\"{{}}\"") {
        Expr::Constant(c) => assert_eq!(c.value, ConstantValue::Str("{}")),
        other => panic!("expected Constant, got {:?}", other),
    }
}

/// EDGE CASE: FormattedValue pieces come out in source order, constants merged
#[test]
fn test_edge_pieces_in_order_and_merged() {
    let arena = Arena::new();
    let handler = Handler::new();
    match parse(&arena, &handler, "f\"a{x}b{{c}}d{y}e\"") {
        Expr::JoinedStr(j) => {
            assert_eq!(j.values.len(), 5);
            let mut saw_constant = false;
            for pair in j.values.windows(2) {
                let both_constants = matches!(pair[0], Expr::Constant(_))
                    && matches!(pair[1], Expr::Constant(_));
                assert!(!both_constants, "adjacent constants not merged");
            }
            for v in j.values {
                if let Expr::Constant(c) = v {
                    saw_constant = true;
                    assert!(matches!(c.value, ConstantValue::Str(_)));
                }
            }
            assert!(saw_constant);
        }
        other => panic!("expected JoinedStr, got {:?}", other),
    }
}

/// EDGE CASE: Spans run first token start to last token end
#[test]
fn test_edge_group_span() {
    let arena = Arena::new();
    let handler = Handler::new();
    let expr = parse(&arena, &handler, "\"ab\" \"cd\"");
    let span = expr.span();
    assert_eq!(span.start, 0);
    assert_eq!(span.end, 9);
    assert_eq!(span.line, 1);
    assert!(span.line <= span.end_line);
}

/// EDGE CASE: Every node in an f-string carries a span inside the group
#[test]
fn test_edge_fstring_piece_spans() {
    let arena = Arena::new();
    let handler = Handler::new();
    match parse(&arena, &handler, "f\"a={1+2}\"") {
        Expr::JoinedStr(j) => {
            for v in j.values {
                let span = v.span();
                assert!(span.line >= 1);
                assert!(span.line <= span.end_line);
            }
        }
        other => panic!("expected JoinedStr, got {:?}", other),
    }
}

/// EDGE CASE: Deeply nested brackets below the cap parse fine
#[test]
fn test_edge_bracket_nesting_below_cap() {
    let arena = Arena::new();
    let handler = Handler::new();
    let source = format!("f\"{{{}x{}}}\"", "(".repeat(32), ")".repeat(32));
    assert!(parse_string_source(&source, &arena, &handler, 8).is_some());
}

/// EDGE CASE: Bracket nesting above MAXLEVEL is rejected
#[test]
fn test_edge_bracket_nesting_above_cap() {
    let arena = Arena::new();
    let handler = Handler::new();
    let source = format!("f\"{{{}x{}}}\"", "(".repeat(201), ")".repeat(201));
    assert!(parse_string_source(&source, &arena, &handler, 8).is_none());
    assert!(handler.has_error_containing("too many nested parenthesis"));
}

/// EDGE CASE: Format-spec recursion beyond one level is rejected
#[test]
fn test_edge_spec_recursion_capped() {
    let handler = parse_err("f\"{a:{b:{c}}}\"");
    assert!(handler.has_error_containing("expressions nested too deeply"));
}

// ==================== ERROR MESSAGES ====================

#[test]
fn test_error_empty_expression() {
    let handler = parse_err("f\"{}\"");
    assert!(handler.has_error_containing("empty expression not allowed"));
}

#[test]
fn test_error_whitespace_only_expression() {
    let handler = parse_err("f\"{   }\"");
    assert!(handler.has_error_containing("empty expression not allowed"));
}

#[test]
fn test_error_backslash_in_expression() {
    let handler = parse_err("f\"{a\\b}\"");
    assert!(handler.has_error_containing("cannot include a backslash"));
}

#[test]
fn test_error_comment_in_expression() {
    let handler = parse_err("f\"{a#b}\"");
    assert!(handler.has_error_containing("cannot include '#'"));
}

#[test]
fn test_error_single_closing_brace() {
    let handler = parse_err("f\"}\"");
    assert!(handler.has_error_containing("single '}' is not allowed"));
}

#[test]
fn test_error_mismatched_bracket() {
    let handler = parse_err("f\"{(a]}\"");
    assert!(handler.has_error_containing("does not match opening parenthesis"));
}

#[test]
fn test_error_unmatched_closing_bracket() {
    let handler = parse_err("f\"{a)}\"");
    assert!(handler.has_error_containing("unmatched ')'"));
}

#[test]
fn test_error_unclosed_bracket() {
    let handler = parse_err("f\"{(a}\"");
    assert!(handler.has_error_containing("does not match opening parenthesis"));
}

#[test]
fn test_error_unterminated_nested_string() {
    let handler = parse_err("f\"{'a}\"");
    assert!(handler.has_error_containing("unterminated string"));
}

#[test]
fn test_error_invalid_conversion() {
    let handler = parse_err("f\"{x!z}\"");
    assert!(handler.has_error_containing("expected 's', 'r', or 'a'"));
}

#[test]
fn test_error_missing_closing_brace() {
    let handler = parse_err("f\"{x\"");
    assert!(handler.has_error_containing("expecting '}'"));
}

#[test]
fn test_error_self_documenting_feature_gate() {
    let arena = Arena::new();
    let handler = Handler::new();
    assert!(parse_string_source("f\"{x=}\"", &arena, &handler, 7).is_none());
    assert!(handler.has_error_containing("feature version 8"));
}

// ==================== END-TO-END SCENARIOS ====================

#[test]
fn test_scenario_bytes_with_escapes() {
    let arena = Arena::new();
    let handler = Handler::new();
    match parse(&arena, &handler, "b\"\\xff\\n\"") {
        Expr::Constant(c) => {
            assert_eq!(c.value, ConstantValue::Bytes(&[0xffu8, 0x0a] as &[u8]));
        }
        other => panic!("expected Constant, got {:?}", other),
    }
}

#[test]
fn test_scenario_regex_with_flags() {
    let arena = Arena::new();
    let handler = Handler::new();
    match parse(&arena, &handler, "re\"\\d+\"g") {
        Expr::Regex(r) => {
            assert_eq!(r.pattern, "\\d+");
            assert_eq!(r.flags, "g");
        }
        other => panic!("expected Regex, got {:?}", other),
    }
}

#[test]
fn test_scenario_conversion_defaults() {
    let arena = Arena::new();
    let handler = Handler::new();
    match parse(&arena, &handler, "f\"{x}\"") {
        Expr::JoinedStr(j) => match j.values[0] {
            Expr::FormattedValue(f) => {
                assert_eq!(f.conversion, Conversion::None);
                assert_eq!(f.conversion.as_int(), -1);
            }
            other => panic!("expected FormattedValue, got {:?}", other),
        },
        other => panic!("expected JoinedStr, got {:?}", other),
    }
}

/// Driving the group driver directly, the way the surrounding grammar does.
#[test]
fn test_direct_group_driver() {
    let arena = Arena::new();
    let handler = Handler::new();
    let tokens = Lexer::new("f\"n={n}\" \" done\"", &handler).tokenize();
    let mut group: Vec<StrToken<'_>> = Vec::new();
    for tok in &tokens {
        if let Token::Str(sym) = tok.token {
            group.push(StrToken::new(sym.as_str(), tok.span));
        }
    }
    assert_eq!(group.len(), 2);
    let mut parser = Parser::new(tokens.clone(), &handler, &arena, 8);
    let expr = parser.parse_string_group(&group).expect("parse");
    match expr {
        Expr::JoinedStr(j) => {
            assert_eq!(j.values.len(), 3);
            assert!(matches!(j.values[1], Expr::FormattedValue(_)));
            // The trailing plain literal merges into the final constant.
            match j.values[2] {
                Expr::Constant(c) => assert_eq!(c.value, ConstantValue::Str(" done")),
                other => panic!("expected Constant, got {:?}", other),
            }
        }
        other => panic!("expected JoinedStr, got {:?}", other),
    }
}

/// Scratch buffers are transient: nothing keeps the parse from being
/// repeated against the same arena.
#[test]
fn test_reparse_same_arena() {
    let arena = Arena::new();
    let handler = Handler::new();
    let first = parse(&arena, &handler, "f\"{v:>{w}}\"");
    let second = parse(&arena, &handler, "f\"{v:>{w}}\"");
    assert!(matches!(first, Expr::JoinedStr(_)));
    assert!(matches!(second, Expr::JoinedStr(_)));
    assert!(!handler.has_errors());
}

/// A span sanity pass over a batch of valid literals.
#[test]
fn test_span_invariants_across_inputs() {
    let sources = [
        "\"plain\"",
        "u\"kindred\"",
        "b\"bytes\"",
        "r\"raw\\d\"",
        "'c'",
        "f\"{x!r:>{w}}\"",
        "f\"\"\"multi\n{y}\"\"\"",
        "re\"p\"i",
    ];
    for source in sources {
        let arena = Arena::new();
        let handler = Handler::new();
        let expr = parse(&arena, &handler, source);
        let span = expr.span();
        assert!(span.start <= span.end, "bad byte range for {:?}", source);
        assert!(span.line <= span.end_line, "bad lines for {:?}", source);
        assert_ne!(span, Span::DUMMY);
    }
}

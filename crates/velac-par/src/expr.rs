//! Expression parsing using Pratt parsing (top-down operator precedence).
//!
//! Embedded f-string expressions re-enter this parser after being re-lexed
//! from a scratch buffer, so the grammar here is the expression subset of
//! the language: boolean and comparison chains, arithmetic and bitwise
//! operators, conditional expressions, lambdas, displays, calls, attribute
//! access, and subscription. String-literal atoms feed back into the string
//! parser, which is how nested f-strings compose.
//!
//! # Operator precedence (lowest to highest)
//!
//! | Operators | Associativity |
//! |-----------|---------------|
//! | `a if t else b` | Right |
//! | `or` | Left |
//! | `and` | Left |
//! | `not x` | Prefix |
//! | `== != < <= > >= in, not in, is, is not` | Chained |
//! | `\|` / `^` / `&` | Left |
//! | `<< >>` | Left |
//! | `+ -` | Left |
//! | `* / // %` | Left |
//! | `+x -x ~x` | Prefix |
//! | `**` | Right |

use velac_lex::Token;
use velac_util::diagnostic::{DiagnosticBuilder, E_PARSE_UNEXPECTED_EOF};
use velac_util::{Span, Symbol};

use crate::ast::{
    AttributeExpr, BinOp, BinOpExpr, BoolOpExpr, BoolOpKind, CallExpr, CmpOp, CompareExpr,
    ConstantExpr, ConstantValue, DictExpr, Expr, IfExpExpr, Keyword, LambdaExpr, NameExpr,
    SeqExpr, SliceExpr, SubscriptExpr, UnaryOpExpr, UnaryOpKind,
};
use crate::string::StrToken;
use crate::Parser;

/// Binding power levels for Pratt parsing.
/// Higher numbers = tighter binding (higher precedence).
pub(crate) mod bp {
    /// Minimum binding power (start of expression).
    pub const MIN: u8 = 0;

    /// Conditional expression: `a if t else b`.
    pub const TERNARY: u8 = 2;

    /// Boolean OR: `or`.
    pub const OR: u8 = 4;

    /// Boolean AND: `and`.
    pub const AND: u8 = 6;

    /// Boolean NOT (prefix): `not`.
    pub const NOT: u8 = 8;

    /// Comparisons: `== != < <= > >= in is`.
    pub const COMPARISON: u8 = 10;

    /// Bitwise OR: `|`.
    pub const BITWISE_OR: u8 = 12;

    /// Bitwise XOR: `^`.
    pub const BITWISE_XOR: u8 = 14;

    /// Bitwise AND: `&`.
    pub const BITWISE_AND: u8 = 16;

    /// Shift: `<< >>`.
    pub const SHIFT: u8 = 18;

    /// Additive: `+ -`.
    pub const ADDITIVE: u8 = 20;

    /// Multiplicative: `* / // %`.
    pub const MULTIPLICATIVE: u8 = 22;

    /// Unary prefix: `+ - ~`.
    pub const UNARY: u8 = 24;

    /// Power: `**` (right-associative).
    pub const POWER: u8 = 26;
}

/// Binding power and AST operator for a binary operator token.
fn binary_op(token: Token) -> Option<(u8, BinOp)> {
    match token {
        Token::Pipe => Some((bp::BITWISE_OR, BinOp::BitOr)),
        Token::Caret => Some((bp::BITWISE_XOR, BinOp::BitXor)),
        Token::Amp => Some((bp::BITWISE_AND, BinOp::BitAnd)),
        Token::Shl => Some((bp::SHIFT, BinOp::LShift)),
        Token::Shr => Some((bp::SHIFT, BinOp::RShift)),
        Token::Plus => Some((bp::ADDITIVE, BinOp::Add)),
        Token::Minus => Some((bp::ADDITIVE, BinOp::Sub)),
        Token::Star => Some((bp::MULTIPLICATIVE, BinOp::Mult)),
        Token::Slash => Some((bp::MULTIPLICATIVE, BinOp::Div)),
        Token::SlashSlash => Some((bp::MULTIPLICATIVE, BinOp::FloorDiv)),
        Token::Percent => Some((bp::MULTIPLICATIVE, BinOp::Mod)),
        Token::StarStar => Some((bp::POWER, BinOp::Pow)),
        _ => None,
    }
}

impl<'a> Parser<'a> {
    /// Main expression entry point.
    pub fn parse_expr(&mut self) -> Option<&'a Expr<'a>> {
        if self.current() == Token::Lambda {
            return self.parse_lambda();
        }
        self.parse_expr_bp(bp::MIN)
    }

    /// Pratt parser core: parse an expression consuming only operators
    /// whose left binding power is at least `min_bp`.
    pub(crate) fn parse_expr_bp(&mut self, min_bp: u8) -> Option<&'a Expr<'a>> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let token = self.current();
            match token {
                Token::If if bp::TERNARY >= min_bp => {
                    self.advance();
                    let test = self.parse_expr_bp(bp::TERNARY + 1)?;
                    self.expect(Token::Else)?;
                    let orelse = self.parse_expr()?;
                    let span = Span::between(lhs.span(), orelse.span());
                    lhs = self.alloc(Expr::IfExp(IfExpExpr {
                        test,
                        body: lhs,
                        orelse,
                        span,
                    }));
                }
                Token::Or if bp::OR >= min_bp => {
                    self.advance();
                    let rhs = self.parse_expr_bp(bp::OR + 1)?;
                    lhs = self.bool_op(BoolOpKind::Or, lhs, rhs);
                }
                Token::And if bp::AND >= min_bp => {
                    self.advance();
                    let rhs = self.parse_expr_bp(bp::AND + 1)?;
                    lhs = self.bool_op(BoolOpKind::And, lhs, rhs);
                }
                _ if bp::COMPARISON >= min_bp && self.at_cmp_op() => {
                    lhs = self.parse_comparison(lhs)?;
                }
                _ => {
                    let Some((lbp, op)) = binary_op(token) else {
                        break;
                    };
                    if lbp < min_bp {
                        break;
                    }
                    self.advance();
                    // `**` is right-associative; everything else is left.
                    let rbp = if op == BinOp::Pow { lbp } else { lbp + 1 };
                    let right = self.parse_expr_bp(rbp)?;
                    let span = Span::between(lhs.span(), right.span());
                    lhs = self.alloc(Expr::BinOp(BinOpExpr {
                        left: lhs,
                        op,
                        right,
                        span,
                    }));
                }
            }
        }

        Some(lhs)
    }

    fn bool_op(
        &mut self,
        op: BoolOpKind,
        lhs: &'a Expr<'a>,
        rhs: &'a Expr<'a>,
    ) -> &'a Expr<'a> {
        let span = Span::between(lhs.span(), rhs.span());
        let values = self.arena().alloc_slice(&[lhs, rhs]);
        self.alloc(Expr::BoolOp(BoolOpExpr { op, values, span }))
    }

    /// True if the current token starts a comparison operator.
    fn at_cmp_op(&self) -> bool {
        matches!(
            self.current(),
            Token::EqEq
                | Token::NotEq
                | Token::Lt
                | Token::Le
                | Token::Gt
                | Token::Ge
                | Token::In
                | Token::Is
        ) || (self.current() == Token::Not && self.peek(1) == Token::In)
    }

    /// Consume one comparison operator, including the two-word forms.
    fn read_cmp_op(&mut self) -> Option<CmpOp> {
        let op = match self.current() {
            Token::EqEq => CmpOp::Eq,
            Token::NotEq => CmpOp::NotEq,
            Token::Lt => CmpOp::Lt,
            Token::Le => CmpOp::LtE,
            Token::Gt => CmpOp::Gt,
            Token::Ge => CmpOp::GtE,
            Token::In => CmpOp::In,
            Token::Is => {
                self.advance();
                if self.current() == Token::Not {
                    self.advance();
                    return Some(CmpOp::IsNot);
                }
                return Some(CmpOp::Is);
            }
            Token::Not => {
                self.advance();
                self.expect(Token::In)?;
                return Some(CmpOp::NotIn);
            }
            _ => {
                self.unexpected_token();
                return None;
            }
        };
        self.advance();
        Some(op)
    }

    /// Parse a comparison chain (`a < b <= c`) into one `Compare` node.
    fn parse_comparison(&mut self, left: &'a Expr<'a>) -> Option<&'a Expr<'a>> {
        let mut ops = Vec::new();
        let mut comparators: Vec<&'a Expr<'a>> = Vec::new();
        while self.at_cmp_op() {
            let op = self.read_cmp_op()?;
            let comparator = self.parse_expr_bp(bp::COMPARISON + 1)?;
            ops.push(op);
            comparators.push(comparator);
        }
        let span = match comparators.last() {
            Some(last) => Span::between(left.span(), last.span()),
            None => left.span(),
        };
        let ops = self.arena().alloc_slice(&ops);
        let comparators = self.arena().alloc_slice(&comparators);
        Some(self.alloc(Expr::Compare(CompareExpr {
            left,
            ops,
            comparators,
            span,
        })))
    }

    /// Parse a prefix operator or fall through to a postfix expression.
    fn parse_prefix(&mut self) -> Option<&'a Expr<'a>> {
        let (op, operand_bp) = match self.current() {
            Token::Not => (UnaryOpKind::Not, bp::NOT),
            Token::Minus => (UnaryOpKind::USub, bp::UNARY),
            Token::Plus => (UnaryOpKind::UAdd, bp::UNARY),
            Token::Tilde => (UnaryOpKind::Invert, bp::UNARY),
            Token::Lambda => return self.parse_lambda(),
            _ => return self.parse_postfix(),
        };
        let start = self.current_span();
        self.advance();
        let operand = self.parse_expr_bp(operand_bp)?;
        let span = Span::between(start, operand.span());
        Some(self.alloc(Expr::UnaryOp(UnaryOpExpr { op, operand, span })))
    }

    /// Parse an atom followed by any number of postfix operations.
    fn parse_postfix(&mut self) -> Option<&'a Expr<'a>> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.current() {
                Token::LParen => {
                    expr = self.parse_call(expr)?;
                }
                Token::Dot => {
                    self.advance();
                    let Token::Ident(attr) = self.current() else {
                        self.unexpected_token();
                        return None;
                    };
                    let end = self.current_span();
                    self.advance();
                    let span = Span::between(expr.span(), end);
                    expr = self.alloc(Expr::Attribute(AttributeExpr {
                        value: expr,
                        attr,
                        span,
                    }));
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_subscript_index()?;
                    let end = self.expect(Token::RBracket)?;
                    let span = Span::between(expr.span(), end);
                    expr = self.alloc(Expr::Subscript(SubscriptExpr {
                        value: expr,
                        index,
                        span,
                    }));
                }
                _ => break,
            }
        }
        Some(expr)
    }

    /// Parse call arguments; the current token is `(`.
    fn parse_call(&mut self, func: &'a Expr<'a>) -> Option<&'a Expr<'a>> {
        self.advance();
        let mut args: Vec<&'a Expr<'a>> = Vec::new();
        let mut keywords: Vec<Keyword<'a>> = Vec::new();
        while self.current() != Token::RParen {
            if let Token::Ident(name) = self.current() {
                if self.peek(1) == Token::Assign {
                    self.advance();
                    self.advance();
                    let value = self.parse_expr()?;
                    keywords.push(Keyword { arg: name, value });
                    if !self.eat_comma_in_list(Token::RParen) {
                        break;
                    }
                    continue;
                }
            }
            let arg = self.parse_expr()?;
            if !keywords.is_empty() {
                self.syntax_error(arg.span(), "positional argument follows keyword argument");
                return None;
            }
            args.push(arg);
            if !self.eat_comma_in_list(Token::RParen) {
                break;
            }
        }
        let end = self.expect(Token::RParen)?;
        let span = Span::between(func.span(), end);
        let args = self.arena().alloc_slice(&args);
        let keywords = self.arena().alloc_slice(&keywords);
        Some(self.alloc(Expr::Call(CallExpr {
            func,
            args,
            keywords,
            span,
        })))
    }

    /// After a list element: consume a comma, returning false when the
    /// closing delimiter follows instead (or on a trailing comma).
    fn eat_comma_in_list(&mut self, close: Token) -> bool {
        if self.current() == Token::Comma {
            self.advance();
            self.current() != close
        } else {
            false
        }
    }

    /// Parse the index of a subscription: a plain expression or a slice.
    fn parse_subscript_index(&mut self) -> Option<&'a Expr<'a>> {
        let start = self.current_span();
        let lower = if self.current() == Token::Colon {
            None
        } else {
            Some(self.parse_expr()?)
        };
        if self.current() != Token::Colon {
            return match lower {
                Some(index) => Some(index),
                None => {
                    self.unexpected_token();
                    None
                }
            };
        }
        let mut end = self.current_span();
        self.advance();
        let upper = if matches!(self.current(), Token::Colon | Token::RBracket) {
            None
        } else {
            let e = self.parse_expr()?;
            end = e.span();
            Some(e)
        };
        let step = if self.current() == Token::Colon {
            end = self.current_span();
            self.advance();
            if self.current() == Token::RBracket {
                None
            } else {
                let e = self.parse_expr()?;
                end = e.span();
                Some(e)
            }
        } else {
            None
        };
        let span = Span::between(lower.map_or(start, |e| e.span()), end);
        Some(self.alloc(Expr::Slice(SliceExpr {
            lower,
            upper,
            step,
            span,
        })))
    }

    /// Parse an atomic expression.
    fn parse_atom(&mut self) -> Option<&'a Expr<'a>> {
        let span = self.current_span();
        match self.current() {
            Token::Ident(id) => {
                self.advance();
                Some(self.alloc(Expr::Name(NameExpr { id, span })))
            }
            Token::Int(value) => {
                self.advance();
                Some(self.constant(ConstantValue::Int(value), span))
            }
            Token::Float(value) => {
                self.advance();
                Some(self.constant(ConstantValue::Float(value), span))
            }
            Token::True => {
                self.advance();
                Some(self.constant(ConstantValue::Bool(true), span))
            }
            Token::False => {
                self.advance();
                Some(self.constant(ConstantValue::Bool(false), span))
            }
            Token::None => {
                self.advance();
                Some(self.constant(ConstantValue::None, span))
            }
            Token::Str(_) => self.parse_string_atom(),
            Token::LParen => self.parse_paren_atom(),
            Token::LBracket => self.parse_list_atom(),
            Token::LBrace => self.parse_dict_or_set_atom(),
            Token::Lambda => self.parse_lambda(),
            Token::Eof => {
                self.error_indicator = true;
                DiagnosticBuilder::error("unexpected end of input".to_string())
                    .code(E_PARSE_UNEXPECTED_EOF)
                    .span(span)
                    .emit(self.handler());
                None
            }
            _ => {
                self.unexpected_token();
                None
            }
        }
    }

    fn constant(&mut self, value: ConstantValue<'a>, span: Span) -> &'a Expr<'a> {
        self.alloc(Expr::Constant(ConstantExpr {
            value,
            kind: None,
            span,
        }))
    }

    /// A run of adjacent string-literal tokens is one atom: the surrounding
    /// grammar concatenates them through a single f-string parser state.
    fn parse_string_atom(&mut self) -> Option<&'a Expr<'a>> {
        let mut group: Vec<StrToken<'_>> = Vec::new();
        while let Token::Str(sym) = self.current() {
            group.push(StrToken::new(sym.as_str(), self.current_span()));
            self.advance();
        }
        self.parse_string_group(&group)
    }

    /// `(` expression `)`, a tuple display, or the empty tuple.
    fn parse_paren_atom(&mut self) -> Option<&'a Expr<'a>> {
        let start = self.current_span();
        self.advance();
        if self.current() == Token::RParen {
            let end = self.current_span();
            self.advance();
            let span = Span::between(start, end);
            return Some(self.alloc(Expr::Tuple(SeqExpr { elts: &[], span })));
        }
        let first = self.parse_expr()?;
        if self.current() != Token::Comma {
            self.expect(Token::RParen)?;
            // A parenthesized group is the inner expression itself.
            return Some(first);
        }
        let mut elts = vec![first];
        while self.eat_comma_in_list(Token::RParen) {
            elts.push(self.parse_expr()?);
        }
        let end = self.expect(Token::RParen)?;
        let span = Span::between(start, end);
        let elts = self.arena().alloc_slice(&elts);
        Some(self.alloc(Expr::Tuple(SeqExpr { elts, span })))
    }

    /// `[` elements `]`.
    fn parse_list_atom(&mut self) -> Option<&'a Expr<'a>> {
        let start = self.current_span();
        self.advance();
        let mut elts: Vec<&'a Expr<'a>> = Vec::new();
        while self.current() != Token::RBracket {
            elts.push(self.parse_expr()?);
            if !self.eat_comma_in_list(Token::RBracket) {
                break;
            }
        }
        let end = self.expect(Token::RBracket)?;
        let span = Span::between(start, end);
        let elts = self.arena().alloc_slice(&elts);
        Some(self.alloc(Expr::List(SeqExpr { elts, span })))
    }

    /// `{}` (empty dict), `{k: v, ...}`, or `{a, b, ...}`.
    fn parse_dict_or_set_atom(&mut self) -> Option<&'a Expr<'a>> {
        let start = self.current_span();
        self.advance();
        if self.current() == Token::RBrace {
            let end = self.current_span();
            self.advance();
            let span = Span::between(start, end);
            return Some(self.alloc(Expr::Dict(DictExpr {
                keys: &[],
                values: &[],
                span,
            })));
        }
        let first = self.parse_expr()?;
        if self.current() == Token::Colon {
            self.advance();
            let mut keys = vec![first];
            let mut values = vec![self.parse_expr()?];
            while self.eat_comma_in_list(Token::RBrace) {
                keys.push(self.parse_expr()?);
                self.expect(Token::Colon)?;
                values.push(self.parse_expr()?);
            }
            let end = self.expect(Token::RBrace)?;
            let span = Span::between(start, end);
            let keys = self.arena().alloc_slice(&keys);
            let values = self.arena().alloc_slice(&values);
            return Some(self.alloc(Expr::Dict(DictExpr { keys, values, span })));
        }
        let mut elts = vec![first];
        while self.eat_comma_in_list(Token::RBrace) {
            elts.push(self.parse_expr()?);
        }
        let end = self.expect(Token::RBrace)?;
        let span = Span::between(start, end);
        let elts = self.arena().alloc_slice(&elts);
        Some(self.alloc(Expr::Set(SeqExpr { elts, span })))
    }

    /// `lambda params: body`.
    fn parse_lambda(&mut self) -> Option<&'a Expr<'a>> {
        let start = self.current_span();
        self.advance();
        let mut params: Vec<Symbol> = Vec::new();
        while let Token::Ident(name) = self.current() {
            params.push(name);
            self.advance();
            if self.current() == Token::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(Token::Colon)?;
        let body = self.parse_expr()?;
        let span = Span::between(start, body.span());
        let params = self.arena().alloc_slice(&params);
        Some(self.alloc(Expr::Lambda(LambdaExpr { params, body, span })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_expr_source;
    use velac_util::{Arena, Handler};

    fn parse<'a>(arena: &'a Arena, handler: &'a Handler, source: &str) -> &'a Expr<'a> {
        parse_expr_source(source, arena, handler, 8)
            .unwrap_or_else(|| panic!("parse failed: {:?}", handler.diagnostics()))
    }

    #[test]
    fn test_precedence_mul_over_add() {
        let arena = Arena::new();
        let handler = Handler::new();
        match parse(&arena, &handler, "a + b * c") {
            Expr::BinOp(top) => {
                assert_eq!(top.op, BinOp::Add);
                match top.right {
                    Expr::BinOp(right) => assert_eq!(right.op, BinOp::Mult),
                    other => panic!("expected BinOp, got {:?}", other),
                }
            }
            other => panic!("expected BinOp, got {:?}", other),
        }
    }

    #[test]
    fn test_left_associativity() {
        let arena = Arena::new();
        let handler = Handler::new();
        match parse(&arena, &handler, "a - b - c") {
            Expr::BinOp(top) => {
                assert_eq!(top.op, BinOp::Sub);
                assert!(matches!(top.left, Expr::BinOp(_)));
                assert!(matches!(top.right, Expr::Name(_)));
            }
            other => panic!("expected BinOp, got {:?}", other),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        let arena = Arena::new();
        let handler = Handler::new();
        match parse(&arena, &handler, "a ** b ** c") {
            Expr::BinOp(top) => {
                assert_eq!(top.op, BinOp::Pow);
                assert!(matches!(top.left, Expr::Name(_)));
                assert!(matches!(top.right, Expr::BinOp(_)));
            }
            other => panic!("expected BinOp, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_binds_looser_than_power() {
        let arena = Arena::new();
        let handler = Handler::new();
        // -2 ** 2 parses as -(2 ** 2)
        match parse(&arena, &handler, "-2 ** 2") {
            Expr::UnaryOp(u) => {
                assert_eq!(u.op, UnaryOpKind::USub);
                assert!(matches!(u.operand, Expr::BinOp(_)));
            }
            other => panic!("expected UnaryOp, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_chain() {
        let arena = Arena::new();
        let handler = Handler::new();
        match parse(&arena, &handler, "a < b <= c") {
            Expr::Compare(c) => {
                assert_eq!(c.ops, &[CmpOp::Lt, CmpOp::LtE]);
                assert_eq!(c.comparators.len(), 2);
            }
            other => panic!("expected Compare, got {:?}", other),
        }
    }

    #[test]
    fn test_not_in_and_is_not() {
        let arena = Arena::new();
        let handler = Handler::new();
        match parse(&arena, &handler, "a not in b") {
            Expr::Compare(c) => assert_eq!(c.ops, &[CmpOp::NotIn]),
            other => panic!("expected Compare, got {:?}", other),
        }
        match parse(&arena, &handler, "a is not b") {
            Expr::Compare(c) => assert_eq!(c.ops, &[CmpOp::IsNot]),
            other => panic!("expected Compare, got {:?}", other),
        }
    }

    #[test]
    fn test_bool_ops_and_not() {
        let arena = Arena::new();
        let handler = Handler::new();
        match parse(&arena, &handler, "not a or b and c") {
            Expr::BoolOp(top) => {
                assert_eq!(top.op, BoolOpKind::Or);
                assert!(matches!(top.values[0], Expr::UnaryOp(_)));
                assert!(matches!(top.values[1], Expr::BoolOp(_)));
            }
            other => panic!("expected BoolOp, got {:?}", other),
        }
    }

    #[test]
    fn test_ternary() {
        let arena = Arena::new();
        let handler = Handler::new();
        match parse(&arena, &handler, "a if t else b") {
            Expr::IfExp(e) => {
                assert!(matches!(e.test, Expr::Name(_)));
                assert!(matches!(e.body, Expr::Name(_)));
            }
            other => panic!("expected IfExp, got {:?}", other),
        }
    }

    #[test]
    fn test_call_attr_subscript() {
        let arena = Arena::new();
        let handler = Handler::new();
        match parse(&arena, &handler, "obj.method(1, x=2)[0]") {
            Expr::Subscript(sub) => {
                match sub.value {
                    Expr::Call(call) => {
                        assert_eq!(call.args.len(), 1);
                        assert_eq!(call.keywords.len(), 1);
                        assert_eq!(call.keywords[0].arg.as_str(), "x");
                        assert!(matches!(call.func, Expr::Attribute(_)));
                    }
                    other => panic!("expected Call, got {:?}", other),
                }
                assert!(matches!(
                    sub.index,
                    Expr::Constant(c) if c.value == ConstantValue::Int(0)
                ));
            }
            other => panic!("expected Subscript, got {:?}", other),
        }
    }

    #[test]
    fn test_slice() {
        let arena = Arena::new();
        let handler = Handler::new();
        match parse(&arena, &handler, "a[1:2]") {
            Expr::Subscript(sub) => match sub.index {
                Expr::Slice(s) => {
                    assert!(s.lower.is_some());
                    assert!(s.upper.is_some());
                    assert!(s.step.is_none());
                }
                other => panic!("expected Slice, got {:?}", other),
            },
            other => panic!("expected Subscript, got {:?}", other),
        }
    }

    #[test]
    fn test_displays() {
        let arena = Arena::new();
        let handler = Handler::new();
        assert!(matches!(parse(&arena, &handler, "[1, 2, 3]"), Expr::List(_)));
        assert!(matches!(parse(&arena, &handler, "(1, 2)"), Expr::Tuple(_)));
        assert!(matches!(parse(&arena, &handler, "{1, 2}"), Expr::Set(_)));
        assert!(matches!(
            parse(&arena, &handler, "{'a': 1, 'b': 2}"),
            Expr::Dict(_)
        ));
        assert!(matches!(parse(&arena, &handler, "{}"), Expr::Dict(_)));
        assert!(matches!(parse(&arena, &handler, "()"), Expr::Tuple(_)));
    }

    #[test]
    fn test_group_returns_inner_expression() {
        let arena = Arena::new();
        let handler = Handler::new();
        assert!(matches!(parse(&arena, &handler, "(a)"), Expr::Name(_)));
    }

    #[test]
    fn test_lambda() {
        let arena = Arena::new();
        let handler = Handler::new();
        match parse(&arena, &handler, "lambda x, y: x + y") {
            Expr::Lambda(l) => {
                assert_eq!(l.params.len(), 2);
                assert!(matches!(l.body, Expr::BinOp(_)));
            }
            other => panic!("expected Lambda, got {:?}", other),
        }
    }

    #[test]
    fn test_string_atom_re_enters_string_parser() {
        let arena = Arena::new();
        let handler = Handler::new();
        match parse(&arena, &handler, "'ab' + x") {
            Expr::BinOp(b) => {
                assert!(matches!(
                    b.left,
                    Expr::Constant(c) if c.value == ConstantValue::Str("ab")
                ));
            }
            other => panic!("expected BinOp, got {:?}", other),
        }
    }

    #[test]
    fn test_adjacent_strings_concatenate() {
        let arena = Arena::new();
        let handler = Handler::new();
        match parse(&arena, &handler, "\"ab\" \"cd\"") {
            Expr::Constant(c) => assert_eq!(c.value, ConstantValue::Str("abcd")),
            other => panic!("expected Constant, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_eof() {
        let arena = Arena::new();
        let handler = Handler::new();
        assert!(parse_expr_source("1 +", &arena, &handler, 8).is_none());
        assert!(handler.has_error_containing("unexpected end of input"));
    }

    #[test]
    fn test_positional_after_keyword_rejected() {
        let arena = Arena::new();
        let handler = Handler::new();
        assert!(parse_expr_source("f(x=1, 2)", &arena, &handler, 8).is_none());
        assert!(handler.has_error_containing("positional argument follows keyword argument"));
    }
}

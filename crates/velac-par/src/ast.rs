//! velac-par - AST Node Definitions
//!
//! Expression nodes for the Vela expression grammar. Nodes are allocated in
//! the parse's [`Arena`](velac_util::Arena) and reference each other by
//! `&'ast` pointers, so the whole tree has a single owner and no
//! destructors. Every node carries a [`Span`] in original-file coordinates,
//! including nodes that were parsed out of an f-string scratch buffer.

use velac_util::{Span, Symbol};

/// Expression
#[derive(Debug, Clone, Copy)]
pub enum Expr<'ast> {
    /// A constant value: text, bytes, number, bool, or none.
    Constant(ConstantExpr<'ast>),
    /// One `{expr}` piece of an f-string.
    FormattedValue(FormattedValueExpr<'ast>),
    /// An f-string: literal pieces interleaved with formatted values.
    JoinedStr(JoinedStrExpr<'ast>),
    /// A regex literal with trailing flags (`re"..."ims`).
    Regex(RegexExpr<'ast>),
    /// A name reference.
    Name(NameExpr),
    /// Binary arithmetic or bitwise operation.
    BinOp(BinOpExpr<'ast>),
    /// Unary operation.
    UnaryOp(UnaryOpExpr<'ast>),
    /// `and` / `or` chain.
    BoolOp(BoolOpExpr<'ast>),
    /// Comparison chain (`a < b <= c`).
    Compare(CompareExpr<'ast>),
    /// Function call.
    Call(CallExpr<'ast>),
    /// Attribute access (`value.attr`).
    Attribute(AttributeExpr<'ast>),
    /// Subscription (`value[index]`).
    Subscript(SubscriptExpr<'ast>),
    /// Slice, only valid directly inside a subscript.
    Slice(SliceExpr<'ast>),
    /// Tuple display.
    Tuple(SeqExpr<'ast>),
    /// List display.
    List(SeqExpr<'ast>),
    /// Set display.
    Set(SeqExpr<'ast>),
    /// Dict display.
    Dict(DictExpr<'ast>),
    /// Conditional expression (`a if test else b`).
    IfExp(IfExpExpr<'ast>),
    /// Anonymous function.
    Lambda(LambdaExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// The source span of this node.
    pub fn span(&self) -> Span {
        match self {
            Expr::Constant(e) => e.span,
            Expr::FormattedValue(e) => e.span,
            Expr::JoinedStr(e) => e.span,
            Expr::Regex(e) => e.span,
            Expr::Name(e) => e.span,
            Expr::BinOp(e) => e.span,
            Expr::UnaryOp(e) => e.span,
            Expr::BoolOp(e) => e.span,
            Expr::Compare(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Attribute(e) => e.span,
            Expr::Subscript(e) => e.span,
            Expr::Slice(e) => e.span,
            Expr::Tuple(e) => e.span,
            Expr::List(e) => e.span,
            Expr::Set(e) => e.span,
            Expr::Dict(e) => e.span,
            Expr::IfExp(e) => e.span,
            Expr::Lambda(e) => e.span,
        }
    }
}

/// The value payload of a [`ConstantExpr`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstantValue<'ast> {
    /// Decoded text.
    Str(&'ast str),
    /// Decoded bytes.
    Bytes(&'ast [u8]),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// The none value.
    None,
}

/// Constant expression
#[derive(Debug, Clone, Copy)]
pub struct ConstantExpr<'ast> {
    /// The constant's value.
    pub value: ConstantValue<'ast>,
    /// Literal kind: `Some("u")` for `u"..."` text, else `None`.
    pub kind: Option<Symbol>,
    pub span: Span,
}

/// Conversion applied to a formatted value (`!s`, `!r`, `!a`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// No conversion requested.
    None,
    /// `!s` - string rendering.
    Str,
    /// `!r` - repr rendering.
    Repr,
    /// `!a` - ASCII repr rendering.
    Ascii,
}

impl Conversion {
    /// Wire encoding: -1 for none, else the conversion character.
    pub fn as_int(self) -> i32 {
        match self {
            Conversion::None => -1,
            Conversion::Str => 's' as i32,
            Conversion::Repr => 'r' as i32,
            Conversion::Ascii => 'a' as i32,
        }
    }
}

/// One `{expr}` piece of an f-string
#[derive(Debug, Clone, Copy)]
pub struct FormattedValueExpr<'ast> {
    /// The embedded expression.
    pub value: &'ast Expr<'ast>,
    /// Conversion selected with `!`.
    pub conversion: Conversion,
    /// Format spec following `:`, itself a nested f-string parse.
    pub format_spec: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

/// F-string expression
#[derive(Debug, Clone, Copy)]
pub struct JoinedStrExpr<'ast> {
    /// Constant and FormattedValue pieces in source order. Adjacent
    /// constants are always merged before landing here.
    pub values: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

/// Regex literal
#[derive(Debug, Clone, Copy)]
pub struct RegexExpr<'ast> {
    /// The raw pattern text (no escape decoding beyond UTF-8).
    pub pattern: &'ast str,
    /// Flag characters following the closing quote.
    pub flags: &'ast str,
    pub span: Span,
}

/// Name expression
#[derive(Debug, Clone, Copy)]
pub struct NameExpr {
    /// The identifier.
    pub id: Symbol,
    pub span: Span,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

/// Binary expression
#[derive(Debug, Clone, Copy)]
pub struct BinOpExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinOp,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    UAdd,
    USub,
    Invert,
    Not,
}

/// Unary expression
#[derive(Debug, Clone, Copy)]
pub struct UnaryOpExpr<'ast> {
    pub op: UnaryOpKind,
    pub operand: &'ast Expr<'ast>,
    pub span: Span,
}

/// Boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOpKind {
    And,
    Or,
}

/// Boolean chain expression
#[derive(Debug, Clone, Copy)]
pub struct BoolOpExpr<'ast> {
    pub op: BoolOpKind,
    pub values: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

/// Comparison chain expression
#[derive(Debug, Clone, Copy)]
pub struct CompareExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    /// Operators, one per comparator.
    pub ops: &'ast [CmpOp],
    pub comparators: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

/// A keyword argument in a call.
#[derive(Debug, Clone, Copy)]
pub struct Keyword<'ast> {
    /// Argument name.
    pub arg: Symbol,
    /// Argument value.
    pub value: &'ast Expr<'ast>,
}

/// Call expression
#[derive(Debug, Clone, Copy)]
pub struct CallExpr<'ast> {
    pub func: &'ast Expr<'ast>,
    pub args: &'ast [&'ast Expr<'ast>],
    pub keywords: &'ast [Keyword<'ast>],
    pub span: Span,
}

/// Attribute access expression
#[derive(Debug, Clone, Copy)]
pub struct AttributeExpr<'ast> {
    pub value: &'ast Expr<'ast>,
    pub attr: Symbol,
    pub span: Span,
}

/// Subscription expression
#[derive(Debug, Clone, Copy)]
pub struct SubscriptExpr<'ast> {
    pub value: &'ast Expr<'ast>,
    pub index: &'ast Expr<'ast>,
    pub span: Span,
}

/// Slice expression
#[derive(Debug, Clone, Copy)]
pub struct SliceExpr<'ast> {
    pub lower: Option<&'ast Expr<'ast>>,
    pub upper: Option<&'ast Expr<'ast>>,
    pub step: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

/// Element sequence shared by tuple, list, and set displays.
#[derive(Debug, Clone, Copy)]
pub struct SeqExpr<'ast> {
    pub elts: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

/// Dict display expression
#[derive(Debug, Clone, Copy)]
pub struct DictExpr<'ast> {
    pub keys: &'ast [&'ast Expr<'ast>],
    pub values: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

/// Conditional expression
#[derive(Debug, Clone, Copy)]
pub struct IfExpExpr<'ast> {
    pub test: &'ast Expr<'ast>,
    pub body: &'ast Expr<'ast>,
    pub orelse: &'ast Expr<'ast>,
    pub span: Span,
}

/// Lambda expression
#[derive(Debug, Clone, Copy)]
pub struct LambdaExpr<'ast> {
    pub params: &'ast [Symbol],
    pub body: &'ast Expr<'ast>,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_wire_values() {
        assert_eq!(Conversion::None.as_int(), -1);
        assert_eq!(Conversion::Str.as_int(), 115);
        assert_eq!(Conversion::Repr.as_int(), 114);
        assert_eq!(Conversion::Ascii.as_int(), 97);
    }

    #[test]
    fn test_expr_span_accessor() {
        let span = Span::new(1, 5, 1, 2, 1, 6);
        let expr = Expr::Name(NameExpr {
            id: Symbol::intern("x"),
            span,
        });
        assert_eq!(expr.span(), span);
    }

    #[test]
    fn test_constant_value_equality() {
        assert_eq!(ConstantValue::Str("a"), ConstantValue::Str("a"));
        assert_ne!(
            ConstantValue::Str("a"),
            ConstantValue::Bytes(&[b'a'] as &[u8])
        );
    }
}

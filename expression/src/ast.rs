use diagnostics::ParseResult as Result;
use serde::Serialize;
use source::diagnostics::Span;

pub fn expr(kind: ExprKind, span: Span) -> Result<Expr> {
    Ok(Expr { kind, span })
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub enum Lit {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: Expr,
    /// `{ name }`, where the key doubles as a reference
    pub shorthand: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub enum ExprKind {
    Lit(Lit),
    Reference(Ident),
    Array(Vec<Expr>),
    Object(Vec<Property>),
    // `a.b` and `a?.b`
    Member(Box<Expr>, Ident),
    // `a[b]`
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Cond(Box<Expr>, Box<Expr>, Box<Expr>),
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Plus,
    Minus,
    Negate,
    Typeof,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equals,
    NotEquals,
    StrictEquals,
    StrictNotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
    And,
    Or,
    Nullish,
}

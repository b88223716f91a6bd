use std::fmt;

use serde::Serialize;

use crate::ast::{BinOp, UnOp};
use crate::precedence::Precedence;
use source::diagnostics::Span;

#[derive(Clone, Debug, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn precedence(&self) -> Precedence {
        use Precedence::{
            AND, COMPARE, CONDITIONAL, EQUALITY, NONE, NULLISH, OR, POSTFIX, PRODUCT, SUM,
        };
        use TokenKind::{
            And, DblEquals, Div, Dot, GreaterThan, GreaterThanEquals, LBrace, LParen, LessThan,
            LessThanEquals, Minus, Mod, Mul, NotDblEquals, NotEquals, Nullish, Or, Plus,
            Question, QuestionDot, TripleEquals,
        };
        match self.kind {
            LParen | LBrace | Dot | QuestionDot => POSTFIX,
            Mul | Div | Mod => PRODUCT,
            Plus | Minus => SUM,
            LessThan | LessThanEquals | GreaterThan | GreaterThanEquals => COMPARE,
            DblEquals | TripleEquals | NotEquals | NotDblEquals => EQUALITY,
            And => AND,
            Or => OR,
            Nullish => NULLISH,
            Question => CONDITIONAL,
            _ => NONE,
        }
    }

    /// Translate a token to a binary operator AST node
    pub fn to_bin_op(&self) -> Option<BinOp> {
        let op = match self.kind {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Mul => BinOp::Mul,
            TokenKind::Div => BinOp::Div,
            TokenKind::Mod => BinOp::Mod,
            TokenKind::DblEquals => BinOp::Equals,
            TokenKind::NotEquals => BinOp::NotEquals,
            TokenKind::TripleEquals => BinOp::StrictEquals,
            TokenKind::NotDblEquals => BinOp::StrictNotEquals,
            TokenKind::LessThan => BinOp::LessThan,
            TokenKind::LessThanEquals => BinOp::LessThanEquals,
            TokenKind::GreaterThan => BinOp::GreaterThan,
            TokenKind::GreaterThanEquals => BinOp::GreaterThanEquals,
            TokenKind::And => BinOp::And,
            TokenKind::Or => BinOp::Or,
            TokenKind::Nullish => BinOp::Nullish,
            _ => return None,
        };
        Some(op)
    }

    /// Translate a token to an unary operator AST node
    pub fn to_un_op(&self) -> Option<UnOp> {
        match self.kind {
            TokenKind::Plus => Some(UnOp::Plus),
            TokenKind::Minus => Some(UnOp::Minus),
            TokenKind::Exclaim => Some(UnOp::Negate),
            TokenKind::Reserved(Keyword::Typeof) => Some(UnOp::Typeof),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[inline]
pub fn token(kind: TokenKind, span: Span) -> Token {
    Token { kind, span }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub enum TokenKind {
    Number(f64),
    /// A string literal with its escapes already decoded
    Str(String),
    Ident(String),
    Reserved(Keyword),
    EOF,
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Exclaim,
    // `==`
    DblEquals,
    // `===`
    TripleEquals,
    // `!=`
    NotEquals,
    // `!==`
    NotDblEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
    // `&&`
    And,
    // `||`
    Or,
    // `??`
    Nullish,
    Question,
    // `?.`
    QuestionDot,
    Colon,
    Dot,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LCurlyBrace,
    RCurlyBrace,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let txt = match self {
            Number(n) => return write!(f, "{}", n),
            Str(s) => return write!(f, "{:?}", s),
            Ident(name) => return write!(f, "{}", name),
            Reserved(keyword) => return write!(f, "{}", keyword),
            EOF => "end of expression",
            Plus => "+",
            Minus => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Exclaim => "!",
            DblEquals => "==",
            TripleEquals => "===",
            NotEquals => "!=",
            NotDblEquals => "!==",
            LessThan => "<",
            LessThanEquals => "<=",
            GreaterThan => ">",
            GreaterThanEquals => ">=",
            And => "&&",
            Or => "||",
            Nullish => "??",
            Question => "?",
            QuestionDot => "?.",
            Colon => ":",
            Dot => ".",
            Comma => ",",
            LParen => "(",
            RParen => ")",
            LBrace => "[",
            RBrace => "]",
            LCurlyBrace => "{",
            RCurlyBrace => "}",
        };
        write!(f, "{}", txt)
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub enum Keyword {
    True,
    False,
    Null,
    Undefined,
    Typeof,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::Undefined => "undefined",
            Keyword::Typeof => "typeof",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

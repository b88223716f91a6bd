use std::fmt;

use serde::Serialize;

use crate::ast::{Attribute, Position};
use source::diagnostics::Span;

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based source line
    pub line: usize,
    pub span: Span,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[inline]
pub fn token(kind: TokenKind, line: usize, span: Span) -> Token {
    Token { kind, line, span }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub enum TokenKind {
    Doctype(String),
    Tag {
        name: String,
        self_closing: bool,
        inline: bool,
    },
    Class(String),
    Attrs {
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    /// Literal text, interpolation markers left in place
    Text(String),
    Comment {
        text: String,
        /// `//` comments are written to the output, `//-` comments aren't
        buffered: bool,
    },
    Block(String),
    Extends {
        reference: String,
        options: Vec<Attribute>,
    },
    Include {
        reference: String,
        options: Vec<Attribute>,
    },
    Replace {
        position: Position,
        block: String,
    },
    Case(String),
    When(String),
    Default,
    Each {
        value: String,
        key: Option<String>,
        expr: String,
    },
    While(String),
    If(String),
    Unless(String),
    ElseIf(String),
    Else,
    Indent(usize),
    Outdent,
    Newline,
    Eos,
}

impl TokenKind {
    /// The token's type name, as used in error messages.
    pub fn name(&self) -> &'static str {
        use TokenKind::*;
        match self {
            Doctype(_) => "doctype",
            Tag { .. } => "tag",
            Class(_) => "class",
            Attrs { .. } => "attrs",
            Text(_) => "text",
            Comment { .. } => "comment",
            Block(_) => "block",
            Extends { .. } => "extends",
            Include { .. } => "include",
            Replace { .. } => "replace",
            Case(_) => "case",
            When(_) => "when",
            Default => "default",
            Each { .. } => "each",
            While(_) => "while",
            If(_) => "if",
            Unless(_) => "unless",
            ElseIf(_) => "elseif",
            Else => "else",
            Indent(_) => "indent",
            Outdent => "outdent",
            Newline => "newline",
            Eos => "eos",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

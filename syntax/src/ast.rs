use serde::Serialize;
use source::diagnostics::Span;

use std::fmt;
use std::path::PathBuf;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Document {
    pub nodes: Vec<Node>,
    pub filename: Option<PathBuf>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub line: usize,
    pub span: Span,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum NodeKind {
    Doctype(String),
    Tag(Tag),
    Text(String),
    Comment { text: String, buffered: bool },
    Block(Block),
    Extends(Extends),
    Include(Include),
    Case(Case),
    If(If),
    While(While),
    Each(Each),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Doctype(_) => "doctype",
            NodeKind::Tag(_) => "tag",
            NodeKind::Text(_) => "text",
            NodeKind::Comment { .. } => "comment",
            NodeKind::Block(_) => "block",
            NodeKind::Extends(_) => "extends",
            NodeKind::Include(_) => "include",
            NodeKind::Case(_) => "case",
            NodeKind::If(_) => "if",
            NodeKind::While(_) => "while",
            NodeKind::Each(_) => "each",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub self_closing: bool,
    /// Inline tags are never indented when pretty-printing
    pub inline: bool,
    pub attrs: Vec<Attribute>,
    /// `.name` shorthands, in source order
    pub classes: Vec<String>,
    /// Text on the same line as the tag
    pub text: Option<String>,
    pub nodes: Vec<Node>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
    /// `false` for `name != value`, which skips HTML escaping
    pub escaped: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// A bare attribute name: `(checked)`
    Boolean,
    /// A quoted string; may still contain `#{}` / `!{}` interpolations
    Literal(String),
    /// Any other expression, kept as source text
    Expr(String),
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Before,
    Replace,
    After,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Position::Before => "before",
            Position::Replace => "replace",
            Position::After => "after",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub nodes: Vec<Node>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Extends {
    pub reference: String,
    pub options: Vec<Attribute>,
    pub replaces: Vec<Replace>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Replace {
    pub position: Position,
    pub block: String,
    pub nodes: Vec<Node>,
    pub line: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Include {
    pub reference: String,
    pub options: Vec<Attribute>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Case {
    pub expr: String,
    pub arms: Vec<CaseArm>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CaseArm {
    /// `None` for the `default` arm
    pub expr: Option<String>,
    pub nodes: Vec<Node>,
    pub line: usize,
}

/// An `if` / `unless` with its `else if` and `else` continuations.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct If {
    pub branches: Vec<Branch>,
    pub otherwise: Option<Vec<Node>>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Branch {
    pub expr: String,
    pub nodes: Vec<Node>,
    pub line: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct While {
    pub expr: String,
    pub nodes: Vec<Node>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Each {
    pub value: String,
    pub key: Option<String>,
    pub expr: String,
    pub nodes: Vec<Node>,
}

use syntax::ast::{self, Node, NodeKind};
use syntax::token::{Token, TokenKind};

use std::path::{Path, PathBuf};

use diagnostics::error::unexpected_token;
use diagnostics::ParseResult as Result;

use source::diagnostics::{Diagnostic, Span};

use log::debug;

pub struct Parser {
    /// The lexed template, always terminated by `Eos`
    tokens: Vec<Token>,
    /// Index of the next token
    pos: usize,
    /// The file being parsed, attached to every diagnostic
    filename: Option<PathBuf>,
}

trait DiagnosticReporting {
    fn fatal(&self, token: &Token, expected: &str) -> Diagnostic;
}

impl DiagnosticReporting for Parser {
    fn fatal(&self, token: &Token, expected: &str) -> Diagnostic {
        let diagnostic = unexpected_token(token.span, token.line, &token.kind, expected);
        match &self.filename {
            Some(filename) => diagnostic.in_file(filename),
            None => diagnostic,
        }
    }
}

/// Lex and parse `source` into a document.
pub fn parse(source: &str, filename: Option<&Path>) -> Result<ast::Document> {
    let tokens = lexer::tokenize(source).map_err(|err| match filename {
        Some(filename) => err.in_file(filename),
        None => err,
    })?;
    let mut parser = Parser::new(tokens);
    if let Some(filename) = filename {
        parser = parser.with_filename(filename);
    }
    parser.parse_document()
}

fn node(kind: NodeKind, token: &Token) -> Node {
    Node {
        kind,
        line: token.line,
        span: token.span,
    }
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        debug!("Parser::new with {} tokens", tokens.len());
        Parser {
            tokens,
            pos: 0,
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: &Path) -> Self {
        self.filename = Some(filename.to_path_buf());
        self
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> &TokenKind {
        self.peek().map_or(&TokenKind::Eos, |token| &token.kind)
    }

    fn next_token(&mut self) -> Token {
        match self.tokens.get(self.pos) {
            Some(token) => {
                self.pos += 1;
                debug!("next_token: {}", token.kind);
                token.clone()
            }
            None => {
                let span = self
                    .tokens
                    .last()
                    .map_or_else(|| Span::new(0, 0), |token| token.span);
                let line = self.tokens.last().map_or(1, |token| token.line);
                Token {
                    kind: TokenKind::Eos,
                    line,
                    span,
                }
            }
        }
    }

    fn skip_newlines(&mut self) {
        while *self.peek_kind() == TokenKind::Newline {
            self.pos += 1;
        }
    }

    fn unexpected(&mut self, expected: &str) -> Diagnostic {
        let token = self.next_token();
        self.fatal(&token, expected)
    }

    /// Root call for the parser; a document is a list of nodes ended by `Eos`.
    pub fn parse_document(&mut self) -> Result<ast::Document> {
        let mut nodes = vec![];
        loop {
            self.skip_newlines();
            if *self.peek_kind() == TokenKind::Eos {
                break;
            }
            nodes.push(self.parse_node()?);
        }
        Ok(ast::Document {
            nodes,
            filename: self.filename.clone(),
        })
    }

    /// Dispatch on the next token to the routine for its node kind.
    fn parse_node(&mut self) -> Result<Node> {
        debug!("parse_node: {}", self.peek_kind());
        match self.peek_kind() {
            TokenKind::Tag { .. } => self.parse_tag(),
            TokenKind::Text(_) => {
                let token = self.next_token();
                match token.kind {
                    TokenKind::Text(ref text) => Ok(node(NodeKind::Text(text.clone()), &token)),
                    _ => Err(self.fatal(&token, "text")),
                }
            }
            TokenKind::Doctype(_) | TokenKind::Comment { .. } => {
                let token = self.next_token();
                let kind = match token.kind.clone() {
                    TokenKind::Doctype(value) => NodeKind::Doctype(value),
                    TokenKind::Comment { text, buffered } => NodeKind::Comment { text, buffered },
                    _ => return Err(self.fatal(&token, "")),
                };
                Ok(node(kind, &token))
            }
            TokenKind::Block(_) => self.parse_block(),
            TokenKind::Extends { .. } => self.parse_extends(),
            TokenKind::Include { .. } => self.parse_include(),
            TokenKind::Case(_) => self.parse_case(),
            TokenKind::If(_) | TokenKind::Unless(_) => self.parse_if(),
            TokenKind::While(_) => self.parse_while(),
            TokenKind::Each { .. } => self.parse_each(),
            _ => Err(self.unexpected("")),
        }
    }

    /// The children of a node: an indented run of nodes closed by its
    /// outdent, or nothing when no indent follows.
    fn block_body(&mut self) -> Result<Vec<Node>> {
        if !matches!(self.peek_kind(), TokenKind::Indent(_)) {
            return Ok(vec![]);
        }
        self.next_token();
        let mut nodes = vec![];
        loop {
            match self.peek_kind() {
                TokenKind::Newline => self.pos += 1,
                TokenKind::Outdent => {
                    self.next_token();
                    break;
                }
                TokenKind::Eos => break,
                _ => nodes.push(self.parse_node()?),
            }
        }
        Ok(nodes)
    }

    fn parse_tag(&mut self) -> Result<Node> {
        let token = self.next_token();
        let (name, self_closing, inline) = match &token.kind {
            TokenKind::Tag {
                name,
                self_closing,
                inline,
            } => (name.clone(), *self_closing, *inline),
            _ => return Err(self.fatal(&token, "a tag")),
        };
        let mut tag = ast::Tag {
            name,
            self_closing,
            inline,
            attrs: vec![],
            classes: vec![],
            text: None,
            nodes: vec![],
        };
        loop {
            match self.peek_kind() {
                TokenKind::Class(class) => tag.classes.push(class.clone()),
                TokenKind::Attrs {
                    attrs,
                    self_closing,
                } => {
                    tag.attrs.extend(attrs.iter().cloned());
                    tag.self_closing |= *self_closing;
                }
                _ => break,
            }
            self.pos += 1;
        }
        if let TokenKind::Text(text) = self.peek_kind() {
            tag.text = Some(text.clone());
            self.pos += 1;
        }
        tag.nodes = self.block_body()?;
        Ok(node(NodeKind::Tag(tag), &token))
    }

    fn parse_block(&mut self) -> Result<Node> {
        let token = self.next_token();
        let name = match &token.kind {
            TokenKind::Block(name) => name.clone(),
            _ => return Err(self.fatal(&token, "block")),
        };
        let nodes = self.block_body()?;
        Ok(node(NodeKind::Block(ast::Block { name, nodes }), &token))
    }

    /// `extends` takes its `replace` nodes either indented beneath it or as
    /// the siblings that follow it.
    fn parse_extends(&mut self) -> Result<Node> {
        let token = self.next_token();
        let (reference, options) = match &token.kind {
            TokenKind::Extends { reference, options } => (reference.clone(), options.clone()),
            _ => return Err(self.fatal(&token, "extends")),
        };
        let mut replaces = vec![];
        if matches!(self.peek_kind(), TokenKind::Indent(_)) {
            self.next_token();
            loop {
                match self.peek_kind() {
                    TokenKind::Newline | TokenKind::Comment { .. } => self.pos += 1,
                    TokenKind::Replace { .. } => replaces.push(self.parse_replace()?),
                    TokenKind::Outdent => {
                        self.next_token();
                        break;
                    }
                    _ => return Err(self.unexpected("`replace`")),
                }
            }
        }
        loop {
            let mark = self.pos;
            while matches!(
                self.peek_kind(),
                TokenKind::Newline | TokenKind::Comment { buffered: false, .. }
            ) {
                self.pos += 1;
            }
            if matches!(self.peek_kind(), TokenKind::Replace { .. }) {
                replaces.push(self.parse_replace()?);
            } else {
                self.pos = mark;
                break;
            }
        }
        let extends = ast::Extends {
            reference,
            options,
            replaces,
        };
        Ok(node(NodeKind::Extends(extends), &token))
    }

    fn parse_replace(&mut self) -> Result<ast::Replace> {
        let token = self.next_token();
        match token.kind {
            TokenKind::Replace { position, block } => Ok(ast::Replace {
                position,
                block,
                nodes: self.block_body()?,
                line: token.line,
            }),
            _ => Err(self.fatal(&token, "`replace`")),
        }
    }

    fn parse_include(&mut self) -> Result<Node> {
        let token = self.next_token();
        match &token.kind {
            TokenKind::Include { reference, options } => {
                let include = ast::Include {
                    reference: reference.clone(),
                    options: options.clone(),
                };
                Ok(node(NodeKind::Include(include), &token))
            }
            _ => Err(self.fatal(&token, "include")),
        }
    }

    fn parse_case(&mut self) -> Result<Node> {
        let token = self.next_token();
        let expr = match &token.kind {
            TokenKind::Case(expr) => expr.clone(),
            _ => return Err(self.fatal(&token, "case")),
        };
        if !matches!(self.peek_kind(), TokenKind::Indent(_)) {
            return Err(self.unexpected("an indented block of `when` or `default`"));
        }
        self.next_token();
        let mut arms = vec![];
        let mut has_default = false;
        loop {
            match self.peek_kind() {
                TokenKind::Newline | TokenKind::Comment { .. } => self.pos += 1,
                TokenKind::Outdent => {
                    self.next_token();
                    break;
                }
                TokenKind::When(_) | TokenKind::Default => {
                    let arm_token = self.next_token();
                    let expr = match arm_token.kind {
                        TokenKind::When(ref expr) => Some(expr.clone()),
                        _ if has_default => {
                            return Err(self.fatal(&arm_token, "a single `default`"));
                        }
                        _ => {
                            has_default = true;
                            None
                        }
                    };
                    arms.push(ast::CaseArm {
                        expr,
                        nodes: self.block_body()?,
                        line: arm_token.line,
                    });
                }
                _ => return Err(self.unexpected("`when` or `default`")),
            }
        }
        Ok(node(NodeKind::Case(ast::Case { expr, arms }), &token))
    }

    fn parse_if(&mut self) -> Result<Node> {
        let token = self.next_token();
        let expr = match &token.kind {
            TokenKind::If(expr) => expr.clone(),
            TokenKind::Unless(expr) => format!("!({})", expr),
            _ => return Err(self.fatal(&token, "if")),
        };
        let mut branches = vec![ast::Branch {
            expr,
            nodes: self.block_body()?,
            line: token.line,
        }];
        let mut otherwise = None;
        loop {
            let mark = self.pos;
            self.skip_newlines();
            match self.peek_kind() {
                TokenKind::ElseIf(_) => {
                    let branch_token = self.next_token();
                    if let TokenKind::ElseIf(expr) = branch_token.kind {
                        branches.push(ast::Branch {
                            expr,
                            nodes: self.block_body()?,
                            line: branch_token.line,
                        });
                    }
                }
                TokenKind::Else => {
                    self.next_token();
                    otherwise = Some(self.block_body()?);
                    break;
                }
                _ => {
                    self.pos = mark;
                    break;
                }
            }
        }
        let if_node = ast::If {
            branches,
            otherwise,
        };
        Ok(node(NodeKind::If(if_node), &token))
    }

    fn parse_while(&mut self) -> Result<Node> {
        let token = self.next_token();
        match &token.kind {
            TokenKind::While(expr) => {
                let while_node = ast::While {
                    expr: expr.clone(),
                    nodes: self.block_body()?,
                };
                Ok(node(NodeKind::While(while_node), &token))
            }
            _ => Err(self.fatal(&token, "while")),
        }
    }

    fn parse_each(&mut self) -> Result<Node> {
        let token = self.next_token();
        match &token.kind {
            TokenKind::Each { value, key, expr } => {
                let each = ast::Each {
                    value: value.clone(),
                    key: key.clone(),
                    expr: expr.clone(),
                    nodes: self.block_body()?,
                };
                Ok(node(NodeKind::Each(each), &token))
            }
            _ => Err(self.fatal(&token, "each")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source::diagnostics::ErrorCode;
    use syntax::ast::{AttrValue, Position};

    fn parse_nodes(source: &str) -> Vec<Node> {
        parse(source, None).unwrap().nodes
    }

    fn tag(node: &Node) -> &ast::Tag {
        match &node.kind {
            NodeKind::Tag(tag) => tag,
            other => panic!("expected a tag, found {}", other.name()),
        }
    }

    #[test]
    fn tag_collects_classes_attrs_and_text() {
        let nodes = parse_nodes("a.btn(href=url).big#go Click\n  span");
        let a = tag(&nodes[0]);
        assert_eq!(a.name, "a");
        assert_eq!(a.classes, vec!["btn", "big"]);
        assert_eq!(a.attrs.len(), 2);
        assert_eq!(a.attrs[0].value, AttrValue::Expr("url".into()));
        assert_eq!(a.attrs[1].name, "id");
        assert_eq!(a.text.as_deref(), Some("Click"));
        assert_eq!(tag(&a.nodes[0]).name, "span");
    }

    #[test]
    fn nesting_follows_indentation() {
        let nodes = parse_nodes("ul\n  li\n    a\n  li\np");
        assert_eq!(nodes.len(), 2);
        let ul = tag(&nodes[0]);
        assert_eq!(ul.nodes.len(), 2);
        assert_eq!(tag(&ul.nodes[0]).nodes.len(), 1);
        assert_eq!(nodes[1].line, 5);
    }

    #[test]
    fn if_chains() {
        let nodes = parse_nodes("if a\n  p a\nelse if b\n  p b\n\nelse\n  p c\np after");
        assert_eq!(nodes.len(), 2);
        match &nodes[0].kind {
            NodeKind::If(if_node) => {
                assert_eq!(if_node.branches.len(), 2);
                assert_eq!(if_node.branches[1].expr, "b");
                assert_eq!(if_node.otherwise.as_ref().map(Vec::len), Some(1));
            }
            other => panic!("expected if, found {}", other.name()),
        }
    }

    #[test]
    fn unless_negates() {
        match &parse_nodes("unless ok\n  p")[0].kind {
            NodeKind::If(if_node) => assert_eq!(if_node.branches[0].expr, "!(ok)"),
            other => panic!("expected if, found {}", other.name()),
        }
    }

    #[test]
    fn case_arms() {
        let nodes = parse_nodes("case n\n  when 1\n    p one\n  //- other\n  default\n    p many");
        match &nodes[0].kind {
            NodeKind::Case(case) => {
                assert_eq!(case.expr, "n");
                assert_eq!(case.arms.len(), 2);
                assert_eq!(case.arms[0].expr.as_deref(), Some("1"));
                assert_eq!(case.arms[1].expr, None);
            }
            other => panic!("expected case, found {}", other.name()),
        }
    }

    #[test]
    fn case_rejects_other_children() {
        let err = parse("case n\n  p", None).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidToken));
        assert_eq!(err.line(), Some(2));
        let err = parse("case n\np", None).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidToken));
        let err = parse("case n\n  default\n  default", None).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidToken));
    }

    #[test]
    fn extends_with_sibling_replaces() {
        let nodes = parse_nodes("extends layout\n\nreplace title\n  | Hi\n//- note\nappend body\n  p");
        assert_eq!(nodes.len(), 1);
        match &nodes[0].kind {
            NodeKind::Extends(extends) => {
                assert_eq!(extends.reference, "layout");
                assert_eq!(extends.replaces.len(), 2);
                assert_eq!(extends.replaces[0].position, Position::Replace);
                assert_eq!(extends.replaces[1].position, Position::After);
                assert_eq!(extends.replaces[1].block, "body");
                assert_eq!(extends.replaces[1].line, 6);
            }
            other => panic!("expected extends, found {}", other.name()),
        }
    }

    #[test]
    fn extends_with_indented_replaces() {
        let nodes = parse_nodes("div\n  extends card\n    replace body\n      p\n  p");
        let div = tag(&nodes[0]);
        assert_eq!(div.nodes.len(), 2);
        match &div.nodes[0].kind {
            NodeKind::Extends(extends) => assert_eq!(extends.replaces.len(), 1),
            other => panic!("expected extends, found {}", other.name()),
        }
    }

    #[test]
    fn stray_tokens_are_rejected() {
        for source in &["else\n  p", "replace x", "when 1", "  p"] {
            let err = parse(source, None).unwrap_err();
            assert_eq!(err.code(), Some(ErrorCode::InvalidToken), "{}", source);
        }
    }

    #[test]
    fn errors_name_the_file() {
        let err = parse("else", Some(Path::new("views/a.made"))).unwrap_err();
        assert_eq!(err.filename(), Some(Path::new("views/a.made")));
        let err = parse("if (", Some(Path::new("views/b.made"))).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SyntaxError));
        assert_eq!(err.filename(), Some(Path::new("views/b.made")));
    }

    #[test]
    fn each_and_while() {
        let nodes = parse_nodes("each item, i in list\n  li #{item}\nwhile n < 3\n  p");
        match &nodes[0].kind {
            NodeKind::Each(each) => {
                assert_eq!(each.value, "item");
                assert_eq!(each.key.as_deref(), Some("i"));
                assert_eq!(each.expr, "list");
                assert_eq!(each.nodes.len(), 1);
            }
            other => panic!("expected each, found {}", other.name()),
        }
        assert!(matches!(nodes[1].kind, NodeKind::While(_)));
    }
}

use crate::attrs::AttrParser;
use crate::interpolation::{self, Segment};
use crate::scan::{parse_max, ScanError, ScanErrorKind};

use diagnostics::error as errors;
use diagnostics::ParseResult as Result;

use source::diagnostics::{ByteIndex, Diagnostic, ErrorCode, Span};
use syntax::ast::{AttrValue, Attribute, Position};
use syntax::tags;
use syntax::token::{token, Token, TokenKind};

use log::debug;

#[derive(PartialEq, Debug, Clone, Copy)]
enum IndentChar {
    Tab,
    Space,
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn span(start: usize, end: usize) -> Span {
    Span::new(ByteIndex(start as u32), ByteIndex(end as u32))
}

/// `\w` in the ASCII sense, as tag and class names use it.
fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Characters that can't follow a keyword for it to still be a keyword:
/// `include-nav` and `if:x` are tags, not directives.
fn is_name_char(ch: char) -> bool {
    is_word_char(ch) || ch == '-' || ch == ':'
}

fn is_block_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| is_word_char(ch) || ch == '-' || ch == '$' || ch == '.')
}

/// Length of a tag name at the start of `text`: `\w([-:\w]*\w)?`.
fn tag_name_len(text: &str) -> usize {
    match text.chars().next() {
        Some(ch) if is_word_char(ch) => {}
        _ => return 0,
    }
    let mut len = text
        .find(|ch: char| !is_name_char(ch))
        .unwrap_or_else(|| text.len());
    while len > 1 && !text[..len].ends_with(is_word_char) {
        len -= 1;
    }
    len
}

/// Length of a class or id name at the start of `text`.
fn class_name_len(text: &str) -> usize {
    text.find(|ch: char| !(is_word_char(ch) || ch == '-'))
        .unwrap_or_else(|| text.len())
}

/// Split an identifier off the front of `text`.
fn ident_prefix(text: &str) -> Option<(&str, &str)> {
    let first = text.chars().next()?;
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return None;
    }
    let len = text
        .find(|ch: char| !(is_word_char(ch) || ch == '$'))
        .unwrap_or_else(|| text.len());
    Some((&text[..len], &text[len..]))
}

fn indent_width(text: &str) -> usize {
    text.len() - text.trim_start_matches(|ch: char| ch == ' ' || ch == '\t').len()
}

pub(crate) fn scan_error(err: ScanError, base: usize, line: usize, text: &str) -> Diagnostic {
    let at = span(base + err.offset, base + err.offset);
    match err.kind {
        ScanErrorKind::BracketMismatch(open) => errors::bracket_mismatch(at, line, open),
        ScanErrorKind::UnterminatedString => errors::unterminated_string(at, line),
        ScanErrorKind::IncorrectNesting { .. } => errors::incorrect_nesting(at, line, text),
    }
}

/// Check that `expr` parses as an expression.
pub(crate) fn check_expression(expr: &str, base: usize, line: usize) -> Result<()> {
    expression::parse(expr).map(|_| ()).map_err(|err| {
        errors::syntax_error(span(base, base + expr.len()), line, expr.trim(), err.message)
    })
}

/// Check that every interpolation in `text` is closed and parses.
pub(crate) fn check_text(text: &str, base: usize, line: usize) -> Result<()> {
    let segments = interpolation::split(text).map_err(|err| scan_error(err, base, line, text))?;
    for segment in segments {
        if let Segment::Interpolation { expr, offset, .. } = segment {
            check_expression(&expr, base + offset, line)?;
        }
    }
    Ok(())
}

/// Split already lexed `text` into literal runs and interpolations.
pub fn segments(text: &str, line: usize) -> Result<Vec<Segment>> {
    interpolation::split(text).map_err(|err| scan_error(err, 0, line, text))
}

/// Turns template source into a flat token stream with explicit
/// `Indent`/`Outdent`/`Newline` structure. Lines that open with a directive
/// keyword are lexed as one token; everything else is a tag line.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    indent_stack: Vec<usize>,
    indent_char: Option<IndentChar>,
    /// Indentation width of the current line
    line_indent: usize,
    at_line_start: bool,
    tokens: Vec<Token>,
    ended: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            pos: 0,
            line: 1,
            indent_stack: vec![],
            indent_char: None,
            line_indent: 0,
            at_line_start: true,
            tokens: vec![],
            ended: false,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        self.start_line()?;
        while !self.ended {
            self.advance()?;
        }
        Ok(self.tokens)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn rest_of_line(&self) -> &'a str {
        let rest = self.rest();
        &rest[..rest.find('\n').unwrap_or_else(|| rest.len())]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn consume(&mut self, len: usize) {
        self.pos += len;
    }

    fn skip_spaces(&mut self) {
        let width = indent_width(self.rest());
        self.consume(width);
    }

    fn push_at(&mut self, kind: TokenKind, line: usize, start: usize) {
        debug!("token `{}` on line {}", kind, line);
        self.tokens.push(token(kind, line, span(start, self.pos)));
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.push_at(kind, self.line, start);
    }

    fn keyword(&self, word: &str) -> bool {
        let rest = self.rest();
        rest.starts_with(word)
            && rest[word.len()..]
                .chars()
                .next()
                .map_or(true, |ch| !is_name_char(ch))
    }

    fn error(&self, code: ErrorCode, message: String, start: usize) -> Diagnostic {
        errors::lex_error(code, message, span(start, self.pos.max(start)), self.line)
    }

    fn unexpected_text(&self) -> Diagnostic {
        let text = self.rest_of_line();
        errors::lex_error(
            ErrorCode::UnexpectedText,
            format!("Unexpected text `{}`", text.trim()),
            span(self.pos, self.pos + text.len()),
            self.line,
        )
    }

    fn eos(&mut self) -> bool {
        if self.pos < self.source.len() {
            return false;
        }
        let start = self.pos;
        for _ in 0..self.indent_stack.len() {
            self.push(TokenKind::Outdent, start);
        }
        self.indent_stack.clear();
        self.push(TokenKind::Eos, start);
        self.ended = true;
        true
    }

    fn advance(&mut self) -> Result<()> {
        if self.eos() {
            return Ok(());
        }
        if self.peek_char() == Some('\n') {
            self.consume(1);
            self.line += 1;
            return self.start_line();
        }
        if self.at_line_start {
            self.at_line_start = false;
            if self.line_keyword()? || self.tag()? {
                return Ok(());
            }
        }
        Err(self.unexpected_text())
    }

    /// Measure the indentation of the line at `pos`, skipping blank lines,
    /// and emit the structural tokens for it.
    fn start_line(&mut self) -> Result<()> {
        let width = loop {
            let rest = self.rest();
            let width = indent_width(rest);
            let after = &rest[width..];
            if after.is_empty() {
                self.consume(width);
                return Ok(());
            }
            if after.starts_with('\n') {
                self.consume(width + 1);
                self.line += 1;
                continue;
            }
            break width;
        };
        let start = self.pos;
        let whitespace = &self.rest()[..width];
        let (tabs, spaces) = (whitespace.contains('\t'), whitespace.contains(' '));
        self.consume(width);
        if tabs && spaces {
            return Err(errors::invalid_indentation(span(start, self.pos), self.line));
        }
        if width > 0 {
            let used = if tabs { IndentChar::Tab } else { IndentChar::Space };
            match self.indent_char {
                None => self.indent_char = Some(used),
                Some(expected) if expected != used => {
                    return Err(errors::invalid_indentation(span(start, self.pos), self.line));
                }
                Some(_) => {}
            }
        }
        self.line_indent = width;
        self.at_line_start = true;

        let top = self.indent_stack.last().copied().unwrap_or(0);
        if width > top {
            self.indent_stack.push(width);
            self.push(TokenKind::Indent(width), start);
        } else if width < top {
            while let Some(&open) = self.indent_stack.last() {
                if open <= width {
                    break;
                }
                self.indent_stack.pop();
                self.push(TokenKind::Outdent, start);
            }
            let open = self.indent_stack.last().copied().unwrap_or(0);
            if open != width {
                return Err(errors::inconsistent_indentation(
                    span(start, self.pos),
                    self.line,
                    width,
                    open,
                ));
            }
        } else if !self.tokens.is_empty() {
            self.push(TokenKind::Newline, start);
        }
        Ok(())
    }

    /// Consume the lines indented deeper than the current one, stripping the
    /// indentation of the first. Blank lines between them are kept empty.
    fn block_lines(&mut self) -> Vec<String> {
        let base = self.line_indent;
        let mut lines = vec![];
        let mut strip = None;
        let mut blanks = 0;
        let mut cursor = self.pos;
        let mut line = self.line;
        while self.source[cursor..].starts_with('\n') {
            let line_start = cursor + 1;
            let line_end = self.source[line_start..]
                .find('\n')
                .map_or(self.source.len(), |i| line_start + i);
            let content = &self.source[line_start..line_end];
            line += 1;
            cursor = line_end;
            if content.trim().is_empty() {
                blanks += 1;
                continue;
            }
            let width = indent_width(content);
            if width <= base {
                break;
            }
            let cut = width.min(*strip.get_or_insert(width));
            lines.extend(std::iter::repeat(String::new()).take(blanks));
            blanks = 0;
            lines.push(content[cut..].to_string());
            self.pos = line_end;
            self.line = line;
        }
        lines
    }

    /// `(...)` at `pos`. Returns the attributes and the line they start on.
    fn attrs_block(&mut self) -> Result<(Vec<Attribute>, usize)> {
        let open = self.pos;
        let line = self.line;
        let end = parse_max(self.source, open + 1, '(').map_err(|err| {
            let text = &self.source[open..];
            let text = &text[..text.find('\n').unwrap_or_else(|| text.len())];
            scan_error(
                ScanError {
                    offset: err.offset - open,
                    ..err
                },
                open,
                line,
                text,
            )
        })?;
        let inner = &self.source[open + 1..end];
        let attrs = AttrParser::new(inner, open + 1, line).parse()?;
        self.line += inner.matches('\n').count();
        self.pos = end + 1;
        Ok((attrs, line))
    }

    fn line_keyword(&mut self) -> Result<bool> {
        let start = self.pos;
        let text = self.rest_of_line();

        if self.keyword("doctype") {
            let value = text["doctype".len()..].trim();
            let value = if value.is_empty() { "html" } else { value };
            self.consume(text.len());
            self.push(TokenKind::Doctype(value.to_string()), start);
        } else if self.keyword("case") {
            let expr = self.keyword_expression("case")?;
            self.push(TokenKind::Case(expr), start);
        } else if self.keyword("when") {
            let expr = self.keyword_expression("when")?;
            self.push(TokenKind::When(expr), start);
        } else if self.keyword("default") {
            self.bare_keyword("default")?;
            self.push(TokenKind::Default, start);
        } else if self.keyword("extends") || self.keyword("extend") {
            let word = if self.keyword("extends") { "extends" } else { "extend" };
            let (reference, options) = self.module_reference(word)?;
            self.push(TokenKind::Extends { reference, options }, start);
        } else if self.keyword("include") {
            let (reference, options) = self.module_reference("include")?;
            self.push(TokenKind::Include { reference, options }, start);
        } else if self.keyword("replace") {
            self.consume("replace".len());
            self.skip_spaces();
            let position = self.position_word().unwrap_or(Position::Replace);
            self.replace(position, start)?;
        } else if self.keyword("append") {
            self.consume("append".len());
            self.replace(Position::After, start)?;
        } else if self.keyword("prepend") {
            self.consume("prepend".len());
            self.replace(Position::Before, start)?;
        } else if self.keyword("block") {
            self.consume("block".len());
            self.skip_spaces();
            match self.position_word() {
                Some(position) => self.replace(position, start)?,
                None => {
                    let name = self.block_name()?;
                    self.push(TokenKind::Block(name), start);
                }
            }
        } else if self.keyword("if") {
            let expr = self.keyword_expression("if")?;
            self.push(TokenKind::If(expr), start);
        } else if self.keyword("unless") {
            let expr = self.keyword_expression("unless")?;
            self.push(TokenKind::Unless(expr), start);
        } else if self.keyword("elseif") {
            let expr = self.keyword_expression("elseif")?;
            self.push(TokenKind::ElseIf(expr), start);
        } else if self.keyword("else") {
            self.consume("else".len());
            self.skip_spaces();
            if self.keyword("if") {
                let expr = self.keyword_expression("if")?;
                self.push(TokenKind::ElseIf(expr), start);
            } else {
                self.bare_keyword("")?;
                self.push(TokenKind::Else, start);
            }
        } else if self.keyword("while") {
            let expr = self.keyword_expression("while")?;
            self.push(TokenKind::While(expr), start);
        } else if self.keyword("each") || self.keyword("for") {
            let word = if self.keyword("each") { "each" } else { "for" };
            let kind = self.each(word)?;
            self.push(kind, start);
        } else if text.starts_with("//") {
            self.comment(start);
        } else if text.starts_with('|') {
            self.consume(1);
            if self.peek_char() == Some(' ') {
                self.consume(1);
            }
            let text_start = self.pos;
            let text = self.rest_of_line();
            self.consume(text.len());
            check_text(text, text_start, self.line)?;
            self.push(TokenKind::Text(text.to_string()), start);
        } else {
            return Ok(false);
        }
        Ok(true)
    }

    /// The rest of a directive line after `word`, which must be a valid
    /// expression.
    fn keyword_expression(&mut self, word: &str) -> Result<String> {
        let start = self.pos;
        self.consume(word.len());
        self.skip_spaces();
        let expr_start = self.pos;
        let expr = self.rest_of_line().trim_end();
        self.consume(self.rest_of_line().len());
        if expr.is_empty() {
            return Err(self.error(
                ErrorCode::SyntaxError,
                format!("Syntax Error in `{}`: missing expression", word),
                start,
            ));
        }
        check_expression(expr, expr_start, self.line)?;
        Ok(expr.to_string())
    }

    /// A directive that takes nothing after it.
    fn bare_keyword(&mut self, word: &str) -> Result<()> {
        self.consume(word.len());
        self.skip_spaces();
        if self.rest_of_line().trim().is_empty() {
            self.consume(self.rest_of_line().len());
            Ok(())
        } else {
            Err(self.unexpected_text())
        }
    }

    fn position_word(&mut self) -> Option<Position> {
        let position = if self.keyword("before") || self.keyword("prepend") {
            Position::Before
        } else if self.keyword("after") || self.keyword("append") {
            Position::After
        } else if self.keyword("replace") {
            Position::Replace
        } else {
            return None;
        };
        let word = self.rest().split_whitespace().next().unwrap_or("");
        // `block before` on its own names a block called `before`
        if self.rest_of_line()[word.len()..].trim().is_empty() {
            return None;
        }
        self.consume(word.len());
        Some(position)
    }

    fn block_name(&mut self) -> Result<String> {
        self.skip_spaces();
        let start = self.pos;
        let name = self.rest_of_line().trim();
        self.consume(self.rest_of_line().len());
        if is_block_name(name) {
            Ok(name.to_string())
        } else {
            Err(self.error(
                ErrorCode::InvalidBlockName,
                format!("Invalid block name `{}`", name),
                start,
            ))
        }
    }

    fn replace(&mut self, position: Position, start: usize) -> Result<()> {
        let block = self.block_name()?;
        self.push(TokenKind::Replace { position, block }, start);
        Ok(())
    }

    fn module_reference(&mut self, word: &str) -> Result<(String, Vec<Attribute>)> {
        let start = self.pos;
        self.consume(word.len());
        self.skip_spaces();
        let mut options = vec![];
        if self.peek_char() == Some('(') {
            options = self.attrs_block()?.0;
            self.skip_spaces();
        }
        let reference = self.rest_of_line().trim().to_string();
        self.consume(self.rest_of_line().len());
        if reference.is_empty() {
            return Err(self.error(
                ErrorCode::MissingModuleReference,
                format!("Missing module reference for `{}`", word),
                start,
            ));
        }
        Ok((reference, options))
    }

    fn each(&mut self, word: &str) -> Result<TokenKind> {
        let start = self.pos;
        self.consume(word.len());
        self.skip_spaces();
        let text = self.rest_of_line();
        self.consume(text.len());
        let malformed = || {
            self.error(
                ErrorCode::SyntaxError,
                format!(
                    "Syntax Error in `{}`: expected `{} value[, key] in expression`",
                    text.trim(),
                    word
                ),
                start,
            )
        };

        let (value, rest) = ident_prefix(text).ok_or_else(malformed)?;
        let mut rest = rest.trim_start();
        let mut key = None;
        if let Some(after_comma) = rest.strip_prefix(',') {
            let (name, after) = ident_prefix(after_comma.trim_start()).ok_or_else(malformed)?;
            key = Some(name.to_string());
            rest = after.trim_start();
        }
        let expr = match rest.strip_prefix("in") {
            Some(expr) if expr.starts_with(|ch: char| ch == ' ' || ch == '\t') => expr.trim(),
            _ => return Err(malformed()),
        };
        if expr.is_empty() {
            return Err(malformed());
        }
        let expr_start = self.pos - text.len() + (text.len() - rest.len()) + 2;
        check_expression(expr, expr_start, self.line)?;
        Ok(TokenKind::Each {
            value: value.to_string(),
            key,
            expr: expr.to_string(),
        })
    }

    fn comment(&mut self, start: usize) {
        let line = self.line;
        let text = self.rest_of_line();
        let buffered = !text.starts_with("//-");
        let marker = if buffered { 2 } else { 3 };
        let mut text = text[marker..].to_string();
        self.consume(self.rest_of_line().len());
        for nested in self.block_lines() {
            text.push('\n');
            text.push_str(&nested);
        }
        self.push_at(TokenKind::Comment { text, buffered }, line, start);
    }

    fn tag(&mut self) -> Result<bool> {
        let start = self.pos;
        let rest = self.rest();
        let len = tag_name_len(rest);
        if len > 0 {
            let name = &rest[..len];
            self.consume(len);
            let mut self_closing = tags::is_self_closing(name);
            if self.peek_char() == Some('/') {
                self.consume(1);
                self_closing = true;
            }
            let kind = TokenKind::Tag {
                name: name.to_string(),
                self_closing,
                inline: tags::is_inline(name),
            };
            self.push(kind, start);
        } else if (rest.starts_with('.') || rest.starts_with('#'))
            && class_name_len(&rest[1..]) > 0
        {
            let kind = TokenKind::Tag {
                name: "div".to_string(),
                self_closing: false,
                inline: false,
            };
            self.push(kind, start);
        } else {
            return Ok(false);
        }
        self.tag_tail()?;
        Ok(true)
    }

    fn mark_self_closing(&mut self) {
        match self.tokens.last_mut().map(|token| &mut token.kind) {
            Some(TokenKind::Tag { self_closing, .. }) | Some(TokenKind::Attrs { self_closing, .. }) => {
                *self_closing = true;
            }
            _ => {}
        }
    }

    /// Classes, ids, attribute lists and trailing text after a tag name.
    fn tag_tail(&mut self) -> Result<()> {
        loop {
            let start = self.pos;
            let rest = self.rest();
            match self.peek_char() {
                None | Some('\n') => return Ok(()),
                Some('.') => {
                    let len = class_name_len(&rest[1..]);
                    if len > 0 {
                        self.consume(1 + len);
                        self.push(TokenKind::Class(rest[1..=len].to_string()), start);
                    } else if rest[1..].trim_start_matches(' ').starts_with('\n')
                        || rest[1..].trim().is_empty()
                    {
                        self.consume(self.rest_of_line().len());
                        return self.text_block();
                    } else {
                        return Err(self.unexpected_text());
                    }
                }
                Some('#') => {
                    let len = class_name_len(&rest[1..]);
                    if len == 0 {
                        return Err(self.unexpected_text());
                    }
                    self.consume(1 + len);
                    let id = Attribute {
                        name: "id".to_string(),
                        value: AttrValue::Literal(rest[1..=len].to_string()),
                        escaped: true,
                    };
                    self.push(
                        TokenKind::Attrs {
                            attrs: vec![id],
                            self_closing: false,
                        },
                        start,
                    );
                }
                Some('(') => {
                    let (attrs, line) = self.attrs_block()?;
                    let kind = TokenKind::Attrs {
                        attrs,
                        self_closing: false,
                    };
                    self.push_at(kind, line, start);
                }
                Some('/') => {
                    self.consume(1);
                    self.mark_self_closing();
                }
                Some(' ') | Some('\t') => {
                    let text = &self.rest_of_line()[1..];
                    self.consume(self.rest_of_line().len());
                    if !text.trim().is_empty() {
                        check_text(text, start + 1, self.line)?;
                        self.push(TokenKind::Text(text.to_string()), start);
                    }
                    return Ok(());
                }
                Some(_) => return Err(self.unexpected_text()),
            }
        }
    }

    /// The indented lines after a tag ending in `.` are its text.
    fn text_block(&mut self) -> Result<()> {
        let start = self.pos;
        let line = self.line + 1;
        let lines = self.block_lines();
        if lines.is_empty() {
            return Ok(());
        }
        let text = lines.join("\n");
        check_text(&text, start + 1, line)?;
        self.push_at(TokenKind::Text(text), line, start);
        Ok(())
    }
}

/// Lex a template. Line endings are normalized and a byte order mark is
/// dropped before lexing, so spans index the normalized text.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let normalized = source::normalize(source);
    Lexer::new(&normalized).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use syntax::ast::{AttrValue, Attribute};
    use TokenKind::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn code(source: &str) -> Option<ErrorCode> {
        tokenize(source).unwrap_err().code()
    }

    fn tag(name: &str) -> TokenKind {
        Tag {
            name: name.to_string(),
            self_closing: tags::is_self_closing(name),
            inline: tags::is_inline(name),
        }
    }

    #[test]
    fn nested_tags() {
        assert_eq!(
            kinds("ul\n  li one\n  li two\np"),
            vec![
                tag("ul"),
                Indent(2),
                tag("li"),
                Text("one".into()),
                Newline,
                tag("li"),
                Text("two".into()),
                Outdent,
                tag("p"),
                Eos,
            ]
        );
    }

    #[test]
    fn outdents_close_at_end_of_input() {
        assert_eq!(
            kinds("div\n  div\n    span\n\n"),
            vec![
                tag("div"),
                Indent(2),
                tag("div"),
                Indent(4),
                tag("span"),
                Outdent,
                Outdent,
                Eos
            ]
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(kinds("p\n\n   \np"), vec![tag("p"), Newline, tag("p"), Eos]);
    }

    #[test]
    fn classes_ids_and_attributes() {
        let tokens = kinds(r#"a.btn#go(href="/x", disabled) Go"#);
        assert_eq!(tokens[0], tag("a"));
        assert_eq!(tokens[1], Class("btn".into()));
        assert_eq!(
            tokens[2],
            Attrs {
                attrs: vec![Attribute {
                    name: "id".into(),
                    value: AttrValue::Literal("go".into()),
                    escaped: true,
                }],
                self_closing: false,
            }
        );
        match &tokens[3] {
            Attrs { attrs, .. } => assert_eq!(attrs.len(), 2),
            other => panic!("expected attributes, found {:?}", other),
        }
        assert_eq!(tokens[4], Text("Go".into()));
    }

    #[test]
    fn implicit_div() {
        assert_eq!(
            kinds(".card"),
            vec![tag("div"), Class("card".into()), Eos]
        );
    }

    #[test]
    fn self_closing_marker() {
        assert_eq!(
            kinds("foo/"),
            vec![
                Tag {
                    name: "foo".into(),
                    self_closing: true,
                    inline: false
                },
                Eos
            ]
        );
        assert_eq!(kinds("br")[0], tag("br"));
    }

    #[test]
    fn text_blocks_keep_relative_indentation() {
        assert_eq!(
            kinds("script.\n  if (a) {\n    b()\n\n  }\np"),
            vec![
                tag("script"),
                Text("if (a) {\n  b()\n\n}".into()),
                Newline,
                tag("p"),
                Eos
            ]
        );
    }

    #[test]
    fn piped_text_and_comments() {
        assert_eq!(
            kinds("| hello #{name}\n// note\n//- hidden"),
            vec![
                Text("hello #{name}".into()),
                Newline,
                Comment {
                    text: " note".into(),
                    buffered: true
                },
                Newline,
                Comment {
                    text: " hidden".into(),
                    buffered: false
                },
                Eos
            ]
        );
    }

    #[test]
    fn directives() {
        assert_eq!(
            kinds("doctype\nif a > 1\nelse if b\nelse\nunless c\neach item, i in items\nwhile n < 3"),
            vec![
                Doctype("html".into()),
                Newline,
                If("a > 1".into()),
                Newline,
                ElseIf("b".into()),
                Newline,
                Else,
                Newline,
                Unless("c".into()),
                Newline,
                Each {
                    value: "item".into(),
                    key: Some("i".into()),
                    expr: "items".into()
                },
                Newline,
                While("n < 3".into()),
                Eos
            ]
        );
    }

    #[test]
    fn keywords_need_a_boundary() {
        assert_eq!(kinds("include-nav")[0], tag("include-nav"));
        assert_eq!(kinds("iframe")[0], tag("iframe"));
    }

    #[test]
    fn inheritance_directives() {
        assert_eq!(
            kinds("extends layout\nreplace after title\nappend body\nblock prepend head\nblock main"),
            vec![
                Extends {
                    reference: "layout".into(),
                    options: vec![]
                },
                Newline,
                Replace {
                    position: Position::After,
                    block: "title".into()
                },
                Newline,
                Replace {
                    position: Position::After,
                    block: "body".into()
                },
                Newline,
                Replace {
                    position: Position::Before,
                    block: "head".into()
                },
                Newline,
                Block("main".into()),
                Eos
            ]
        );
    }

    #[test]
    fn include_with_options() {
        match &kinds(r#"include(title="Hi") nav:main"#)[0] {
            Include { reference, options } => {
                assert_eq!(reference, "nav:main");
                assert_eq!(options[0].name, "title");
            }
            other => panic!("expected include, found {:?}", other),
        }
    }

    #[test]
    fn crlf_input_is_normalized() {
        assert_eq!(kinds("p\r\n  a\r\n"), vec![tag("p"), Indent(2), tag("a"), Outdent, Eos]);
    }

    #[test]
    fn lines_are_tracked() {
        let tokens = tokenize("p\n\ndiv\n  span").unwrap();
        let lines: Vec<usize> = tokens.iter().map(|token| token.line).collect();
        assert_eq!(lines, vec![1, 3, 3, 4, 4, 4, 4]);
    }

    #[test]
    fn indentation_errors() {
        assert_eq!(code("div\n\t span"), Some(ErrorCode::InvalidIndentation));
        assert_eq!(code("div\n  a\n\tb"), Some(ErrorCode::InvalidIndentation));
        assert_eq!(code("div\n    a\n  b"), Some(ErrorCode::InconsistentIndentation));
    }

    #[test]
    fn bracket_errors() {
        assert_eq!(code("a(href=(x)"), Some(ErrorCode::BracketMismatch));
        assert_eq!(code("a(href=x])"), Some(ErrorCode::IncorrectNesting));
        assert_eq!(code(r#"a(href="x)"#), Some(ErrorCode::UnterminatedString));
        assert_eq!(code("p #{a"), Some(ErrorCode::BracketMismatch));
    }

    #[test]
    fn directive_errors() {
        assert_eq!(code("extends"), Some(ErrorCode::MissingModuleReference));
        assert_eq!(code("block a b"), Some(ErrorCode::InvalidBlockName));
        assert_eq!(code("else nope"), Some(ErrorCode::UnexpectedText));
        assert_eq!(code("if a +"), Some(ErrorCode::SyntaxError));
        assert_eq!(code("each in items"), Some(ErrorCode::SyntaxError));
        assert_eq!(code("p #{1 +}"), Some(ErrorCode::SyntaxError));
        assert_eq!(code("p.a%"), Some(ErrorCode::UnexpectedText));
    }
}

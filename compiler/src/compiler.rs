use crate::bindings;
use crate::module::{self, ResolvedModule};
use crate::options::Options;
use crate::transform::TransformTarget;
use crate::Session;

use codegen::{
    Branch, CaseArm, Dependency, DependencyKind, Format, Instruction, OptionEntry, OptionValue,
    Override, Part, Program,
};
use data_structures::find_similar;
use diagnostics::ParseResult as Result;
use lexer::interpolation::{is_plain, Segment};
use source::diagnostics::{Diagnostic, ErrorCode};
use syntax::ast::{
    AttrValue, Attribute, Block, Document, Extends, Include, Node, NodeKind, Position, Tag,
};
use syntax::visitor::{walk_nodes, Visitor};

use log::{debug, info, trace};

use std::mem;
use std::path::PathBuf;

/// Collects pending literal text so that no two `Text` instructions are
/// ever adjacent.
#[derive(Default)]
struct Builder {
    instructions: Vec<Instruction>,
    text: String,
}

impl Builder {
    fn text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn flush(&mut self) {
        if !self.text.is_empty() {
            let text = mem::take(&mut self.text);
            trace!("emit text {:?}", text);
            self.instructions.push(Instruction::Text(text));
        }
    }

    fn push(&mut self, instruction: Instruction) {
        self.flush();
        trace!("emit {:?}", instruction);
        self.instructions.push(instruction);
    }

    fn finish(mut self) -> Vec<Instruction> {
        self.flush();
        self.instructions
    }
}

/// Appends `body` to `into`, merging the literal text at the seam.
fn concat(into: &mut Vec<Instruction>, body: Vec<Instruction>) {
    for instruction in body {
        if let Instruction::Text(text) = &instruction {
            if let Some(Instruction::Text(last)) = into.last_mut() {
                last.push_str(text);
                continue;
            }
        }
        into.push(instruction);
    }
}

/// Every block declared while compiling one file, replace bodies included.
#[derive(Default)]
struct BlockTable {
    names: Vec<String>,
    duplicate: Option<(String, usize)>,
}

impl Visitor for BlockTable {
    fn visit_block(&mut self, block: &Block, line: usize) {
        if self.names.contains(&block.name) {
            if self.duplicate.is_none() {
                self.duplicate = Some((block.name.clone(), line));
            }
        } else {
            self.names.push(block.name.clone());
        }
        walk_nodes(self, &block.nodes);
    }
}

/// Compiles one template file. `extends` and `include` targets get a fresh
/// compiler of their own.
pub(crate) struct Compiler<'s> {
    session: &'s Session,
    options: Options,
    sid: String,
    /// Files currently being compiled, outermost first, this one included
    chain: Vec<PathBuf>,
    out: Builder,
    indent: String,
}

impl<'s> Compiler<'s> {
    pub(crate) fn new(session: &'s Session, options: Options, chain: Vec<PathBuf>) -> Self {
        let sid = module::scope_id(options.filename.as_deref(), &options.instance);
        let indent = options.indent.clone();
        Compiler {
            session,
            options,
            sid,
            chain,
            out: Builder::default(),
            indent,
        }
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>, line: usize) -> Diagnostic {
        self.locate(
            Diagnostic::error()
                .with_code(code)
                .with_message(message)
                .with_line(line),
        )
    }

    fn locate(&self, diagnostic: Diagnostic) -> Diagnostic {
        match &self.options.filename {
            Some(filename) => diagnostic.in_file(filename),
            None => diagnostic,
        }
    }

    pub(crate) fn compile(mut self, document: &Document) -> Result<Program> {
        info!(
            "compiling {} as `{}`",
            self.options
                .filename
                .as_ref()
                .map_or_else(|| "template".into(), |filename| filename.display().to_string()),
            self.options.instance
        );
        let mut table = BlockTable::default();
        table.visit_document(document);
        if let Some((name, line)) = table.duplicate {
            return Err(self.error(
                ErrorCode::DuplicateBlock,
                format!("Block \"{}\" is declared more than once", name),
                line,
            ));
        }
        self.nodes(&document.nodes)?;
        let instructions = mem::take(&mut self.out).finish();
        let free_identifiers =
            bindings::free_identifiers(&instructions).map_err(|err| self.locate(err))?;
        Ok(Program {
            filename: self.options.filename,
            sid: self.sid,
            instance: self.options.instance,
            instructions,
            blocks: table.names,
            free_identifiers,
        })
    }

    fn nodes(&mut self, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            self.node(node)?;
        }
        Ok(())
    }

    /// Compile `nodes` into a separate instruction list.
    fn body(&mut self, nodes: &[Node]) -> Result<Vec<Instruction>> {
        let outer = mem::take(&mut self.out);
        self.nodes(nodes)?;
        Ok(mem::replace(&mut self.out, outer).finish())
    }

    /// Like `body`, one indentation level deeper.
    fn nested_body(&mut self, nodes: &[Node]) -> Result<Vec<Instruction>> {
        self.indent.push_str("  ");
        let body = self.body(nodes)?;
        self.indent.truncate(self.indent.len() - 2);
        Ok(body)
    }

    fn node(&mut self, node: &Node) -> Result<()> {
        let line = node.line;
        match &node.kind {
            NodeKind::Doctype(value) => self.out.text(&format!("<!DOCTYPE {}>", value)),
            NodeKind::Tag(tag) => self.tag(tag, line)?,
            NodeKind::Text(text) => self.interpolate(text, line)?,
            NodeKind::Comment {
                text,
                buffered: true,
            } => {
                if self.options.pretty {
                    self.out.text(&self.indent);
                }
                self.out.text(&format!("<!--{}-->", text));
            }
            NodeKind::Comment {
                buffered: false, ..
            } => {}
            NodeKind::Block(block) => {
                let body = self.body(&block.nodes)?;
                self.out.push(Instruction::Block {
                    name: block.name.clone(),
                    body,
                });
            }
            NodeKind::Extends(extends) => self.extends(extends, line)?,
            NodeKind::Include(include) => self.include(include, line)?,
            NodeKind::Case(case) => {
                let mut arms = vec![];
                for arm in &case.arms {
                    arms.push(CaseArm {
                        expr: arm.expr.clone(),
                        body: self.body(&arm.nodes)?,
                    });
                }
                self.out.push(Instruction::Case {
                    expr: case.expr.clone(),
                    arms,
                    line,
                });
            }
            NodeKind::If(if_node) => {
                let mut branches = vec![];
                for branch in &if_node.branches {
                    branches.push(Branch {
                        expr: branch.expr.clone(),
                        body: self.body(&branch.nodes)?,
                        line: branch.line,
                    });
                }
                let otherwise = match &if_node.otherwise {
                    Some(nodes) => Some(self.body(nodes)?),
                    None => None,
                };
                self.out.push(Instruction::If { branches, otherwise });
            }
            NodeKind::While(while_node) => {
                let body = self.body(&while_node.nodes)?;
                self.out.push(Instruction::While {
                    expr: while_node.expr.clone(),
                    body,
                    line,
                });
            }
            NodeKind::Each(each) => {
                let body = self.body(&each.nodes)?;
                self.out.push(Instruction::Each {
                    value: each.value.clone(),
                    key: each.key.clone(),
                    expr: each.expr.clone(),
                    body,
                    line,
                });
            }
        }
        Ok(())
    }

    fn segments(&self, text: &str, line: usize) -> Result<Vec<Segment>> {
        lexer::segments(text, line).map_err(|err| self.locate(err))
    }

    /// Literal text with `#{}` (escaped) and `!{}` (raw) interpolations.
    fn interpolate(&mut self, text: &str, line: usize) -> Result<()> {
        for segment in self.segments(text, line)? {
            match segment {
                Segment::Literal(literal) => self.out.text(&literal),
                Segment::Interpolation { expr, escape, .. } => {
                    let format = if escape { Format::Escape } else { Format::Raw };
                    self.out.push(Instruction::Output { expr, format, line });
                }
            }
        }
        Ok(())
    }

    fn tag(&mut self, tag: &Tag, line: usize) -> Result<()> {
        let pretty = self.options.pretty && !tag.inline;
        if pretty {
            self.out.text(&self.indent);
        }
        self.out.text("<");
        self.out.text(&tag.name);
        let mut classes = vec![];
        for attr in &tag.attrs {
            match (attr.name.as_str(), &attr.value) {
                ("class", _) => classes.push(attr),
                ("id", AttrValue::Literal(value)) => {
                    let mut prefix = format!(" id=\"{}-", self.sid);
                    if !self.options.instance.is_empty() {
                        prefix.push_str(&self.options.instance);
                        prefix.push('-');
                    }
                    self.out.text(&prefix);
                    self.interpolate(value, line)?;
                    self.out.text("\"");
                }
                _ => self.attr(attr, &tag.name, line)?,
            }
        }
        self.classes(&tag.classes, &classes, line)?;
        self.out.text(">");
        if tag.self_closing {
            return Ok(());
        }
        if let Some(text) = &tag.text {
            self.interpolate(text, line)?;
        }
        self.indent.push_str("  ");
        self.nodes(&tag.nodes)?;
        self.indent.truncate(self.indent.len() - 2);
        if pretty && !tag.nodes.is_empty() {
            self.out.text(&self.indent);
        }
        self.out.text("</");
        self.out.text(&tag.name);
        self.out.text(">");
        Ok(())
    }

    /// Transforms only see plain literals; interpolated values are written
    /// as-is.
    fn attr(&mut self, attr: &Attribute, tag: &str, line: usize) -> Result<()> {
        if let AttrValue::Literal(value) = &attr.value {
            if !is_plain(&self.segments(value, line)?) {
                self.out.text(&format!(" {}=\"", attr.name));
                self.interpolate(value, line)?;
                self.out.text("\"");
                return Ok(());
            }
            let transformed = self.session.transforms.apply(
                &attr.name,
                value,
                TransformTarget::Tag(tag),
                &self.options,
            );
            if let Some(result) = transformed {
                self.out.text(&format!(" {}=\"{}\"", attr.name, result));
                return Ok(());
            }
        }
        match &attr.value {
            AttrValue::Boolean => {
                self.out.text(" ");
                self.out.text(&attr.name);
            }
            AttrValue::Literal(value) => {
                self.out.text(&format!(" {}=\"", attr.name));
                self.interpolate(value, line)?;
                self.out.text("\"");
            }
            AttrValue::Expr(expr) => self.out.push(Instruction::Attr {
                name: attr.name.clone(),
                expr: expr.clone(),
                escape: attr.escaped,
                line,
            }),
        }
        Ok(())
    }

    /// `.name` shorthands are scoped with the file's sid; `class`
    /// attributes are written as given, after them.
    fn classes(&mut self, statics: &[String], dynamic: &[&Attribute], line: usize) -> Result<()> {
        if statics.is_empty() && dynamic.is_empty() {
            return Ok(());
        }
        let scoped = statics
            .iter()
            .map(|class| format!("{}-{}", self.sid, class))
            .collect::<Vec<_>>();
        self.out.text(" class=\"");
        self.out.text(&scoped.join(" "));
        for (i, attr) in dynamic.iter().enumerate() {
            if i > 0 || !statics.is_empty() {
                self.out.text(" ");
            }
            match &attr.value {
                AttrValue::Literal(value) => self.interpolate(value, line)?,
                AttrValue::Expr(expr) => self.out.push(Instruction::Output {
                    expr: expr.clone(),
                    format: Format::ClassList,
                    line,
                }),
                AttrValue::Boolean => {}
            }
        }
        self.out.text("\"");
        Ok(())
    }

    fn options_list(&self, options: &[Attribute], line: usize) -> Result<Vec<OptionEntry>> {
        let mut entries = vec![];
        for option in options {
            let value = match &option.value {
                AttrValue::Boolean => OptionValue::Boolean,
                AttrValue::Expr(expr) => OptionValue::Expr(expr.clone()),
                AttrValue::Literal(literal) => {
                    let mut segments = self.segments(literal, line)?;
                    if is_plain(&segments) {
                        let transformed = self.session.transforms.apply(
                            &option.name,
                            literal,
                            TransformTarget::Option,
                            &self.options,
                        );
                        if let Some(text) = transformed {
                            segments = vec![Segment::Literal(text)];
                        }
                    }
                    let parts = segments
                        .into_iter()
                        .map(|segment| match segment {
                            Segment::Literal(literal) => Part::Text(literal),
                            Segment::Interpolation { expr, .. } => Part::Expr(expr),
                        })
                        .collect();
                    OptionValue::Text(parts)
                }
            };
            entries.push(OptionEntry {
                name: option.name.clone(),
                value,
            });
        }
        Ok(entries)
    }

    fn dependency(&self, resolved: &ResolvedModule, kind: DependencyKind) -> Option<Dependency> {
        if self.options.dep {
            Some(Dependency {
                filename: resolved.filename.clone(),
                instance: resolved.instance.clone(),
                kind,
            })
        } else {
            None
        }
    }

    /// Resolve `reference` and compile the file it names.
    fn nested(&self, reference: &str, line: usize) -> Result<(Program, ResolvedModule)> {
        let files = &self.session.files;
        let resolved = module::resolve(reference, &self.sid, &self.options, files)
            .map_err(|err| self.locate(err.with_line(line)))?;
        debug!(
            "resolved `{}` to {} as `{}`",
            reference,
            resolved.filename.display(),
            resolved.instance
        );
        if self.chain.contains(&resolved.filename) {
            let cycle = self
                .chain
                .iter()
                .chain(Some(&resolved.filename))
                .map(|filename| filename.display().to_string())
                .collect::<Vec<_>>();
            return Err(self.error(
                ErrorCode::CircularInheritance,
                format!("Circular inheritance: {}", cycle.join(" -> ")),
                line,
            ));
        }
        if !files.exists(&resolved.filename) {
            return Err(self.error(
                ErrorCode::ModuleNotFound,
                format!(
                    "Module `{}` not found at {}",
                    reference.trim(),
                    resolved.filename.display()
                ),
                line,
            ));
        }
        let file = files
            .resolve(&resolved.filename)
            .map_err(|err| self.locate(err.with_line(line)))?;
        let document = files
            .with_source(file, |source| parser::parse(source, Some(resolved.filename.as_path())))
            .map_err(|err| err.for_file(file))?;
        let options = Options {
            filename: Some(resolved.filename.clone()),
            instance: resolved.instance.clone(),
            indent: self.indent.clone(),
            instance_through: true,
            ..self.options.clone()
        };
        let mut chain = self.chain.clone();
        chain.push(resolved.filename.clone());
        let program = Compiler::new(self.session, options, chain)
            .compile(&document)
            .map_err(|err| err.for_file(file))?;
        Ok((program, resolved))
    }

    fn extends(&mut self, extends: &Extends, line: usize) -> Result<()> {
        let (program, resolved) = self.nested(&extends.reference, line)?;
        let mut overrides: Vec<Override> = vec![];
        for replace in &extends.replaces {
            if !program.blocks.contains(&replace.block) {
                let mut message = format!(
                    "There is no block \"{}\" in {}",
                    replace.block,
                    resolved.filename.display()
                );
                let declared = program.blocks.iter().map(String::as_str);
                if let Some(similar) = find_similar(&replace.block, declared) {
                    message.push_str(&format!(", did you mean \"{}\"?", similar));
                }
                return Err(self.error(ErrorCode::MissingBlock, message, replace.line));
            }
            debug!("{} content for block `{}`", replace.position, replace.block);
            let body = self.nested_body(&replace.nodes)?;
            let index = match overrides.iter().position(|content| content.block == replace.block) {
                Some(index) => index,
                None => {
                    overrides.push(Override {
                        block: replace.block.clone(),
                        ..Override::default()
                    });
                    overrides.len() - 1
                }
            };
            let content = &mut overrides[index];
            let slot = match replace.position {
                Position::Before => &mut content.before,
                Position::Replace => &mut content.replace,
                Position::After => &mut content.after,
            };
            concat(slot.get_or_insert_with(Vec::new), body);
        }
        let options = self.options_list(&extends.options, line)?;
        let dependency = self.dependency(&resolved, DependencyKind::Extends);
        self.out.push(Instruction::Extends {
            program: Box::new(program),
            options,
            overrides,
            dependency,
            line,
        });
        Ok(())
    }

    fn include(&mut self, include: &Include, line: usize) -> Result<()> {
        let (program, resolved) = self.nested(&include.reference, line)?;
        let options = self.options_list(&include.options, line)?;
        let dependency = self.dependency(&resolved, DependencyKind::Include);
        self.out.push(Instruction::Include {
            program: Box::new(program),
            options,
            dependency,
            line,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(text: &str) -> Instruction {
        Instruction::Text(text.into())
    }

    #[test]
    fn builder_merges_adjacent_text() {
        let mut builder = Builder::default();
        builder.text("<p>");
        builder.text("hi");
        builder.push(Instruction::Output {
            expr: "a".into(),
            format: Format::Raw,
            line: 1,
        });
        builder.text("</p>");
        let instructions = builder.finish();
        assert_eq!(instructions.len(), 3);
        assert_eq!(instructions[0], text("<p>hi"));
        assert_eq!(instructions[2], text("</p>"));
    }

    #[test]
    fn concat_merges_the_seam() {
        let mut into = vec![text("a")];
        concat(&mut into, vec![text("b"), text("c")]);
        assert_eq!(into, vec![text("abc")]);
    }

    #[test]
    fn block_table_flags_duplicates() {
        let document = parser::parse("block a\nblock b\ndiv\n  block a", None).unwrap();
        let mut table = BlockTable::default();
        table.visit_document(&document);
        assert_eq!(table.names, vec!["a", "b"]);
        assert_eq!(table.duplicate, Some(("a".to_string(), 4)));
    }
}

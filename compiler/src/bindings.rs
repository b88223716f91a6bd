//! Free-identifier binding: the names a compiled file reads that nothing
//! inside the file binds. They're resolved from the input context when the
//! program is invoked.

use codegen::{Instruction, OptionEntry, OptionValue, Part};
use data_structures::scope_map::ScopeMap;
use diagnostics::error as errors;
use diagnostics::ParseResult as Result;
use source::diagnostics::Span;

#[derive(Default)]
struct Binder {
    scopes: ScopeMap<String, ()>,
    free: Vec<String>,
}

/// Free identifiers of `instructions` in order of first appearance. Nested
/// programs are not searched; they bind their own.
pub fn free_identifiers(instructions: &[Instruction]) -> Result<Vec<String>> {
    let mut binder = Binder::default();
    binder.body(instructions)?;
    Ok(binder.free)
}

impl Binder {
    fn expr(&mut self, expr: &str, line: usize) -> Result<()> {
        let parsed = expression::parse(expr).map_err(|err| {
            errors::syntax_error(Span::initial(), line, expr.trim(), err.message)
        })?;
        for name in expression::free_identifiers(&parsed) {
            if !self.scopes.is_defined(name.as_str()) && !self.free.contains(&name) {
                self.free.push(name);
            }
        }
        Ok(())
    }

    fn options(&mut self, options: &[OptionEntry], line: usize) -> Result<()> {
        for entry in options {
            match &entry.value {
                OptionValue::Boolean => {}
                OptionValue::Expr(expr) => self.expr(expr, line)?,
                OptionValue::Text(parts) => {
                    for part in parts {
                        if let Part::Expr(expr) = part {
                            self.expr(expr, line)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn body(&mut self, body: &[Instruction]) -> Result<()> {
        for instruction in body {
            match instruction {
                Instruction::Text(_) => {}
                Instruction::Output { expr, line, .. } | Instruction::Attr { expr, line, .. } => {
                    self.expr(expr, *line)?;
                }
                Instruction::If { branches, otherwise } => {
                    for branch in branches {
                        self.expr(&branch.expr, branch.line)?;
                        self.body(&branch.body)?;
                    }
                    if let Some(body) = otherwise {
                        self.body(body)?;
                    }
                }
                Instruction::While { expr, body, line } => {
                    self.expr(expr, *line)?;
                    self.body(body)?;
                }
                Instruction::Case { expr, arms, line } => {
                    self.expr(expr, *line)?;
                    for arm in arms {
                        if let Some(expr) = &arm.expr {
                            self.expr(expr, *line)?;
                        }
                        self.body(&arm.body)?;
                    }
                }
                Instruction::Each {
                    value,
                    key,
                    expr,
                    body,
                    line,
                } => {
                    // The list is read outside the loop's own bindings
                    self.expr(expr, *line)?;
                    self.scopes.enter_scope();
                    self.scopes.define(value.clone(), ());
                    if let Some(key) = key {
                        self.scopes.define(key.clone(), ());
                    }
                    self.body(body)?;
                    self.scopes.exit_scope();
                }
                Instruction::Block { body, .. } => self.body(body)?,
                Instruction::Extends {
                    options,
                    overrides,
                    line,
                    ..
                } => {
                    self.options(options, *line)?;
                    for content in overrides {
                        for body in content.bodies() {
                            self.body(body)?;
                        }
                    }
                }
                Instruction::Include { options, line, .. } => self.options(options, *line)?,
            }
        }
        Ok(())
    }
}

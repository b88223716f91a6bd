//! The executable form of a compiled template.

use serde::Serialize;

use std::fmt;
use std::path::PathBuf;

/// One compiled template file. Nested programs for `extends` and `include`
/// targets are embedded in the instructions that invoke them.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Program {
    pub filename: Option<PathBuf>,
    /// Scope id every `id` and `.class` in this file is prefixed with
    pub sid: String,
    pub instance: String,
    pub instructions: Vec<Instruction>,
    /// Blocks declared by this file, in declaration order
    pub blocks: Vec<String>,
    /// Names read by this file's expressions that nothing inside the file
    /// binds. They are bound from the input context when the program runs.
    pub free_identifiers: Vec<String>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// HTML-escaped text
    Escape,
    /// Written as is
    Raw,
    /// Flattened to a space separated class list, then escaped
    ClassList,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Literal markup. Never adjacent to another `Text`.
    Text(String),
    Output {
        expr: String,
        format: Format,
        line: usize,
    },
    /// ` name="value"` for a computed value: `true` writes the bare name,
    /// `false` and `null` write nothing.
    Attr {
        name: String,
        expr: String,
        escape: bool,
        line: usize,
    },
    If {
        branches: Vec<Branch>,
        otherwise: Option<Vec<Instruction>>,
    },
    While {
        expr: String,
        body: Vec<Instruction>,
        line: usize,
    },
    Case {
        expr: String,
        arms: Vec<CaseArm>,
        line: usize,
    },
    Each {
        value: String,
        key: Option<String>,
        expr: String,
        body: Vec<Instruction>,
        line: usize,
    },
    /// A named region. `body` is the default content.
    Block { name: String, body: Vec<Instruction> },
    Extends {
        program: Box<Program>,
        options: Vec<OptionEntry>,
        overrides: Vec<Override>,
        dependency: Option<Dependency>,
        line: usize,
    },
    Include {
        program: Box<Program>,
        options: Vec<OptionEntry>,
        dependency: Option<Dependency>,
        line: usize,
    },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Branch {
    pub expr: String,
    pub body: Vec<Instruction>,
    pub line: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CaseArm {
    /// `None` for `default`
    pub expr: Option<String>,
    pub body: Vec<Instruction>,
}

/// Content an extending template supplies for one of the blocks it inherits.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct Override {
    pub block: String,
    pub before: Option<Vec<Instruction>>,
    pub replace: Option<Vec<Instruction>>,
    pub after: Option<Vec<Instruction>>,
}

/// A key passed as input context to an extended or included template.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OptionEntry {
    pub name: String,
    pub value: OptionValue,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum OptionValue {
    Boolean,
    /// A string built from literal text and interpolations
    Text(Vec<Part>),
    Expr(String),
}

/// Option text is never escaped: the receiving template escapes it when
/// it interpolates the value.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Expr(String),
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Extends,
    Include,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKind::Extends => f.write_str("extends"),
            DependencyKind::Include => f.write_str("include"),
        }
    }
}

/// Recorded with every executed `extends` / `include` when dependency
/// tracking is on.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Dependency {
    pub filename: PathBuf,
    pub instance: String,
    pub kind: DependencyKind,
}

impl Override {
    /// The supplied content, in render order.
    pub fn bodies(&self) -> impl Iterator<Item = &Vec<Instruction>> {
        self.before
            .iter()
            .chain(self.replace.iter())
            .chain(self.after.iter())
    }
}

impl Program {
    /// Visit every program this one embeds, depth first, itself included.
    pub fn walk_programs<'p, F: FnMut(&'p Program)>(&'p self, f: &mut F) {
        fn walk_body<'p, F: FnMut(&'p Program)>(body: &'p [Instruction], f: &mut F) {
            for instruction in body {
                match instruction {
                    Instruction::Extends {
                        program, overrides, ..
                    } => {
                        program.walk_programs(f);
                        for body in overrides.iter().flat_map(Override::bodies) {
                            walk_body(body, f);
                        }
                    }
                    Instruction::Include { program, .. } => program.walk_programs(f),
                    Instruction::If { branches, otherwise } => {
                        for branch in branches {
                            walk_body(&branch.body, f);
                        }
                        if let Some(body) = otherwise {
                            walk_body(body, f);
                        }
                    }
                    Instruction::Case { arms, .. } => {
                        for arm in arms {
                            walk_body(&arm.body, f);
                        }
                    }
                    Instruction::While { body, .. }
                    | Instruction::Each { body, .. }
                    | Instruction::Block { body, .. } => walk_body(body, f),
                    Instruction::Text(_) | Instruction::Output { .. } | Instruction::Attr { .. } => {}
                }
            }
        }
        f(self);
        walk_body(&self.instructions, f);
    }
}

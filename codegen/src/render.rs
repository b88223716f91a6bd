//! Running a program against an input context.

use crate::program::{
    Dependency, DependencyKind, Format, Instruction, OptionEntry, OptionValue, Part, Program,
};
use crate::runtime;

use data_structures::HashMap;
use expression::value::{entries, strict_equals, truthy};
use expression::{Evaluator, Scope};

use log::{debug, trace};
use serde::Serialize;
use serde_json::{Map, Value};

use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderErrorCode {
    EvaluationFailed,
    LoopLimit,
}

impl RenderErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderErrorCode::EvaluationFailed => "EVALUATION_FAILED",
            RenderErrorCode::LoopLimit => "LOOP_LIMIT",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderError {
    pub code: RenderErrorCode,
    pub message: String,
    pub filename: Option<PathBuf>,
    /// The expression being evaluated when rendering failed
    pub expr: String,
    pub line: usize,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} in `{}` on line {} of ",
            self.code.as_str(),
            self.message,
            self.expr,
            self.line
        )?;
        match &self.filename {
            Some(filename) => write!(f, "{}", filename.display()),
            None => f.write_str("template"),
        }
    }
}

impl std::error::Error for RenderError {}

type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Upper bound on the iterations of a single `while` loop
    pub max_iterations: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            max_iterations: 10_000,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DependencyRecord {
    pub filename: PathBuf,
    pub instance: String,
    pub kind: DependencyKind,
    /// The input context the template was invoked with
    pub options: Value,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct Rendered {
    pub html: String,
    /// Executed `extends` / `include` targets, innermost first. Only
    /// filled for programs compiled with dependency tracking.
    pub dependencies: Vec<DependencyRecord>,
}

/// Bindings visible to expressions: loop variables chained over the
/// program's free identifiers.
struct Env {
    vars: HashMap<String, Value>,
    parent: Option<Rc<Env>>,
}

impl Scope for Env {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.vars
            .get(name)
            .or_else(|| self.parent.as_ref().and_then(|parent| parent.lookup(name)))
    }
}

#[derive(Clone)]
struct Frame<'p> {
    program: &'p Program,
    env: Rc<Env>,
    /// Overrides the invoking template supplied for this program's blocks
    blocks: Rc<Slots<'p>>,
}

/// Override content keeps the frame it was written in, so it sees the
/// bindings of the extending template rather than the extended one.
struct Closure<'p> {
    body: &'p [Instruction],
    frame: Frame<'p>,
}

#[derive(Default)]
struct Slot<'p> {
    before: Option<Closure<'p>>,
    replace: Option<Closure<'p>>,
    after: Option<Closure<'p>>,
}

type Slots<'p> = HashMap<&'p str, Slot<'p>>;

struct Renderer<'r> {
    evaluator: &'r dyn Evaluator,
    options: &'r RenderOptions,
    output: Rendered,
}

/// Render `program` with `locals` as its input context.
pub fn render(
    program: &Program,
    locals: &Value,
    evaluator: &dyn Evaluator,
    options: &RenderOptions,
) -> Result<Rendered> {
    let mut renderer = Renderer {
        evaluator,
        options,
        output: Rendered::default(),
    };
    renderer.invoke(program, locals, Rc::new(Slots::default()))?;
    Ok(renderer.output)
}

impl<'r> Renderer<'r> {
    fn invoke<'p>(&mut self, program: &'p Program, locals: &Value, blocks: Rc<Slots<'p>>) -> Result<()> {
        debug!(
            "rendering {}",
            program
                .filename
                .as_ref()
                .map_or_else(|| "template".into(), |filename| filename.display().to_string())
        );
        let vars = program
            .free_identifiers
            .iter()
            .map(|name| (name.clone(), locals.get(name).cloned().unwrap_or(Value::Null)))
            .collect();
        let frame = Frame {
            program,
            env: Rc::new(Env { vars, parent: None }),
            blocks,
        };
        self.run(&program.instructions, &frame)
    }

    fn eval(&self, expr: &str, line: usize, frame: &Frame<'_>) -> Result<Value> {
        trace!("evaluating `{}`", expr);
        self.evaluator
            .evaluate(expr, &*frame.env)
            .map_err(|err| RenderError {
                code: RenderErrorCode::EvaluationFailed,
                message: err.message,
                filename: frame.program.filename.clone(),
                expr: expr.to_string(),
                line,
            })
    }

    fn run<'p>(&mut self, body: &'p [Instruction], frame: &Frame<'p>) -> Result<()> {
        for instruction in body {
            match instruction {
                Instruction::Text(text) => self.output.html.push_str(text),
                Instruction::Output { expr, format, line } => {
                    let value = self.eval(expr, *line, frame)?;
                    self.output.html.push_str(&runtime::format(&value, *format));
                }
                Instruction::Attr {
                    name,
                    expr,
                    escape,
                    line,
                } => {
                    let value = self.eval(expr, *line, frame)?;
                    self.output.html.push_str(&runtime::attr(name, &value, *escape));
                }
                Instruction::If { branches, otherwise } => {
                    let mut taken = None;
                    for branch in branches {
                        if truthy(&self.eval(&branch.expr, branch.line, frame)?) {
                            taken = Some(&branch.body[..]);
                            break;
                        }
                    }
                    if let Some(body) = taken.or_else(|| otherwise.as_deref()) {
                        self.run(body, frame)?;
                    }
                }
                Instruction::While { expr, body, line } => {
                    let mut iterations = 0;
                    while truthy(&self.eval(expr, *line, frame)?) {
                        iterations += 1;
                        if iterations > self.options.max_iterations {
                            return Err(RenderError {
                                code: RenderErrorCode::LoopLimit,
                                message: format!(
                                    "`while` ran more than {} times",
                                    self.options.max_iterations
                                ),
                                filename: frame.program.filename.clone(),
                                expr: expr.clone(),
                                line: *line,
                            });
                        }
                        self.run(body, frame)?;
                    }
                }
                Instruction::Case { expr, arms, line } => {
                    let subject = self.eval(expr, *line, frame)?;
                    let mut chosen = None;
                    for arm in arms {
                        if let Some(arm_expr) = &arm.expr {
                            if strict_equals(&subject, &self.eval(arm_expr, *line, frame)?) {
                                chosen = Some(&arm.body);
                                break;
                            }
                        }
                    }
                    let chosen = chosen.or_else(|| {
                        arms.iter()
                            .find(|arm| arm.expr.is_none())
                            .map(|arm| &arm.body)
                    });
                    if let Some(body) = chosen {
                        self.run(body, frame)?;
                    }
                }
                Instruction::Each {
                    value,
                    key,
                    expr,
                    body,
                    line,
                } => {
                    let list = self.eval(expr, *line, frame)?;
                    for (item, index) in entries(&list) {
                        let mut vars = HashMap::default();
                        vars.insert(value.clone(), item);
                        if let Some(key) = key {
                            vars.insert(key.clone(), index);
                        }
                        let iteration = Frame {
                            env: Rc::new(Env {
                                vars,
                                parent: Some(Rc::clone(&frame.env)),
                            }),
                            ..frame.clone()
                        };
                        self.run(body, &iteration)?;
                    }
                }
                Instruction::Block { name, body } => match frame.blocks.get(name.as_str()) {
                    None => self.run(body, frame)?,
                    Some(slot) => {
                        if let Some(before) = &slot.before {
                            self.run(before.body, &before.frame)?;
                        }
                        match &slot.replace {
                            Some(replace) => self.run(replace.body, &replace.frame)?,
                            None => self.run(body, frame)?,
                        }
                        if let Some(after) = &slot.after {
                            self.run(after.body, &after.frame)?;
                        }
                    }
                },
                Instruction::Extends {
                    program,
                    options,
                    overrides,
                    dependency,
                    line,
                } => {
                    let locals = self.options_object(options, *line, frame)?;
                    let closure = |body: &'p Option<Vec<Instruction>>| {
                        body.as_deref().map(|body| Closure {
                            body,
                            frame: frame.clone(),
                        })
                    };
                    let slots = overrides
                        .iter()
                        .map(|content| {
                            let slot = Slot {
                                before: closure(&content.before),
                                replace: closure(&content.replace),
                                after: closure(&content.after),
                            };
                            (content.block.as_str(), slot)
                        })
                        .collect::<Slots<'p>>();
                    self.invoke(program, &locals, Rc::new(slots))?;
                    self.record(dependency, locals);
                }
                Instruction::Include {
                    program,
                    options,
                    dependency,
                    line,
                } => {
                    let locals = self.options_object(options, *line, frame)?;
                    self.invoke(program, &locals, Rc::new(Slots::default()))?;
                    self.record(dependency, locals);
                }
            }
        }
        Ok(())
    }

    fn options_object(&self, options: &[OptionEntry], line: usize, frame: &Frame<'_>) -> Result<Value> {
        let mut map = Map::new();
        for entry in options {
            let value = match &entry.value {
                OptionValue::Boolean => Value::Bool(true),
                OptionValue::Expr(expr) => self.eval(expr, line, frame)?,
                OptionValue::Text(parts) => Value::String(self.text(parts, line, frame)?),
            };
            map.insert(entry.name.clone(), value);
        }
        Ok(Value::Object(map))
    }

    fn text(&self, parts: &[Part], line: usize, frame: &Frame<'_>) -> Result<String> {
        let mut text = String::new();
        for part in parts {
            match part {
                Part::Text(literal) => text.push_str(literal),
                Part::Expr(expr) => {
                    let value = self.eval(expr, line, frame)?;
                    text.push_str(&runtime::format(&value, Format::Raw));
                }
            }
        }
        Ok(text)
    }

    fn record(&mut self, dependency: &Option<Dependency>, options: Value) {
        if let Some(dependency) = dependency {
            self.output.dependencies.push(DependencyRecord {
                filename: dependency.filename.clone(),
                instance: dependency.instance.clone(),
                kind: dependency.kind,
                options,
            });
        }
    }
}

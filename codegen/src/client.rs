//! Serializing a program to a self-contained JavaScript function.
//!
//! The function takes the input context and returns the rendered markup,
//! or `[markup, dependencies]` when the program tracks dependencies.

use crate::program::{
    Dependency, Format, Instruction, OptionEntry, OptionValue, Override, Part, Program,
};
use crate::runtime::{stringify, CLIENT_RUNTIME};

use std::fmt::Write;

/// Serialize `program`. With `dependencies` set the function also returns
/// every executed `extends` / `include`.
pub fn serialize(program: &Program, dependencies: bool) -> String {
    let mut writer = Writer {
        out: String::new(),
        dependencies,
    };
    writer.out.push_str("function(__made_locals){");
    writer.out.push_str("var __made_view=");
    writer.out.push_str(CLIENT_RUNTIME);
    writer
        .out
        .push_str(";var __made_buf=[];var __made_block={};__made_locals=__made_locals||{};");
    if dependencies {
        writer.out.push_str("var __made_dep=[];");
    }
    writer.program(program);
    if dependencies {
        writer.out.push_str("return [__made_buf.join(\"\"),__made_dep];}");
    } else {
        writer.out.push_str("return __made_buf.join(\"\");}");
    }
    writer.out
}

struct Writer {
    out: String,
    dependencies: bool,
}

impl Writer {
    /// Free identifiers become parameters of an immediately invoked
    /// function, bound from the current `__made_locals`.
    fn program(&mut self, program: &Program) {
        let args = program
            .free_identifiers
            .iter()
            .map(|name| format!("__made_locals[{}]", stringify(name)))
            .collect::<Vec<_>>();
        let _ = write!(self.out, ";(function({}){{", program.free_identifiers.join(","));
        self.body(&program.instructions);
        let _ = write!(self.out, "}})({});", args.join(","));
    }

    fn body(&mut self, body: &[Instruction]) {
        for instruction in body {
            self.instruction(instruction);
        }
    }

    fn function(&mut self, body: &[Instruction]) {
        self.out.push_str("function(){");
        self.body(body);
        self.out.push('}');
    }

    fn instruction(&mut self, instruction: &Instruction) {
        match instruction {
            Instruction::Text(text) => {
                let _ = write!(self.out, "__made_buf.push({});", stringify(text));
            }
            Instruction::Output { expr, format, .. } => {
                let value = match format {
                    Format::Escape => format!("__made_view.encode(({}))", expr),
                    Format::Raw => format!("__made_view.str(({}))", expr),
                    Format::ClassList => format!("__made_view.encode(__made_view.cls(({})))", expr),
                };
                let _ = write!(self.out, "__made_buf.push({});", value);
            }
            Instruction::Attr {
                name, expr, escape, ..
            } => {
                let _ = write!(
                    self.out,
                    "__made_buf.push(__made_view.attr({},({}),{}));",
                    stringify(name),
                    expr,
                    escape
                );
            }
            Instruction::If { branches, otherwise } => {
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str("else ");
                    }
                    let _ = write!(self.out, "if(__made_view.ok(({}))){{", branch.expr);
                    self.body(&branch.body);
                    self.out.push('}');
                }
                if let Some(body) = otherwise {
                    self.out.push_str("else{");
                    self.body(body);
                    self.out.push('}');
                }
            }
            Instruction::While { expr, body, .. } => {
                let _ = write!(self.out, "while(__made_view.ok(({}))){{", expr);
                self.body(body);
                self.out.push('}');
            }
            Instruction::Case { expr, arms, .. } => {
                let _ = write!(self.out, "switch(({})){{", expr);
                for arm in arms.iter().filter(|arm| arm.expr.is_some()) {
                    let _ = write!(self.out, "case ({}):{{", arm.expr.as_deref().unwrap_or(""));
                    self.body(&arm.body);
                    self.out.push_str("break}");
                }
                if let Some(arm) = arms.iter().find(|arm| arm.expr.is_none()) {
                    self.out.push_str("default:{");
                    self.body(&arm.body);
                    self.out.push('}');
                }
                self.out.push('}');
            }
            Instruction::Each {
                value,
                key,
                expr,
                body,
                ..
            } => {
                let params = match key {
                    Some(key) => format!("{},{}", value, key),
                    None => value.clone(),
                };
                let _ = write!(self.out, "__made_view.each(({}),function({}){{", expr, params);
                self.body(body);
                self.out.push_str("});");
            }
            Instruction::Block { name, body } => {
                let _ = write!(self.out, "__made_view.block(__made_block,{},", stringify(name));
                self.function(body);
                self.out.push_str(");");
            }
            Instruction::Extends {
                program,
                options,
                overrides,
                dependency,
                ..
            } => self.invoke(program, options, overrides, dependency.as_ref()),
            Instruction::Include {
                program,
                options,
                dependency,
                ..
            } => self.invoke(program, options, &[], dependency.as_ref()),
        }
    }

    fn invoke(
        &mut self,
        program: &Program,
        options: &[OptionEntry],
        overrides: &[Override],
        dependency: Option<&Dependency>,
    ) {
        self.out.push_str("(function(__made_locals,__made_block){");
        self.program(program);
        if let Some(dependency) = dependency.filter(|_| self.dependencies) {
            let _ = write!(
                self.out,
                "__made_dep.push({{filename:{},instance:{},type:{},options:__made_locals}});",
                stringify(&dependency.filename.to_string_lossy()),
                stringify(&dependency.instance),
                stringify(&dependency.kind.to_string())
            );
        }
        self.out.push_str("})(");
        self.options(options);
        self.out.push_str(",{");
        for (i, content) in overrides.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            let _ = write!(self.out, "{}:[", stringify(&content.block));
            for (j, body) in [&content.before, &content.replace, &content.after]
                .iter()
                .enumerate()
            {
                if j > 0 {
                    self.out.push(',');
                }
                match body {
                    Some(body) => self.function(body),
                    None => self.out.push_str("null"),
                }
            }
            self.out.push(']');
        }
        self.out.push_str("});");
    }

    fn options(&mut self, options: &[OptionEntry]) {
        self.out.push('{');
        for (i, entry) in options.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            let value = match &entry.value {
                OptionValue::Boolean => "true".to_string(),
                OptionValue::Expr(expr) => format!("({})", expr),
                OptionValue::Text(parts) => text(parts),
            };
            let _ = write!(self.out, "{}:{}", stringify(&entry.name), value);
        }
        self.out.push('}');
    }
}

/// A string concatenation expression for literal text and interpolations.
fn text(parts: &[Part]) -> String {
    if parts.is_empty() {
        return "\"\"".to_string();
    }
    let pieces = parts
        .iter()
        .map(|part| match part {
            Part::Text(literal) => stringify(literal),
            Part::Expr(expr) => format!("__made_view.str(({}))", expr),
        })
        .collect::<Vec<_>>();
    format!("({})", pieces.join("+"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Branch, CaseArm, DependencyKind};
    use std::path::PathBuf;

    fn program(free: &[&str], instructions: Vec<Instruction>) -> Program {
        Program {
            filename: None,
            sid: String::new(),
            instance: String::new(),
            instructions,
            blocks: vec![],
            free_identifiers: free.iter().map(|name| name.to_string()).collect(),
        }
    }

    #[test]
    fn serializes_a_function() {
        let p = program(
            &["name"],
            vec![
                Instruction::Text("<p>".into()),
                Instruction::Output {
                    expr: "name".into(),
                    format: Format::Escape,
                    line: 1,
                },
                Instruction::Text("</p>".into()),
            ],
        );
        let expected = format!(
            concat!(
                "function(__made_locals){{var __made_view={};",
                "var __made_buf=[];var __made_block={{}};__made_locals=__made_locals||{{}};",
                ";(function(name){{__made_buf.push(\"<p>\");",
                "__made_buf.push(__made_view.encode((name)));",
                "__made_buf.push(\"</p>\");}})(__made_locals[\"name\"]);",
                "return __made_buf.join(\"\");}}"
            ),
            CLIENT_RUNTIME
        );
        assert_eq!(serialize(&p, false), expected);
    }

    #[test]
    fn conditions_test_through_the_runtime() {
        let p = program(
            &["n"],
            vec![Instruction::If {
                branches: vec![Branch {
                    expr: "n / 0".into(),
                    body: vec![Instruction::Text("y".into())],
                    line: 1,
                }],
                otherwise: Some(vec![Instruction::Text("n".into())]),
            }],
        );
        let js = serialize(&p, false);
        assert!(js.contains(
            "if(__made_view.ok((n / 0))){__made_buf.push(\"y\");}else{__made_buf.push(\"n\");}"
        ));
    }

    #[test]
    fn case_default_goes_last() {
        let p = program(
            &["n"],
            vec![Instruction::Case {
                expr: "n".into(),
                arms: vec![
                    CaseArm {
                        expr: None,
                        body: vec![Instruction::Text("d".into())],
                    },
                    CaseArm {
                        expr: Some("1".into()),
                        body: vec![Instruction::Text("one".into())],
                    },
                ],
                line: 1,
            }],
        );
        let js = serialize(&p, false);
        assert!(js.contains(
            "switch((n)){case (1):{__made_buf.push(\"one\");break}default:{__made_buf.push(\"d\");}}"
        ));
    }

    #[test]
    fn includes_push_dependencies() {
        let nested = program(&["title"], vec![Instruction::Text("x".into())]);
        let p = program(
            &[],
            vec![Instruction::Include {
                program: Box::new(nested),
                options: vec![OptionEntry {
                    name: "title".into(),
                    value: OptionValue::Text(vec![Part::Text("Hi".into())]),
                }],
                dependency: Some(Dependency {
                    filename: PathBuf::from("/views/nav.made"),
                    instance: "a".into(),
                    kind: DependencyKind::Include,
                }),
                line: 1,
            }],
        );
        let js = serialize(&p, true);
        assert!(js.contains("var __made_dep=[];"));
        assert!(js.contains(
            "__made_dep.push({filename:\"/views/nav.made\",instance:\"a\",type:\"include\",options:__made_locals});})({\"title\":(\"Hi\")},{});"
        ));
        assert!(js.ends_with("return [__made_buf.join(\"\"),__made_dep];}"));

        let plain = serialize(&p, false);
        assert!(!plain.contains("__made_dep"));
    }
}

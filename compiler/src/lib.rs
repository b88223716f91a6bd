#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

mod bindings;
mod compiler;
pub mod module;
pub mod options;
pub mod transform;

pub use crate::options::{Model, Options};
pub use crate::transform::{TransformFn, TransformTarget, Transforms};

use crate::compiler::Compiler;

use codegen::{Program, RenderError, RenderOptions, Rendered};
use diagnostics::ParseResult as Result;
use expression::{Evaluator, Interpreter};
use serde_json::Value;
use source::{FileId, FileSystem};
use syntax::ast::Document;

use std::path::{Path, PathBuf};

/// Where templates compiled from a string without a filename are stored
/// in the session's file system.
const ANONYMOUS: &str = "template";

/// Owns what outlives a single compile: the loaded template sources and
/// the attribute transforms.
#[derive(Default)]
pub struct Session {
    pub(crate) files: FileSystem,
    pub(crate) transforms: Transforms,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn with_transforms(mut self, transforms: Transforms) -> Self {
        self.transforms = transforms;
        self
    }

    /// Every template source this session has read, for reporting
    /// diagnostics.
    pub fn files(&self) -> &FileSystem {
        &self.files
    }

    pub fn compile(&self, source: &str, options: &Options) -> Result<Template> {
        let path = options
            .filename
            .clone()
            .unwrap_or_else(|| PathBuf::from(ANONYMOUS));
        let file = self.files.load(&path, source);
        self.compile_loaded(file, options)
    }

    pub fn compile_file(&self, path: impl AsRef<Path>, options: &Options) -> Result<Template> {
        let path = path.as_ref();
        let file = self.files.resolve(path).map_err(|err| err.in_file(path))?;
        let options = Options {
            filename: Some(path.to_path_buf()),
            ..options.clone()
        };
        self.compile_loaded(file, &options)
    }

    /// Compile an already parsed document. Its filename is used when
    /// `options` doesn't name one.
    pub fn compile_ast(&self, document: &Document, options: &Options) -> Result<Template> {
        let mut options = options.clone();
        if options.filename.is_none() {
            options.filename = document.filename.clone();
        }
        options.filename = options.filename.as_deref().map(module::normalize_path);
        let chain = options.filename.iter().cloned().collect();
        let dep = options.dep;
        let program = Compiler::new(self, options, chain).compile(document)?;
        Ok(Template { program, dep })
    }

    /// Compile to the source of a standalone JavaScript function.
    pub fn compile_client(&self, source: &str, options: &Options) -> Result<String> {
        self.compile(source, options).map(|template| template.to_client())
    }

    pub fn compile_client_file(&self, path: impl AsRef<Path>, options: &Options) -> Result<String> {
        self.compile_file(path, options)
            .map(|template| template.to_client())
    }

    fn compile_loaded(&self, file: FileId, options: &Options) -> Result<Template> {
        let document = self
            .files
            .with_source(file, |source| parser::parse(source, options.filename.as_deref()))
            .map_err(|err| err.for_file(file))?;
        self.compile_ast(&document, options)
            .map_err(|err| err.for_file(file))
    }
}

/// A compiled template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    program: Program,
    dep: bool,
}

impl Template {
    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn into_program(self) -> Program {
        self.program
    }

    /// Render with the default expression interpreter.
    pub fn render(&self, locals: &Value) -> std::result::Result<Rendered, RenderError> {
        self.render_with(locals, &Interpreter::new(), &RenderOptions::default())
    }

    pub fn render_with(
        &self,
        locals: &Value,
        evaluator: &dyn Evaluator,
        options: &RenderOptions,
    ) -> std::result::Result<Rendered, RenderError> {
        codegen::render(&self.program, locals, evaluator, options)
    }

    pub fn to_client(&self) -> String {
        codegen::serialize(&self.program, self.dep)
    }
}

pub fn compile(source: &str, options: &Options) -> Result<Template> {
    Session::new().compile(source, options)
}

pub fn compile_file(path: impl AsRef<Path>, options: &Options) -> Result<Template> {
    Session::new().compile_file(path, options)
}

pub fn compile_ast(document: &Document, options: &Options) -> Result<Template> {
    Session::new().compile_ast(document, options)
}

pub fn compile_client(source: &str, options: &Options) -> Result<String> {
    Session::new().compile_client(source, options)
}

pub fn compile_client_file(path: impl AsRef<Path>, options: &Options) -> Result<String> {
    Session::new().compile_client_file(path, options)
}

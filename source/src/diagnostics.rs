use crate::filesystem::{FileId, FileSystem};
pub use codespan::{ByteIndex, Span};
use codespan_reporting::diagnostic::{
    Diagnostic as CodespanDiagnostic, Label as CodespanLabel, LabelStyle, Severity,
};
use codespan_reporting::files::Error as FilesError;
pub use codespan_reporting::term::*;
use serde::Serialize;

use std::fmt::{self, Display};
use std::ops::Range;
use std::path::{Path, PathBuf};

// These diagnostic interfaces implement the same API as the codespan_reporting crate, except
// Label, which does not require a FileId when instantiated, and Diagnostic, which
// also carries the stable error code and the line/file it was raised for.

/// Stable identifiers for every failure the pipeline can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    // Lexical
    InvalidIndentation,
    InconsistentIndentation,
    BracketMismatch,
    UnterminatedString,
    IncorrectNesting,
    InvalidKeyCharacter,
    MissingModuleReference,
    InvalidBlockName,
    UnexpectedText,
    // Embedded expressions
    SyntaxError,
    // Parser
    InvalidToken,
    // Compiler
    MissingBlock,
    DuplicateBlock,
    ModuleNotFound,
    InvalidModuleReference,
    CircularInheritance,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        use ErrorCode::*;
        match self {
            InvalidIndentation => "INVALID_INDENTATION",
            InconsistentIndentation => "INCONSISTENT_INDENTATION",
            BracketMismatch => "BRACKET_MISMATCH",
            UnterminatedString => "UNTERMINATED_STRING",
            IncorrectNesting => "INCORRECT_NESTING",
            InvalidKeyCharacter => "INVALID_KEY_CHARACTER",
            MissingModuleReference => "MISSING_MODULE_REFERENCE",
            InvalidBlockName => "INVALID_BLOCK_NAME",
            UnexpectedText => "UNEXPECTED_TEXT",
            SyntaxError => "SYNTAX_ERROR",
            InvalidToken => "INVALID_TOKEN",
            MissingBlock => "MISSING_BLOCK",
            DuplicateBlock => "DUPLICATE_BLOCK",
            ModuleNotFound => "MODULE_NOT_FOUND",
            InvalidModuleReference => "INVALID_MODULE_REFERENCE",
            CircularInheritance => "CIRCULAR_INHERITANCE",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub message: String,
    pub labels: Vec<Label>,
    code: Option<ErrorCode>,
    line: Option<usize>,
    filename: Option<PathBuf>,
    severity: Severity,
}

impl Diagnostic {
    pub fn emit_to_terminal(self, files: &FileSystem) -> Result<(), FilesError> {
        use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = Config::default();
        let mut notes = vec![];
        if let (Some(line), Some(filename)) = (self.line, &self.filename) {
            notes.push(format!("on line {} of {}", line, filename.display()));
        }
        // Convert to a codespan-reporting diagnostic. Labels that were never
        // bound to a file can't be rendered, so they're dropped here.
        let mut diagnostic = CodespanDiagnostic::new(self.severity)
            .with_message(self.message)
            .with_labels(
                self.labels
                    .into_iter()
                    .filter_map(|label| {
                        let file = label.file?;
                        Some(
                            CodespanLabel::new(label.style, file, label.range)
                                .with_message(label.message),
                        )
                    })
                    .collect(),
            )
            .with_notes(notes);
        if let Some(code) = self.code {
            diagnostic = diagnostic.with_code(code.as_str());
        }
        emit(&mut writer.lock(), &config, files, &diagnostic)?;
        Ok(())
    }

    pub fn error() -> Diagnostic {
        Diagnostic {
            message: String::new(),
            labels: vec![],
            code: None,
            line: None,
            filename: None,
            severity: Severity::Error,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_labels(mut self, labels: impl Into<Vec<Label>>) -> Self {
        self.labels = labels.into();
        self
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Bind every label that doesn't have a file yet to `file`.
    pub fn for_file(mut self, file: FileId) -> Self {
        for label in &mut self.labels {
            if label.file.is_none() {
                label.file = Some(file);
            }
        }
        self
    }

    /// Record the template path the error was raised for. The innermost
    /// file wins, so this never overwrites a filename set earlier.
    pub fn in_file(mut self, filename: &Path) -> Self {
        if self.filename.is_none() {
            self.filename = Some(filename.to_path_buf());
        }
        self
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(line) = self.line {
            write!(f, " on line {}", line)?;
        }
        match &self.filename {
            Some(filename) => write!(f, " of {}", filename.display()),
            None => write!(f, " of template"),
        }
    }
}

impl std::error::Error for Diagnostic {}

#[derive(Clone, Debug)]
pub struct Label {
    pub file: Option<FileId>,
    pub style: LabelStyle,
    pub range: Range<usize>,
    pub message: String,
}

fn span_range(span: Span) -> Range<usize> {
    span.start().to_usize()..span.end().to_usize()
}

impl Label {
    pub fn primary(span: Span) -> Label {
        Label {
            file: None,
            style: LabelStyle::Primary,
            range: span_range(span),
            message: String::new(),
        }
    }

    pub fn secondary(span: Span) -> Label {
        Label {
            file: None,
            style: LabelStyle::Secondary,
            range: span_range(span),
            message: String::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn for_file(mut self, file: FileId) -> Self {
        self.file = Some(file);
        self
    }
}

//! Constructors for the diagnostics each pipeline stage raises. Keeping them
//! in one place keeps messages and codes consistent between the lexer,
//! parser and compiler.

use source::diagnostics::{Diagnostic, ErrorCode, Label, Span};

use std::fmt::Display;
use std::path::Path;

/// A lexical error at `span` on `line`.
pub fn lex_error(code: ErrorCode, message: impl Into<String>, span: Span, line: usize) -> Diagnostic {
    let message = message.into();
    Diagnostic::error()
        .with_code(code)
        .with_labels(vec![Label::primary(span).with_message(message.clone())])
        .with_message(message)
        .with_line(line)
}

pub fn invalid_indentation(span: Span, line: usize) -> Diagnostic {
    lex_error(
        ErrorCode::InvalidIndentation,
        "Invalid indentation, you can use tabs or spaces but not both",
        span,
        line,
    )
}

pub fn inconsistent_indentation(span: Span, line: usize, found: usize, open: usize) -> Diagnostic {
    lex_error(
        ErrorCode::InconsistentIndentation,
        format!(
            "Inconsistent indentation. Expecting either {} or fewer, but got {}",
            open, found
        ),
        span,
        line,
    )
}

pub fn bracket_mismatch(span: Span, line: usize, open: char) -> Diagnostic {
    lex_error(
        ErrorCode::BracketMismatch,
        format!("The end of the string was reached with no closing bracket for `{}`", open),
        span,
        line,
    )
}

pub fn unterminated_string(span: Span, line: usize) -> Diagnostic {
    lex_error(
        ErrorCode::UnterminatedString,
        "The end of the string was reached inside a quoted string",
        span,
        line,
    )
}

pub fn incorrect_nesting(span: Span, line: usize, source: &str) -> Diagnostic {
    lex_error(
        ErrorCode::IncorrectNesting,
        format!("Nesting must match on expression `{}`", source),
        span,
        line,
    )
}

/// An embedded expression that failed to parse.
pub fn syntax_error(span: Span, line: usize, source: &str, reason: impl Display) -> Diagnostic {
    lex_error(
        ErrorCode::SyntaxError,
        format!("Syntax Error in `{}`: {}", source, reason),
        span,
        line,
    )
}

/// The parser found `found` where the grammar expected `expected`.
pub fn unexpected_token(span: Span, line: usize, found: impl Display, expected: &str) -> Diagnostic {
    let message = if expected.is_empty() {
        format!("Unexpected token `{}`", found)
    } else {
        format!("Unexpected token `{}`, expected {}", found, expected)
    };
    Diagnostic::error()
        .with_code(ErrorCode::InvalidToken)
        .with_labels(vec![Label::primary(span).with_message("Unexpected token")])
        .with_message(message)
        .with_line(line)
}

pub fn compile_error(code: ErrorCode, message: impl Into<String>, line: usize, filename: &Path) -> Diagnostic {
    Diagnostic::error()
        .with_code(code)
        .with_message(message)
        .with_line(line)
        .in_file(filename)
}

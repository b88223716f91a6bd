use crate::support::{options, session};

use codegen::{RenderErrorCode, RenderOptions};
use expression::Interpreter;
use serde_json::json;
use source::diagnostics::ErrorCode;

use std::path::Path;

fn code(source: &str) -> Option<ErrorCode> {
    compiler::compile(source, &options()).unwrap_err().code()
}

#[test]
fn lexical_errors() {
    assert_eq!(code("div\n\tp\n  span"), Some(ErrorCode::InvalidIndentation));
    assert_eq!(code("div\n    p\n  span"), Some(ErrorCode::InconsistentIndentation));
    assert_eq!(code("p #{name"), Some(ErrorCode::BracketMismatch));
    assert_eq!(code("include"), Some(ErrorCode::MissingModuleReference));
}

#[test]
fn syntax_errors_carry_their_line() {
    let err = compiler::compile("div\n  if a +\n    p x", &options()).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::SyntaxError));
    assert_eq!(err.line(), Some(2));
}

#[test]
fn stray_keywords_are_invalid_tokens() {
    assert_eq!(code("when 1"), Some(ErrorCode::InvalidToken));
}

#[test]
fn duplicate_blocks() {
    let err = compiler::compile("block a\ndiv\n  block a", &options()).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::DuplicateBlock));
    assert_eq!(err.line(), Some(3));
}

#[test]
fn missing_modules() {
    let session = session(&[("page.made", "p\ninclude missing")]);
    let err = session
        .compile_file("/site/page.made", &options())
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ModuleNotFound));
    assert_eq!(err.line(), Some(2));
    assert!(err.message.contains("/site/missing.made"));
}

#[test]
fn invalid_module_references() {
    assert_eq!(code("include nav:"), Some(ErrorCode::InvalidModuleReference));
}

#[test]
fn loops_are_bounded() {
    let template = compiler::compile("while true\n  p x", &options()).unwrap();
    let err = template
        .render_with(
            &json!({}),
            &Interpreter::new(),
            &RenderOptions { max_iterations: 3 },
        )
        .unwrap_err();
    assert_eq!(err.code, RenderErrorCode::LoopLimit);
    assert_eq!(err.line, 1);
}

#[test]
fn evaluation_errors_name_the_expression() {
    let session = session(&[("page.made", "p\n  span #{nope(1)}")]);
    let template = session.compile_file("/site/page.made", &options()).unwrap();
    let err = template.render(&json!({})).unwrap_err();
    assert_eq!(err.code, RenderErrorCode::EvaluationFailed);
    assert_eq!(err.expr, "nope(1)");
    assert_eq!(err.line, 2);
    assert_eq!(err.filename.as_deref(), Some(Path::new("/site/page.made")));
    assert!(err.to_string().starts_with("[EVALUATION_FAILED]"));
}

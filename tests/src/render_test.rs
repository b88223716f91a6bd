use crate::support::{options, render, session};

use compiler::{Session, TransformTarget, Transforms};
use insta::assert_snapshot;
use serde_json::json;

#[test]
fn escapes_interpolations() {
    let html = render("p #{user.name}", json!({ "user": { "name": "<A&B>" } }));
    assert_snapshot!(html, @"<p>&lt;A&amp;B&gt;</p>");
}

#[test]
fn raw_interpolations_are_written_as_is() {
    let html = render("div !{markup}", json!({ "markup": "<b>hi</b>" }));
    assert_snapshot!(html, @"<div><b>hi</b></div>");
}

#[test]
fn piped_text_joins_the_parent() {
    let html = render("p\n  | Hello #{name}", json!({ "name": "Ann" }));
    assert_snapshot!(html, @"<p>Hello Ann</p>");
}

#[test]
fn each_repeats_its_body() {
    let html = render(
        "ul\n  each item in items\n    li #{item}",
        json!({ "items": [1, 2, 3] }),
    );
    assert_snapshot!(html, @"<ul><li>1</li><li>2</li><li>3</li></ul>");
}

#[test]
fn each_over_null_renders_nothing() {
    let html = render("ul\n  each item in items\n    li #{item}", json!({ "items": null }));
    assert_eq!(html, "<ul></ul>");
}

#[test]
fn attributes() {
    let html = render("a(href=\"/x\", title=name) link", json!({ "name": "T" }));
    assert_snapshot!(html, @r###"<a href="/x" title="T">link</a>"###);
}

#[test]
fn boolean_attributes() {
    let html = render(
        "input(checked, disabled=off, required=on)",
        json!({ "off": false, "on": true }),
    );
    assert_eq!(html, "<input checked required>");
}

#[test]
fn classes_and_ids_are_scoped() {
    let template = compiler::compile("div.card#main(class=\"big\")", &options()).unwrap();
    let sid = template.program().sid.clone();
    let html = template.render(&json!({})).unwrap().html;
    assert_eq!(
        html,
        format!("<div id=\"{0}-main\" class=\"{0}-card big\"></div>", sid)
    );
}

#[test]
fn class_expressions_are_flattened() {
    let template = compiler::compile("span(class=names)", &options()).unwrap();
    let html = template
        .render(&json!({ "names": ["a", "b"] }))
        .unwrap()
        .html;
    assert_eq!(html, "<span class=\"a b\"></span>");
}

#[test]
fn void_tags_are_not_closed() {
    assert_eq!(render("br", json!({})), "<br>");
}

#[test]
fn doctype_and_comments() {
    let html = render("doctype html\n// shown\n//- hidden\np", json!({}));
    assert_snapshot!(html, @"<!DOCTYPE html><!-- shown--><p></p>");
}

#[test]
fn pretty_output_indents_block_tags() {
    let mut options = options();
    options.pretty = true;
    let html = compiler::compile("div\n  p hi\n  span x", &options)
        .unwrap()
        .render(&json!({}))
        .unwrap()
        .html;
    assert_eq!(html, "\n<div>\n  <p>hi</p><span>x</span>\n</div>");
}

#[test]
fn conditionals() {
    let source = "if n == 1\n  p one\nelse if n == 2\n  p two\nelse\n  p many";
    assert_eq!(render(source, json!({ "n": 1 })), "<p>one</p>");
    assert_eq!(render(source, json!({ "n": 2 })), "<p>two</p>");
    assert_eq!(render(source, json!({ "n": 3 })), "<p>many</p>");

    let source = "unless admin\n  p guest\nelse\n  p admin";
    assert_eq!(render(source, json!({ "admin": false })), "<p>guest</p>");
    assert_eq!(render(source, json!({ "admin": true })), "<p>admin</p>");
}

#[test]
fn case_takes_the_first_match() {
    let source = "case kind\n  when \"a\"\n    p A\n  when \"b\"\n    p B\n  default\n    p other";
    assert_eq!(render(source, json!({ "kind": "b" })), "<p>B</p>");
    assert_eq!(render(source, json!({ "kind": "z" })), "<p>other</p>");
}

#[test]
fn case_compares_containers_by_identity() {
    let source = "case tags\n  when [\"a\"]\n    p same\n  default\n    p other";
    assert_eq!(render(source, json!({ "tags": ["a"] })), "<p>other</p>");
    let source = "p #{[[\"a\"]].indexOf([\"a\"])} #{tags.indexOf(\"a\")}";
    assert_eq!(render(source, json!({ "tags": ["a"] })), "<p>-1 0</p>");
}

#[test]
fn only_free_identifiers_are_bound() {
    let template = compiler::compile("each x in xs\n  p #{x}\np #{y}", &options()).unwrap();
    assert_eq!(template.program().free_identifiers, vec!["xs", "y"]);
}

#[test]
fn tag_transforms_rewrite_literal_attributes() {
    let session = Session::new().with_transforms(Transforms::new().with(
        "src",
        |value, target, _| match target {
            TransformTarget::Tag("img") => Some(format!("/cdn/{}", value)),
            _ => None,
        },
    ));
    let html = session
        .compile("img(src=\"a.png\")", &options())
        .unwrap()
        .render(&json!({}))
        .unwrap()
        .html;
    assert_eq!(html, "<img src=\"/cdn/a.png\">");
}

#[test]
fn transforms_skip_interpolated_values() {
    let transforms = || {
        Transforms::new().with("src", |value, _, _| Some(format!("/cdn/{}", value)))
    };
    let standalone = Session::new().with_transforms(transforms());
    let html = standalone
        .compile("img(src=\"a#{n}.png\")\nimg(src=\"b.png\")", &options())
        .unwrap()
        .render(&json!({ "n": 7 }))
        .unwrap()
        .html;
    assert_eq!(html, "<img src=\"a7.png\"><img src=\"/cdn/b.png\">");

    let with_nav = session(&[("nav.made", "img(src=src)")]).with_transforms(transforms());
    let html = with_nav
        .compile("include(src=\"a#{n}.png\") nav", &options())
        .unwrap()
        .render(&json!({ "n": 7 }))
        .unwrap()
        .html;
    assert_eq!(html, "<img src=\"a7.png\">");
}

#[test]
fn option_transforms_rewrite_passed_values() {
    let session = session(&[("nav.made", "img(src=src)")]).with_transforms(
        Transforms::new().with("src", |value, target, _| match target {
            TransformTarget::Option => Some(format!("/static/{}", value)),
            TransformTarget::Tag(_) => None,
        }),
    );
    let html = session
        .compile("include(src=\"a.png\") nav", &options())
        .unwrap()
        .render(&json!({}))
        .unwrap()
        .html;
    assert_eq!(html, "<img src=\"/static/a.png\">");
}

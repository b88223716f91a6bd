//! Serialized programs run under `node` must produce what `render` does.

use crate::support::{compile, options, session};

use compiler::Template;
use serde_json::{json, Value};

use std::io::Write;
use std::process::{Command, Stdio};

/// Run the client function for `template` against `locals` in node.
/// `Err` carries the message the function threw.
fn run_client(template: &Template, locals: &Value) -> Result<String, String> {
    let script = format!(
        concat!(
            "var render={};var locals={};var result;",
            "try{{result={{html:render(locals)}}}}",
            "catch(e){{result={{error:String(e&&e.message)}}}}",
            "process.stdout.write(JSON.stringify(result));"
        ),
        template.to_client(),
        locals
    );
    let mut child = Command::new("node")
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn node");
    child
        .stdin
        .take()
        .expect("node stdin")
        .write_all(script.as_bytes())
        .expect("failed to write script");
    let output = child.wait_with_output().expect("node did not finish");
    assert!(
        output.status.success(),
        "node failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let result: Value = serde_json::from_slice(&output.stdout).expect("node printed JSON");
    match (&result["html"], &result["error"]) {
        (Value::String(html), _) => Ok(html.clone()),
        (_, error) => Err(error.to_string()),
    }
}

fn assert_parity(template: &Template, locals: Value) {
    let rendered = template
        .render(&locals)
        .map(|rendered| rendered.html)
        .map_err(|err| err.to_string());
    let client = run_client(template, &locals);
    match (&rendered, &client) {
        (Ok(rendered), Ok(client)) => assert_eq!(rendered, client, "locals: {}", locals),
        (Err(_), Err(_)) => {}
        _ => panic!(
            "render gave {:?} but the client gave {:?} for {}",
            rendered, client, locals
        ),
    }
}

fn assert_source_parity(source: &str, locals: Value) {
    let template = compiler::compile(source, &options()).unwrap();
    assert_parity(&template, locals);
}

#[test]
fn interpolation_and_iteration() {
    assert_source_parity("p #{user.name}", json!({ "user": { "name": "<A&B>" } }));
    assert_source_parity("p #{user.name}", json!({ "user": {} }));
    assert_source_parity("div !{markup}", json!({ "markup": "<b>hi</b>" }));
    assert_source_parity("ul\n  each item in items\n    li #{item}", json!({ "items": [1, 2, 3] }));
    assert_source_parity("ul\n  each item in items\n    li #{item}", json!({ "items": null }));
    assert_source_parity("p #{[1, null, 'a'].join('-')} #{items}", json!({ "items": [1, [2, 3]] }));
}

#[test]
fn members_of_missing_values_fail_in_both() {
    assert_source_parity("p #{user.missing.deeper}", json!({ "user": {} }));
    assert_source_parity("p #{user.name}", json!({}));
    assert_source_parity("p #{nobody[0]}", json!({}));
}

#[test]
fn numbers_print_alike() {
    let source = "p #{x} #{x * 2} #{x / 3}";
    for x in &[json!(1e21), json!(0.000_001), json!(1.5e-7), json!(123.456), json!(-7)] {
        assert_source_parity(source, json!({ "x": x }));
    }
}

#[test]
fn non_finite_results_render_as_nothing() {
    assert_source_parity("p #{n / 0} #{0 / 0}", json!({ "n": 1 }));
    assert_source_parity("img(alt=n / 0)", json!({ "n": 1 }));
    assert_source_parity("if n / 0\n  p yes\nelse\n  p no", json!({ "n": 1 }));
    assert_source_parity("span(class=[n / 0, 'a'])", json!({ "n": 1 }));
    assert_source_parity("each v in n / 0\n  i #{v}", json!({ "n": 1 }));
}

#[test]
fn objects_enumerate_in_key_order() {
    let object = json!({ "b": true, "2": true, "a": false, "10": true });
    assert_source_parity("span(class=c)", json!({ "c": object }));
    assert_source_parity("each v, k in o\n  i #{k}=#{v}", json!({ "o": object }));
    assert_source_parity("p #{JSON.stringify(o)}", json!({ "o": object }));
}

#[test]
fn control_flow_and_attributes() {
    let source = "case kind\n  when \"a\"\n    p A\n  when \"b\"\n    p B\n  default\n    p other";
    for kind in &["a", "b", "z"] {
        assert_source_parity(source, json!({ "kind": kind }));
    }
    let source = "case tags\n  when [\"a\"]\n    p same\n  default\n    p other";
    assert_source_parity(source, json!({ "tags": ["a"] }));
    let source = "if n == 1\n  p one\nelse if n == 2\n  p two\nelse\n  p many";
    for n in 1..4 {
        assert_source_parity(source, json!({ "n": n }));
    }
    assert_source_parity(
        "input(type=\"checkbox\", checked=on, title=t, data-raw!=t)",
        json!({ "on": true, "t": "a\"<b>" }),
    );
    assert_source_parity("input(checked=on, title=t)", json!({ "on": false, "t": null }));
}

#[test]
fn includes_and_inheritance() {
    let session = session(&[
        ("nav.made", "nav.menu#top(title=title)\n  a #{label}"),
        ("layout.made", "html\n  body\n    include(title=\"T\") nav\n    block content\n      p default"),
        ("page.made", "extends layout\nafter content\n  p #{label}"),
    ]);
    let template = compile(&session, "page.made");
    assert_parity(&template, json!({ "label": "<home>" }));
    assert_parity(&template, json!({}));
}

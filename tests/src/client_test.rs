use crate::support::{options, session};

use codegen::runtime::CLIENT_RUNTIME;

#[test]
fn wraps_the_program_in_a_function() {
    let js = compiler::compile_client("ul\n  each item in items\n    li #{item}", &options()).unwrap();
    assert!(js.starts_with(&format!("function(__made_locals){{var __made_view={};", CLIENT_RUNTIME)));
    assert!(js.contains(concat!(
        ";(function(items){__made_buf.push(\"<ul>\");",
        "__made_view.each((items),function(item){__made_buf.push(\"<li>\");",
        "__made_buf.push(__made_view.encode((item)));__made_buf.push(\"</li>\");});",
        "__made_buf.push(\"</ul>\");})(__made_locals[\"items\"]);"
    )));
    assert!(js.ends_with("return __made_buf.join(\"\");}"));
}

#[test]
fn nested_programs_receive_options_and_overrides() {
    let session = session(&[
        ("layout.made", "block content"),
        ("page.made", "extends(title=name) layout\nreplace content\n  p hi"),
    ]);
    let js = session
        .compile_client_file("/site/page.made", &options())
        .unwrap();
    assert!(js.contains("__made_view.block(__made_block,\"content\",function(){});"));
    assert!(js.contains(
        "})({\"title\":(name)},{\"content\":[null,function(){__made_buf.push(\"<p>hi</p>\");},null]});"
    ));
    assert!(js.contains("})(__made_locals[\"name\"]);"));
}

#[test]
fn dependency_tracking_returns_a_pair() {
    let session = session(&[("nav.made", "nav"), ("page.made", "include nav")]);
    let mut options = options();
    options.dep = true;
    let js = session
        .compile_client_file("/site/page.made", &options)
        .unwrap();
    assert!(js.contains("__made_dep.push({filename:\"/site/nav.made\","));
    assert!(js.ends_with("return [__made_buf.join(\"\"),__made_dep];}"));
}

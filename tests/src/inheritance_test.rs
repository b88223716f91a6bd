use crate::support::{compile, options, session};

use codegen::{DependencyKind, Program};
use serde_json::json;
use source::diagnostics::ErrorCode;

use std::path::Path;

const LAYOUT: &str = "html\n  body\n    block content\n      p default";

fn html(files: &[(&str, &str)], entry: &str) -> String {
    let session = session(files);
    compile(&session, entry).render(&json!({})).unwrap().html
}

#[test]
fn blocks_keep_their_default() {
    assert_eq!(
        html(&[("layout.made", LAYOUT), ("page.made", "extends layout")], "page.made"),
        "<html><body><p>default</p></body></html>"
    );
}

#[test]
fn after_appends_to_the_default() {
    let page = "extends layout\nreplace after content\n  p after";
    assert_eq!(
        html(&[("layout.made", LAYOUT), ("page.made", page)], "page.made"),
        "<html><body><p>default</p><p>after</p></body></html>"
    );
}

#[test]
fn replace_substitutes_the_default() {
    let page = "extends layout\n  replace content\n    p mine";
    assert_eq!(
        html(&[("layout.made", LAYOUT), ("page.made", page)], "page.made"),
        "<html><body><p>mine</p></body></html>"
    );
}

#[test]
fn overrides_of_one_block_compose() {
    let page = "extends layout\nappend content\n  p two\nprepend content\n  p zero\nappend content\n  p three";
    assert_eq!(
        html(&[("layout.made", LAYOUT), ("page.made", page)], "page.made"),
        "<html><body><p>zero</p><p>default</p><p>two</p><p>three</p></body></html>"
    );
}

#[test]
fn overrides_read_the_extending_files_context() {
    let session = session(&[
        ("layout.made", LAYOUT),
        ("page.made", "extends layout\nreplace content\n  p #{user}"),
    ]);
    let rendered = compile(&session, "page.made")
        .render(&json!({ "user": "Ann" }))
        .unwrap();
    assert_eq!(rendered.html, "<html><body><p>Ann</p></body></html>");
}

#[test]
fn options_become_the_nested_context() {
    let session = session(&[
        ("nav.made", "h1 #{title}"),
        ("page.made", "include(title=\"Hi #{name}\") nav"),
    ]);
    let rendered = compile(&session, "page.made")
        .render(&json!({ "name": "<Ann>" }))
        .unwrap();
    assert_eq!(rendered.html, "<h1>Hi &lt;Ann&gt;</h1>");
}

#[test]
fn entry_files_resolve_from_directories() {
    assert_eq!(
        html(
            &[("card/view.made", "div card"), ("page.made", "include card")],
            "page.made"
        ),
        "<div>card</div>"
    );
}

fn scope_ids(program: &Program) -> Vec<String> {
    let mut sids = vec![];
    program.walk_programs(&mut |program| sids.push(program.sid.clone()));
    sids
}

#[test]
fn instances_get_distinct_scope_ids() {
    let session = session(&[
        ("nav.made", "nav.menu#top"),
        ("page.made", "include nav:a\ninclude nav:b"),
    ]);
    let template = compile(&session, "page.made");
    let sids = scope_ids(template.program());
    assert_eq!(sids.len(), 3);
    assert_ne!(sids[1], sids[2]);
    let mut instances = vec![];
    template
        .program()
        .walk_programs(&mut |program| instances.push(program.instance.clone()));

    let html = template.render(&json!({})).unwrap().html;
    assert!(html.contains(&format!("{}-menu", sids[1])));
    assert!(html.contains(&format!("{}-menu", sids[2])));
    let ids = (1..3)
        .map(|i| {
            let mut id = format!("id=\"{}-", sids[i]);
            if !instances[i].is_empty() {
                id.push_str(&instances[i]);
                id.push('-');
            }
            id.push_str("top\"");
            id
        })
        .collect::<Vec<_>>();
    assert_ne!(ids[0], ids[1]);
    assert!(html.contains(&ids[0]), "{}", html);
    assert!(html.contains(&ids[1]), "{}", html);
}

#[test]
fn forced_instances_share_a_scope_id() {
    let session = session(&[
        ("nav.made", "nav.menu"),
        ("page.made", "include nav:a!shared\ninclude nav:b!shared"),
    ]);
    let sids = scope_ids(compile(&session, "page.made").program());
    assert_eq!(sids[1], sids[2]);
}

#[test]
fn dependencies_are_recorded_innermost_first() {
    let session = session(&[
        ("nav.made", "nav"),
        ("layout.made", "include(title=\"T\") nav\nblock content"),
        ("page.made", "extends layout"),
    ]);
    let mut options = options();
    options.dep = true;
    let rendered = session
        .compile_file("/site/page.made", &options)
        .unwrap()
        .render(&json!({}))
        .unwrap();
    assert_eq!(rendered.html, "<nav></nav>");
    let deps = &rendered.dependencies;
    assert_eq!(deps.len(), 2);
    assert_eq!(deps[0].filename, Path::new("/site/nav.made"));
    assert_eq!(deps[0].kind, DependencyKind::Include);
    assert_eq!(deps[0].options, json!({ "title": "T" }));
    assert_eq!(deps[1].filename, Path::new("/site/layout.made"));
    assert_eq!(deps[1].kind, DependencyKind::Extends);
}

#[test]
fn dependencies_are_off_by_default() {
    let session = session(&[("nav.made", "nav"), ("page.made", "include nav")]);
    let rendered = compile(&session, "page.made").render(&json!({})).unwrap();
    assert!(rendered.dependencies.is_empty());
}

#[test]
fn misspelled_blocks_suggest_a_declared_one() {
    let session = session(&[
        ("layout.made", LAYOUT),
        ("page.made", "extends layout\nreplace contnet\n  p x"),
    ]);
    let err = session
        .compile_file("/site/page.made", &options())
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::MissingBlock));
    assert_eq!(err.line(), Some(2));
    assert_eq!(err.filename(), Some(Path::new("/site/page.made")));
    assert!(err.message.contains("did you mean \"content\""));
}

#[test]
fn circular_includes_are_rejected() {
    let session = session(&[("a.made", "include b"), ("b.made", "include a")]);
    let err = session.compile_file("/site/a.made", &options()).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::CircularInheritance));
    assert_eq!(
        err.message,
        "Circular inheritance: /site/a.made -> /site/b.made -> /site/a.made"
    );
}

#[test]
fn errors_in_nested_files_name_that_file() {
    let session = session(&[("broken.made", "p\n  if (\n"), ("page.made", "include broken")]);
    let err = session
        .compile_file("/site/page.made", &options())
        .unwrap_err();
    assert_eq!(err.filename(), Some(Path::new("/site/broken.made")));
    assert_eq!(err.line(), Some(2));
}

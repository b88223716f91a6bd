use crate::support::{options, render};

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use serde_json::json;

/// Nesting depths of a run of `section` lines, each at most one deeper
/// than the line before it.
#[derive(Debug, Clone)]
struct Outline(Vec<usize>);

impl Arbitrary for Outline {
    fn arbitrary(g: &mut Gen) -> Self {
        let len = usize::arbitrary(g) % 12 + 1;
        let mut depths = vec![0];
        for _ in 1..len {
            let last = depths.last().copied().unwrap_or(0);
            depths.push(usize::arbitrary(g) % (last + 2));
        }
        Outline(depths)
    }
}

impl Outline {
    fn source(&self, unit: &str) -> String {
        self.0
            .iter()
            .map(|depth| format!("{}section", unit.repeat(*depth)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[quickcheck]
fn tabs_and_spaces_nest_alike(outline: Outline) -> bool {
    let tabs = compiler::compile(&outline.source("\t"), &options()).unwrap();
    let spaces = compiler::compile(&outline.source("    "), &options()).unwrap();
    tabs == spaces
}

#[quickcheck]
fn compiling_is_deterministic(outline: Outline) -> bool {
    let source = outline.source("  ");
    compiler::compile(&source, &options()).unwrap()
        == compiler::compile(&source, &options()).unwrap()
}

#[quickcheck]
fn interpolations_are_escaped(text: String) -> bool {
    let expected = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;");
    render("p #{text}", json!({ "text": text })) == format!("<p>{}</p>", expected)
}

#[quickcheck]
fn raw_interpolations_are_untouched(text: String) -> bool {
    render("p !{text}", json!({ "text": text })) == format!("<p>{}</p>", text)
}

use lazy_static::lazy_static;

use std::collections::HashSet;

lazy_static! {
    static ref SELF_CLOSING_TAGS: HashSet<&'static str> = [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link",
        "menuitem", "meta", "param", "source", "track", "wbr",
    ]
    .iter()
    .copied()
    .collect();
    static ref INLINE_TAGS: HashSet<&'static str> = [
        "a", "abbr", "acronym", "b", "br", "code", "em", "font", "i", "img", "ins", "kbd",
        "map", "samp", "small", "span", "strong", "sub", "sup",
    ]
    .iter()
    .copied()
    .collect();
}

/// Void elements: never given children or a closing tag.
pub fn is_self_closing(name: &str) -> bool {
    SELF_CLOSING_TAGS.contains(name)
}

/// Inline elements are never indented when pretty-printing.
pub fn is_inline(name: &str) -> bool {
    INLINE_TAGS.contains(name)
}

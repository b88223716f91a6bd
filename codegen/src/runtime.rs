//! Helpers rendered programs lean on, in Rust for `render` and as a
//! JavaScript object for serialized programs. Both produce the same text.

use crate::program::Format;

use expression::value::{class_list, display};
use serde_json::Value;

use std::borrow::Cow;

/// Escape `& < > "` for HTML text and attribute values.
pub fn encode(text: &str) -> Cow<'_, str> {
    if !text.contains(|ch| matches!(ch, '&' | '<' | '>' | '"')) {
        return Cow::Borrowed(text);
    }
    let mut encoded = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => encoded.push_str("&amp;"),
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '"' => encoded.push_str("&quot;"),
            _ => encoded.push(ch),
        }
    }
    Cow::Owned(encoded)
}

pub fn format(value: &Value, format: Format) -> String {
    match format {
        Format::Escape => encode(&display(value)).into_owned(),
        Format::Raw => display(value),
        Format::ClassList => encode(&class_list(value)).into_owned(),
    }
}

/// A computed attribute.
pub fn attr(name: &str, value: &Value, escape: bool) -> String {
    match value {
        Value::Bool(true) => format!(" {}", name),
        Value::Bool(false) | Value::Null => String::new(),
        value => {
            let text = display(value);
            let text = if escape { encode(&text) } else { Cow::Owned(text) };
            format!(" {}=\"{}\"", name, text)
        }
    }
}

/// A JavaScript string literal for `text`. JSON leaves U+2028 and U+2029
/// unescaped, which older JavaScript engines reject inside strings.
pub fn stringify(text: &str) -> String {
    serde_json::Value::String(text.to_string())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// The runtime object serialized programs reference as `__made_view`.
///
/// Non-finite numbers stand in for what `render` sees as null, so `nil`
/// and `ok` treat them that way wherever a value is written or tested.
pub const CLIENT_RUNTIME: &str = concat!(
    "{",
    "nil:function(v){return v==null||typeof v===\"number\"&&!isFinite(v)},",
    "ok:function(v){return !this.nil(v)&&!!v},",
    "str:function(v){return this.nil(v)?\"\":String(v)},",
    "encode:function(v){return this.str(v).replace(/[&<>\"]/g,function(c){",
    "return {\"&\":\"&amp;\",\"<\":\"&lt;\",\">\":\"&gt;\",'\"':\"&quot;\"}[c]})},",
    "cls:function(v){var out=[],self=this;(function walk(v){",
    "if(Array.isArray(v)){v.forEach(walk)}",
    "else if(v&&typeof v===\"object\"){Object.keys(v).forEach(function(k){if(self.ok(v[k]))out.push(k)})}",
    "else if(self.ok(v)){out.push(self.str(v))}})(v);return out.join(\" \")},",
    "attr:function(n,v,e){if(v===true)return \" \"+n;if(v===false||this.nil(v))return \"\";",
    "return \" \"+n+\"=\\\"\"+(e?this.encode(v):this.str(v))+\"\\\"\"},",
    "each:function(l,f){if(this.nil(l))return;",
    "if(Array.isArray(l)){for(var i=0;i<l.length;i++)f(l[i],i)}",
    "else if(typeof l===\"object\"){Object.keys(l).forEach(function(k){f(l[k],k)})}",
    "else{f(l,0)}},",
    "block:function(b,n,d){var c=b[n];if(!c){d();return}",
    "c[0]&&c[0]();c[1]?c[1]():d();c[2]&&c[2]()}",
    "}"
);

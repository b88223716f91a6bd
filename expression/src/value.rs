//! Loose, script-like semantics over `serde_json::Value`: truthiness,
//! stringification, arithmetic and comparison.

use serde_json::{Map, Number, Value};

use std::cmp::Ordering;
use std::convert::TryFrom;

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Build a number value, keeping integral results as integers so they
/// print without a fractional part. Non-finite results (`NaN`, division by
/// zero) become null, and render as null does.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// Integers beyond this magnitude can't be represented exactly by a script
/// number, so they print the way the nearest float does.
const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

#[allow(clippy::cast_precision_loss)]
pub fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        if i.unsigned_abs() <= MAX_SAFE_INTEGER {
            return i.to_string();
        }
        return format_float(i as f64);
    }
    if let Some(u) = n.as_u64() {
        if u <= MAX_SAFE_INTEGER {
            return u.to_string();
        }
        return format_float(u as f64);
    }
    n.as_f64().map_or_else(String::new, format_float)
}

/// `Number.prototype.toString`: the shortest round-tripping digits, in
/// positional notation for decimal exponents in `-6..21` and exponential
/// notation (`1e+21`, `1.5e-7`) outside it.
#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if f == 0.0 {
        return "0".to_string();
    }
    let sign = if f < 0.0 { "-" } else { "" };
    let scientific = format!("{:e}", f.abs());
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return format!("{}{}", sign, scientific),
    };
    let digits = mantissa.replace('.', "");
    let k = digits.len() as i64;
    let n = exponent.parse::<i64>().unwrap_or(0) + 1;
    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        format!("{}.{}", &digits[..n as usize], &digits[n as usize..])
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let exponent = if n - 1 < 0 {
            format!("e-{}", 1 - n)
        } else {
            format!("e+{}", n - 1)
        };
        if k == 1 {
            format!("{}{}", digits, exponent)
        } else {
            format!("{}.{}{}", &digits[..1], &digits[1..], exponent)
        }
    };
    format!("{}{}", sign, body)
}

/// Whether `key` is an array index, which scripts enumerate before every
/// other key, in ascending order.
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|&i| i != u32::MAX)
}

/// The entries of `map` in `Object.keys` order: array indices ascending,
/// then the remaining keys in insertion order.
pub fn ordered_entries(map: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut indices = vec![];
    let mut names = vec![];
    for (key, value) in map {
        match array_index(key) {
            Some(index) => indices.push((index, key, value)),
            None => names.push((key, value)),
        }
    }
    indices.sort_by_key(|(index, _, _)| *index);
    indices
        .into_iter()
        .map(|(_, key, value)| (key, value))
        .chain(names)
        .collect()
}

/// A copy of `value` with every object's keys in `Object.keys` order.
pub fn in_key_order(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(in_key_order).collect()),
        Value::Object(map) => Value::Object(
            ordered_entries(map)
                .into_iter()
                .map(|(key, item)| (key.clone(), in_key_order(item)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// The text a value renders as. `null` renders as nothing.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Flatten a class value: strings as-is, arrays recursively with falsy
/// entries skipped, objects contribute the keys whose values are truthy.
pub fn class_list(value: &Value) -> String {
    fn collect(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Array(items) => {
                for item in items {
                    collect(item, out);
                }
            }
            Value::Object(map) => {
                for (key, value) in ordered_entries(map) {
                    if truthy(value) {
                        out.push(key.clone());
                    }
                }
            }
            value if truthy(value) => out.push(display(value)),
            _ => {}
        }
    }
    let mut classes = vec![];
    collect(value, &mut classes);
    classes.join(" ")
}

pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Array(items) if items.is_empty() => 0.0,
        Value::Array(items) if items.len() == 1 => to_number(&items[0]),
        _ => f64::NAN,
    }
}

/// `typeof`; null reads as "undefined" since missing bindings are null.
pub fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "undefined",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) | Value::Object(_) => "object",
    }
}

fn is_stringy(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Array(_) | Value::Object(_))
}

pub fn add(left: &Value, right: &Value) -> Value {
    if is_stringy(left) || is_stringy(right) {
        let mut text = display(left);
        text.push_str(&display(right));
        Value::String(text)
    } else {
        number(to_number(left) + to_number(right))
    }
}

/// `===`. Arrays and objects are equal only when they are the same value
/// in memory. Values copied out of the context, such as a `case` subject
/// and its `when` values or the arguments of `indexOf`, are never the same
/// value, so containers never match there, unlike a script where both
/// sides may hold one shared reference.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            std::ptr::eq(left, right)
        }
        _ => left == right,
    }
}

pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(_), Value::String(_)) => left == right,
        (Value::Number(_), Value::String(_))
        | (Value::String(_), Value::Number(_))
        | (Value::Bool(_), _)
        | (_, Value::Bool(_)) => to_number(left) == to_number(right),
        _ => strict_equals(left, right),
    }
}

/// Relational comparison; strings compare lexicographically, everything
/// else numerically. `None` when the operands are unordered (NaN).
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => to_number(left).partial_cmp(&to_number(right)),
    }
}

/// Look a property up by reference. Computed properties such as `length`
/// aren't stored anywhere and are handled by `property`.
pub fn property_ref<'v>(object: &'v Value, key: &Value) -> Option<&'v Value> {
    match (object, key) {
        (Value::Object(map), key) => map.get(&display(key)),
        (Value::Array(items), Value::Number(n)) => n
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| items.get(i)),
        (Value::Array(items), Value::String(s)) => {
            s.parse::<usize>().ok().and_then(|i| items.get(i))
        }
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
pub fn property(object: &Value, key: &Value) -> Value {
    if let Some(value) = property_ref(object, key) {
        return value.clone();
    }
    match (object, key) {
        (Value::Array(items), Value::String(k)) if k == "length" => number(items.len() as f64),
        (Value::String(s), Value::String(k)) if k == "length" => {
            number(s.chars().count() as f64)
        }
        (Value::String(s), Value::Number(n)) => n
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| s.chars().nth(i))
            .map_or(Value::Null, |ch| Value::String(ch.to_string())),
        _ => Value::Null,
    }
}

/// Iterate a value the way `each` does: arrays by index, objects by key,
/// `null` not at all and any other value once with key `0`.
pub fn entries(value: &Value) -> Vec<(Value, Value)> {
    match value {
        Value::Null => vec![],
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.clone(), Value::from(i)))
            .collect(),
        Value::Object(map) => ordered_entries(map)
            .into_iter()
            .map(|(key, item)| (item.clone(), Value::String(key.clone())))
            .collect(),
        other => vec![(other.clone(), Value::from(0))],
    }
}

pub fn object(entries: impl IntoIterator<Item = (String, Value)>) -> Value {
    Value::Object(entries.into_iter().collect::<Map<String, Value>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use serde_json::json;

    #[test]
    fn display_rules() {
        assert_eq!(display(&json!(null)), "");
        assert_eq!(display(&json!(3)), "3");
        assert_eq!(display(&number(1.5)), "1.5");
        assert_eq!(display(&number(4.0)), "4");
        assert_eq!(display(&json!([1, "a", null])), "1,a,");
        assert_eq!(display(&json!({"a": 1})), "[object Object]");
    }

    #[test]
    fn class_lists() {
        assert_eq!(class_list(&json!(["a", null, "", ["b", false]])), "a b");
        assert_eq!(class_list(&json!({"on": true, "off": false})), "on");
        assert_eq!(class_list(&json!(null)), "");
    }

    #[test]
    fn loose_and_strict_equality() {
        assert!(loose_equals(&json!(1), &json!("1")));
        assert!(!strict_equals(&json!(1), &json!("1")));
        assert!(strict_equals(&json!(1), &json!(1.0)));
        assert!(loose_equals(&json!(null), &json!(null)));
        assert!(!loose_equals(&json!(null), &json!(0)));
    }

    #[test]
    fn addition_concatenates_strings() {
        assert_eq!(add(&json!("a"), &json!(1)), json!("a1"));
        assert_eq!(add(&json!(1), &json!(2)), json!(3));
        assert_eq!(add(&json!(true), &json!(null)), json!(1));
    }

    #[test]
    fn computed_properties() {
        assert_eq!(property(&json!([1, 2]), &json!("length")), json!(2));
        assert_eq!(property(&json!("héllo"), &json!("length")), json!(5));
        assert_eq!(property(&json!({"a": {"b": 1}}), &json!("a")), json!({"b": 1}));
        assert_eq!(property(&json!(7), &json!("a")), json!(null));
    }

    #[test]
    fn numbers_print_like_scripts() {
        let float = |n: f64| display(&number(n));
        assert_eq!(float(1e21), "1e+21");
        assert_eq!(float(1.5e21), "1.5e+21");
        assert_eq!(float(123_456.789), "123456.789");
        assert_eq!(float(0.000_001), "0.000001");
        assert_eq!(float(1.5e-7), "1.5e-7");
        assert_eq!(float(-2.5), "-2.5");
        assert_eq!(float(1e20), "100000000000000000000");
        assert_eq!(display(&json!(1e21)), "1e+21");
        assert_eq!(display(&json!(9_007_199_254_740_993_u64)), "9007199254740992");
        assert_eq!(format_float(f64::INFINITY), "Infinity");
        assert_eq!(display(&number(f64::INFINITY)), "");
    }

    #[quickcheck]
    fn printed_floats_read_back(f: f64) -> bool {
        !f.is_finite() || format_float(f).parse::<f64>() == Ok(f)
    }

    #[quickcheck]
    fn integers_print_plainly(i: i32) -> bool {
        display(&number(f64::from(i))) == i.to_string()
    }

    #[test]
    fn objects_enumerate_indices_first() {
        let object = json!({"b": true, "2": true, "10": true, "01": true, "a": false});
        assert_eq!(class_list(&object), "2 10 b 01");
        let keys = entries(&object)
            .into_iter()
            .map(|(_, key)| display(&key))
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["2", "10", "b", "01", "a"]);
    }

    #[test]
    fn each_entries() {
        assert!(entries(&json!(null)).is_empty());
        assert_eq!(entries(&json!(7)), vec![(json!(7), json!(0))]);
        assert_eq!(
            entries(&json!({"k": "v"})),
            vec![(json!("v"), json!("k"))]
        );
    }
}

//! Attribute lists: `(name="literal", flag, other=expr, raw!=html)`.

use crate::lexer::{check_text, span};
use crate::scan::State;

use diagnostics::error as errors;
use diagnostics::ParseResult as Result;

use expression::ast::{ExprKind, Lit};
use source::diagnostics::{Diagnostic, ErrorCode};
use syntax::ast::{AttrValue, Attribute};

/// Parses the text between an attribute list's parentheses. `base` is the
/// byte offset of that text in the template and `line` the line it starts on.
pub(crate) struct AttrParser<'a> {
    src: &'a str,
    base: usize,
    line: usize,
}

// Characters that, after whitespace, mean an attribute value keeps going
fn continues_expression(ch: char) -> bool {
    matches!(
        ch,
        '+' | '-' | '*' | '/' | '%' | '=' | '!' | '<' | '>' | '&' | '|' | '?' | ':' | '.' | '[' | '('
    )
}

/// Decode the escapes of a quoted attribute value. `\#` and `\!` are kept
/// so the interpolation splitter still sees them as escapes.
pub(crate) fn decode_literal(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            text.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('r') => text.push('\r'),
            Some(marker @ '#') | Some(marker @ '!') => {
                text.push('\\');
                text.push(marker);
            }
            // Anything short of four hex digits naming a char is kept verbatim
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                let decoded = Some(hex.as_str())
                    .filter(|hex| hex.len() == 4 && hex.chars().all(|ch| ch.is_ascii_hexdigit()))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .and_then(std::char::from_u32);
                match decoded {
                    Some(decoded) => {
                        text.push(decoded);
                        chars.nth(3);
                    }
                    None => text.push_str("\\u"),
                }
            }
            Some(other) => text.push(other),
            None => text.push('\\'),
        }
    }
    text
}

impl<'a> AttrParser<'a> {
    pub(crate) fn new(src: &'a str, base: usize, line: usize) -> Self {
        AttrParser { src, base, line }
    }

    fn line_at(&self, offset: usize) -> usize {
        self.line + self.src[..offset].matches('\n').count()
    }

    fn skip<F: Fn(char) -> bool>(&self, from: usize, pred: F) -> usize {
        let rest = &self.src[from..];
        from + rest.len() - rest.trim_start_matches(|ch: char| pred(ch)).len()
    }

    fn invalid_key(&self, offset: usize, message: String) -> Diagnostic {
        let at = self.base + offset;
        errors::lex_error(
            ErrorCode::InvalidKeyCharacter,
            message,
            span(at, at + 1),
            self.line_at(offset),
        )
    }

    pub(crate) fn parse(&self) -> Result<Vec<Attribute>> {
        let mut attrs = vec![];
        let mut i = 0;
        loop {
            i = self.skip(i, |ch| ch.is_whitespace() || ch == ',');
            if i >= self.src.len() {
                break;
            }
            let (name, next) = self.key(i)?;
            let mut j = self.skip(next, char::is_whitespace);
            let rest = &self.src[j..];
            let escaped = if rest.starts_with("!=") {
                j += 2;
                false
            } else if rest.starts_with('=') {
                j += 1;
                true
            } else if rest.starts_with('!') {
                let found = rest[1..].chars().next().unwrap_or(' ');
                return Err(self.invalid_key(
                    j + 1,
                    format!("Unexpected character `{}` expected `=`", found),
                ));
            } else {
                attrs.push(Attribute {
                    name,
                    value: AttrValue::Boolean,
                    escaped: true,
                });
                i = j;
                continue;
            };
            j = self.skip(j, |ch| ch == ' ' || ch == '\t');
            let end = self.value_end(j);
            let raw = self.src[j..end].trim();
            if raw.is_empty() {
                let at = self.base + j;
                return Err(errors::syntax_error(
                    span(at, at),
                    self.line_at(j),
                    &name,
                    "missing attribute value",
                ));
            }
            let value = self.classify(raw, j)?;
            attrs.push(Attribute {
                name,
                value,
                escaped,
            });
            i = end;
        }
        Ok(attrs)
    }

    fn key(&self, i: usize) -> Result<(String, usize)> {
        let rest = &self.src[i..];
        let first = rest.chars().next().unwrap_or(' ');
        if first == '"' || first == '\'' {
            return match rest[1..].find(first) {
                Some(close) => Ok((rest[1..=close].to_string(), i + close + 2)),
                None => {
                    let at = self.base + i;
                    Err(errors::unterminated_string(
                        span(at, self.base + self.src.len()),
                        self.line_at(i),
                    ))
                }
            };
        }
        let len = rest
            .find(|ch: char| ch == '=' || ch == '!' || ch == ',' || ch.is_whitespace())
            .unwrap_or_else(|| rest.len());
        if len == 0 {
            return Err(self.invalid_key(
                i,
                format!("Unexpected character `{}` expected an attribute name", first),
            ));
        }
        Ok((rest[..len].to_string(), i + len))
    }

    /// Find where the value starting at `from` ends: at a top-level comma or
    /// newline, or at whitespace once the value is a complete expression
    /// that the next token can't continue.
    fn value_end(&self, from: usize) -> usize {
        let mut state = State::new();
        for (offset, ch) in self.src[from..].char_indices() {
            let at = from + offset;
            if !state.is_string() && !state.is_nesting() {
                if ch == ',' || ch == '\n' {
                    return at;
                }
                if ch == ' ' || ch == '\t' {
                    let so_far = self.src[from..at].trim();
                    if !so_far.is_empty() && expression::parse(so_far).is_ok() {
                        match self.src[at..].trim_start().chars().next() {
                            Some(next) if continues_expression(next) => {}
                            _ => return at,
                        }
                    }
                }
            }
            state.parse_char(ch);
        }
        self.src.len()
    }

    fn classify(&self, raw: &str, offset: usize) -> Result<AttrValue> {
        let line = self.line_at(offset);
        let at = self.base + offset;
        let expr = expression::parse(raw).map_err(|err| {
            errors::syntax_error(span(at, at + raw.len()), line, raw, err.message)
        })?;
        let quoted = raw.len() >= 2
            && ((raw.starts_with('"') && raw.ends_with('"'))
                || (raw.starts_with('\'') && raw.ends_with('\'')));
        if quoted && matches!(expr.kind, ExprKind::Lit(Lit::Str(_))) {
            let text = decode_literal(&raw[1..raw.len() - 1]);
            check_text(&text, at + 1, line)?;
            Ok(AttrValue::Literal(text))
        } else {
            Ok(AttrValue::Expr(raw.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Vec<Attribute> {
        AttrParser::new(src, 0, 1).parse().unwrap()
    }

    fn attr(name: &str, value: AttrValue, escaped: bool) -> Attribute {
        Attribute {
            name: name.to_string(),
            value,
            escaped,
        }
    }

    #[test]
    fn literals_expressions_and_booleans() {
        assert_eq!(
            parse(r#"type="checkbox", checked, value=item.id"#),
            vec![
                attr("type", AttrValue::Literal("checkbox".into()), true),
                attr("checked", AttrValue::Boolean, true),
                attr("value", AttrValue::Expr("item.id".into()), true),
            ]
        );
    }

    #[test]
    fn whitespace_and_newline_separated() {
        let attrs = parse("a=b + 1 c='x'\n  d");
        assert_eq!(
            attrs,
            vec![
                attr("a", AttrValue::Expr("b + 1".into()), true),
                attr("c", AttrValue::Literal("x".into()), true),
                attr("d", AttrValue::Boolean, true),
            ]
        );
    }

    #[test]
    fn commas_inside_values_dont_split() {
        let attrs = parse(r#"data=[1, 2], title="a, b""#);
        assert_eq!(attrs[0].value, AttrValue::Expr("[1, 2]".into()));
        assert_eq!(attrs[1].value, AttrValue::Literal("a, b".into()));
    }

    #[test]
    fn unescaped_and_quoted_keys() {
        let attrs = parse(r#"'data-x'!=html"#);
        assert_eq!(attrs, vec![attr("data-x", AttrValue::Expr("html".into()), false)]);
    }

    #[test]
    fn interpolation_escapes_survive_decoding() {
        let attrs = parse(r#"title="\#{raw} #{x}""#);
        assert_eq!(attrs[0].value, AttrValue::Literal(r"\#{raw} #{x}".into()));
    }

    #[test]
    fn unicode_escapes() {
        assert_eq!(decode_literal(r"caf\u00e9"), "café");
        assert_eq!(decode_literal(r"a\u12"), r"a\u12");
        assert_eq!(decode_literal(r"\u12zz!"), r"\u12zz!");
        assert_eq!(decode_literal(r"\ud800x"), r"\ud800x");
        assert_eq!(decode_literal(r"end\u"), r"end\u");
    }

    #[test]
    fn invalid_key_character() {
        let err = AttrParser::new("a!b", 0, 1).parse().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidKeyCharacter));
        let err = AttrParser::new("=b", 0, 1).parse().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidKeyCharacter));
    }

    #[test]
    fn malformed_values_are_syntax_errors() {
        let err = AttrParser::new("a=(b +)", 0, 3).parse().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SyntaxError));
        assert_eq!(err.line(), Some(3));
    }
}

//! Splitting text into literal runs and `#{expr}` / `!{expr}` interpolations.

use crate::scan::{parse_max, ScanError};

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    Interpolation {
        expr: String,
        /// `#{}` output is HTML-escaped, `!{}` output isn't
        escape: bool,
        /// Byte offset of the expression within the text
        offset: usize,
    },
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Literal(last)) = segments.last_mut() {
        last.push_str(text);
    } else {
        segments.push(Segment::Literal(text.to_string()));
    }
}

/// Split `text` into segments. `\#{` and `\!{` are literal escapes. Adjacent
/// literal runs are always merged into one segment.
pub fn split(text: &str) -> Result<Vec<Segment>, ScanError> {
    let mut segments = vec![];
    let bytes = text.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let marker = bytes[i] == b'#' || bytes[i] == b'!';
        if bytes[i] == b'\\'
            && i + 2 < bytes.len()
            && (bytes[i + 1] == b'#' || bytes[i + 1] == b'!')
            && bytes[i + 2] == b'{'
        {
            push_literal(&mut segments, &text[literal_start..i]);
            push_literal(&mut segments, &text[i + 1..i + 3]);
            i += 3;
            literal_start = i;
        } else if marker && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            push_literal(&mut segments, &text[literal_start..i]);
            let start = i + 2;
            let end = parse_max(text, start, '{')?;
            segments.push(Segment::Interpolation {
                expr: text[start..end].to_string(),
                escape: bytes[i] == b'#',
                offset: start,
            });
            i = end + 1;
            literal_start = i;
        } else {
            i += 1;
        }
    }
    push_literal(&mut segments, &text[literal_start..]);
    Ok(segments)
}

/// Whether `text` contains any interpolation at all.
pub fn is_plain(segments: &[Segment]) -> bool {
    segments
        .iter()
        .all(|segment| matches!(segment, Segment::Literal(_)))
}

//! Bracket and string aware scanning over embedded expression text.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// Input ended while a bracket was still open
    BracketMismatch(char),
    /// Input ended inside a quoted string
    UnterminatedString,
    /// A closing bracket didn't match the innermost open one
    IncorrectNesting { open: char, close: char },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanError {
    pub kind: ScanErrorKind,
    /// Byte offset into the scanned text
    pub offset: usize,
}

fn closer(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Scan `src` from byte offset `start`, which must sit just past an opening
/// bracket `open`, and return the byte offset of the bracket that closes it.
/// Brackets inside string literals are ignored.
pub fn parse_max(src: &str, start: usize, open: char) -> Result<usize, ScanError> {
    let mut stack = vec![open];
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, ch) in src[start..].char_indices() {
        let offset = start + offset;
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '(' | '[' | '{' => stack.push(ch),
            ')' | ']' | '}' => {
                let open = stack.pop().unwrap_or(open);
                if closer(open) != ch {
                    return Err(ScanError {
                        kind: ScanErrorKind::IncorrectNesting { open, close: ch },
                        offset,
                    });
                }
                if stack.is_empty() {
                    return Ok(offset);
                }
            }
            _ => {}
        }
    }
    let kind = if quote.is_some() {
        ScanErrorKind::UnterminatedString
    } else {
        ScanErrorKind::BracketMismatch(stack.last().copied().unwrap_or(open))
    };
    Err(ScanError {
        kind,
        offset: src.len(),
    })
}

/// Track bracket depth and string state while walking text one character
/// at a time.
#[derive(Debug, Default, Clone)]
pub struct State {
    stack: Vec<char>,
    quote: Option<char>,
    escaped: bool,
}

impl State {
    pub fn new() -> Self {
        State::default()
    }

    pub fn parse_char(&mut self, ch: char) {
        if let Some(q) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == q {
                self.quote = None;
            }
            return;
        }
        match ch {
            '"' | '\'' | '`' => self.quote = Some(ch),
            '(' | '[' | '{' => self.stack.push(ch),
            ')' | ']' | '}' => {
                self.stack.pop();
            }
            _ => {}
        }
    }

    pub fn is_string(&self) -> bool {
        self.quote.is_some()
    }

    pub fn is_nesting(&self) -> bool {
        !self.stack.is_empty()
    }
}

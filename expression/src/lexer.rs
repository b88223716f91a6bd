use crate::reader::Reader;
use crate::token::{token, Keyword, Token, TokenKind};

use diagnostics::ParseResult as Result;

use source::diagnostics::{ByteIndex, Diagnostic, ErrorCode, Label, Span};

use std::collections::VecDeque;
use std::iter::Iterator;

trait IdentChar {
    fn is_id_char(&self) -> bool;
    fn is_id_start(&self) -> bool;
    fn is_id_continue(&self) -> bool;
    fn is_whitespace(&self) -> bool;
}

impl IdentChar for char {
    fn is_id_char(&self) -> bool {
        self.is_id_start() || self.is_id_continue()
    }

    fn is_id_start(&self) -> bool {
        use ucd::Codepoint;
        match *self {
            ch if Codepoint::is_id_start(ch) => true,
            ch if Codepoint::is_id_start_other(ch) => true,
            '$' | '_' => true,
            _ => false,
        }
    }

    fn is_id_continue(&self) -> bool {
        use ucd::Codepoint;
        Codepoint::is_id_continue(*self) || Codepoint::is_id_continue_other(*self)
    }

    fn is_whitespace(&self) -> bool {
        use ucd::Codepoint;
        Codepoint::is_whitespace(*self)
    }
}

/// Tokenizer for embedded expressions.
pub struct Lexer<'a> {
    reader: Reader<'a>,
    source: &'a str,
    lookahead: VecDeque<Token>,
}

fn lex_error(message: &str, span: Span) -> Diagnostic {
    Diagnostic::error()
        .with_code(ErrorCode::SyntaxError)
        .with_message(message)
        .with_labels(vec![Label::primary(span)])
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let reader = Reader::new(source);
        Lexer {
            reader,
            source,
            lookahead: VecDeque::with_capacity(2),
        }
    }

    fn next_char(&mut self) -> Option<char> {
        self.reader.next()
    }

    fn peek_char(&mut self) -> Option<&char> {
        self.reader.peek()
    }

    fn start_span(&mut self) -> ByteIndex {
        self.reader.start()
    }

    fn end_span(&mut self, pos: ByteIndex) -> Span {
        self.reader.end(pos)
    }

    fn eat(&mut self, ch: char) {
        let next_ch = self.next_char();
        debug_assert_eq!(Some(ch), next_ch);
    }

    fn skip_while<F>(&mut self, pred: F)
    where
        F: Fn(char) -> bool,
    {
        loop {
            match self.peek_char() {
                Some(&ch) if pred(ch) => {
                    self.eat(ch);
                }
                _ => return,
            }
        }
    }

    fn skip_whitespace(&mut self) {
        self.skip_while(|ch| ch.is_whitespace());
    }

    fn slice(&self, start: ByteIndex, end: ByteIndex) -> &'a str {
        &self.source[start.to_usize()..end.to_usize()]
    }

    // Read a token containing a single character
    fn punc(&mut self, kind: TokenKind, token_char: char) -> Result<Token> {
        let span_start = self.start_span();
        self.eat(token_char);
        let span = self.end_span(span_start);
        Ok(token(kind, span))
    }

    // Read a token that may be extended by a following `=` (`<=`, `>=`)
    fn punc_equals(&mut self, single: TokenKind, double: TokenKind, ch: char) -> Result<Token> {
        let span_start = self.start_span();
        self.eat(ch);
        let kind = if self.peek_char() == Some(&'=') {
            self.eat('=');
            double
        } else {
            single
        };
        Ok(token(kind, self.end_span(span_start)))
    }

    // `&&` and `||`; the single-character forms are bitwise operators,
    // which templates don't support
    fn punc2(&mut self, kind: TokenKind, ch: char) -> Result<Token> {
        let span_start = self.start_span();
        self.eat(ch);
        if self.peek_char() == Some(&ch) {
            self.eat(ch);
            Ok(token(kind, self.end_span(span_start)))
        } else {
            let span = self.end_span(span_start);
            Err(lex_error(&format!("Unsupported operator `{}`", ch), span))
        }
    }

    /**
     * Tokenize a number literal. Integers, decimals and exponents
     * are all represented as f64.
     */
    fn number(&mut self) -> Result<Token> {
        let span_start = self.start_span();
        let start = self.reader.offset();
        self.skip_while(|ch| ch.is_ascii_digit());
        if self.peek_char() == Some(&'.') {
            self.eat('.');
            self.skip_while(|ch| ch.is_ascii_digit());
        }
        if let Some(&ch) = self.peek_char() {
            if ch == 'e' || ch == 'E' {
                self.eat(ch);
                if let Some(&sign) = self.peek_char() {
                    if sign == '+' || sign == '-' {
                        self.eat(sign);
                    }
                }
                self.skip_while(|ch| ch.is_ascii_digit());
            }
        }
        let end = self.reader.offset();
        let span = self.end_span(span_start);
        match self.slice(start, end).parse::<f64>() {
            Ok(value) => Ok(token(TokenKind::Number(value), span)),
            Err(_) => Err(lex_error("Invalid number", span)),
        }
    }

    /**
     * Parses a single word as either a user-defined identifier
     * or a reserved word (keyword).
     */
    fn ident(&mut self) -> Result<Token> {
        use TokenKind::{Ident, Reserved};
        let span_start = self.start_span();
        let start = self.reader.offset();
        self.skip_while(|ch| ch.is_id_char());
        let end = self.reader.offset();
        let span = self.reader.end(span_start);
        let ident = self.slice(start, end);
        let kind = match ident {
            "true" => Reserved(Keyword::True),
            "false" => Reserved(Keyword::False),
            "null" => Reserved(Keyword::Null),
            "undefined" => Reserved(Keyword::Undefined),
            "typeof" => Reserved(Keyword::Typeof),
            _ => Ident(ident.to_string()),
        };
        Ok(token(kind, span))
    }

    fn string(&mut self, quote: char) -> Result<Token> {
        let span_start = self.reader.start();
        self.eat(quote);
        let mut value = String::new();
        loop {
            match self.next_char() {
                Some(ch) if ch == quote => break,
                Some('\\') => match self.next_char() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some('u') => {
                        let start = self.reader.offset();
                        for _ in 0..4 {
                            self.next_char();
                        }
                        let end = self.reader.offset();
                        let decoded = u32::from_str_radix(self.slice(start, end), 16)
                            .ok()
                            .and_then(std::char::from_u32);
                        match decoded {
                            Some(ch) => value.push(ch),
                            None => {
                                let span = self.end_span(span_start);
                                return Err(lex_error("Invalid unicode escape", span));
                            }
                        }
                    }
                    // Line continuation
                    Some('\n') => {}
                    Some(ch) => value.push(ch),
                    None => {
                        let span = self.end_span(span_start);
                        return Err(lex_error("Unterminated string literal", span));
                    }
                },
                Some('\n') | None => {
                    let span = self.end_span(span_start);
                    return Err(lex_error("Unterminated string literal", span));
                }
                Some(ch) => value.push(ch),
            }
        }
        let span = self.reader.end(span_start);
        Ok(token(TokenKind::Str(value), span))
    }

    fn equals(&mut self) -> Result<Token> {
        let span_start = self.start_span();
        self.eat('=');
        if self.peek_char() != Some(&'=') {
            let span = self.end_span(span_start);
            return Err(lex_error("Assignment is not allowed in template expressions", span));
        }
        self.eat('=');
        let kind = if self.peek_char() == Some(&'=') {
            self.eat('=');
            TokenKind::TripleEquals
        } else {
            TokenKind::DblEquals
        };
        Ok(token(kind, self.end_span(span_start)))
    }

    fn exclaim(&mut self) -> Result<Token> {
        let span_start = self.start_span();
        self.eat('!');
        let kind = if self.peek_char() == Some(&'=') {
            self.eat('=');
            if self.peek_char() == Some(&'=') {
                self.eat('=');
                TokenKind::NotDblEquals
            } else {
                TokenKind::NotEquals
            }
        } else {
            TokenKind::Exclaim
        };
        Ok(token(kind, self.end_span(span_start)))
    }

    fn question(&mut self) -> Result<Token> {
        let span_start = self.reader.start();
        self.eat('?');
        let kind = match self.peek_char() {
            Some('.') => {
                self.eat('.');
                TokenKind::QuestionDot
            }
            Some('?') => {
                self.eat('?');
                TokenKind::Nullish
            }
            _ => TokenKind::Question,
        };
        let span = self.reader.end(span_start);
        Ok(token(kind, span))
    }

    pub fn next_token(&mut self) -> Result<Token> {
        use TokenKind::*;
        // Read from the lookahead if its populated.
        if let Some(token) = self.lookahead.pop_front() {
            return Ok(token);
        }
        self.skip_whitespace();
        match self.peek_char() {
            Some(&ch) if ch.is_ascii_digit() => self.number(),
            Some(&ch) if ch.is_id_start() => self.ident(),
            Some('"') => self.string('"'),
            Some('\'') => self.string('\''),
            Some('=') => self.equals(),
            Some('!') => self.exclaim(),
            Some('?') => self.question(),
            Some('<') => self.punc_equals(LessThan, LessThanEquals, '<'),
            Some('>') => self.punc_equals(GreaterThan, GreaterThanEquals, '>'),
            Some('&') => self.punc2(And, '&'),
            Some('|') => self.punc2(Or, '|'),
            Some('+') => self.punc(Plus, '+'),
            Some('-') => self.punc(Minus, '-'),
            Some('*') => self.punc(Mul, '*'),
            Some('/') => self.punc(Div, '/'),
            Some('%') => self.punc(Mod, '%'),
            Some('(') => self.punc(LParen, '('),
            Some(')') => self.punc(RParen, ')'),
            Some('[') => self.punc(LBrace, '['),
            Some(']') => self.punc(RBrace, ']'),
            Some('{') => self.punc(LCurlyBrace, '{'),
            Some('}') => self.punc(RCurlyBrace, '}'),
            Some(':') => self.punc(Colon, ':'),
            Some('.') => self.punc(Dot, '.'),
            Some(',') => self.punc(Comma, ','),
            Some(&ch) => {
                let span_start = self.start_span();
                self.eat(ch);
                let span = self.end_span(span_start);
                Err(lex_error(&format!("Unexpected character `{}`", ch), span))
            }
            None => {
                let span_start = self.start_span();
                Ok(token(EOF, self.end_span(span_start)))
            }
        }
    }

    pub fn peek_token(&mut self) -> Result<&Token> {
        if self.lookahead.is_empty() {
            let token = self.next_token()?;
            self.lookahead.push_back(token);
        }
        match self.lookahead.front() {
            Some(token) => Ok(token),
            None => Err(Diagnostic::error().with_message("Lookahead is empty")),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(Token {
                kind: TokenKind::EOF,
                ..
            }) => None,
            result => Some(result),
        }
    }
}

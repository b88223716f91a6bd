// renaming this Tokenizer for now because it reads better next to Parser
use crate::ast::{self, Expr, ExprKind, Ident, Lit, Property};
use crate::lexer::Lexer as Tokenizer;
use crate::precedence::Precedence;
use crate::token::{Keyword, Token, TokenKind};

use diagnostics::ParseResult as Result;

use source::diagnostics::{ByteIndex, Diagnostic, ErrorCode, Label, Span};

use log::debug;

pub struct Parser<'s> {
    /// The tokenizer/lexer for this Parser instance
    tokenizer: Tokenizer<'s>,
    /// The span of the current token
    span: Span,
}

trait DiagnosticReporting {
    fn fatal(&self, message: &str, label: &str, span: Span) -> Diagnostic;
}

impl DiagnosticReporting for Parser<'_> {
    fn fatal(&self, message: &str, label_message: &str, span: Span) -> Diagnostic {
        let label = Label::primary(span).with_message(label_message);
        Diagnostic::error()
            .with_code(ErrorCode::SyntaxError)
            .with_message(message)
            .with_labels(vec![label])
    }
}

/// Parse `source` as a single, complete expression.
pub fn parse(source: &str) -> Result<Expr> {
    Parser::new(source).parse_expression()
}

impl Parser<'_> {
    pub fn new(source: &str) -> Parser<'_> {
        let tokenizer = Tokenizer::new(source);
        // Start with a dummy span
        let span = Span::new(ByteIndex(0), ByteIndex(0));
        Parser { tokenizer, span }
    }

    /// Returns the next token from the tokenizer.
    fn next_token(&mut self) -> Result<Token> {
        let token = self.tokenizer.next_token()?;
        self.span = token.span;
        Ok(token)
    }

    fn peek(&mut self) -> Result<&Token> {
        self.tokenizer.peek_token()
    }

    fn peek_kind(&mut self) -> Result<TokenKind> {
        Ok(self.peek()?.kind.clone())
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool> {
        if &self.peek()?.kind == kind {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        let prev_span = self.span;
        let token = self.next_token()?;
        if &token.kind == kind {
            Ok(token)
        } else {
            Err(Diagnostic::error()
                .with_code(ErrorCode::SyntaxError)
                .with_message(format!("Expected `{}` but found `{}`", kind, token.kind))
                .with_labels(vec![
                    Label::primary(prev_span)
                        .with_message(format!("Expected {} after this token", kind)),
                    Label::secondary(self.span).with_message("But we found this instead"),
                ]))
        }
    }

    fn peek_precedence(&mut self) -> Result<Precedence> {
        Ok(self.peek()?.precedence())
    }

    fn ident(&mut self) -> Result<Ident> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Ident(name) => Ok(Ident {
                name,
                span: token.span,
            }),
            // Keywords are fine as property names, e.g. `options.default`
            TokenKind::Reserved(keyword) => Ok(Ident {
                name: keyword.as_str().to_string(),
                span: token.span,
            }),
            _ => Err(self.fatal(
                "Unexpected token",
                "Expected an identifier",
                token.span,
            )),
        }
    }

    /// Parse the entire input as one expression; trailing tokens are an error.
    pub fn parse_expression(&mut self) -> Result<Expr> {
        let expr = self.expr(Precedence::NONE)?;
        let token = self.next_token()?;
        if token.kind == TokenKind::EOF {
            Ok(expr)
        } else {
            Err(self.fatal(
                &format!("Unexpected `{}` after expression", token.kind),
                "Expected the expression to end here",
                token.span,
            ))
        }
    }

    pub(crate) fn expr(&mut self, precedence: Precedence) -> Result<Expr> {
        debug!("expr (precedence: {:?})", precedence);
        let mut expr = self.prefix_expr()?;
        while precedence < self.peek_precedence()? {
            expr = self.infix_expr(expr)?;
        }
        Ok(expr)
    }

    fn prefix_expr(&mut self) -> Result<Expr> {
        match self.peek_kind()? {
            TokenKind::Number(value) => {
                self.next_token()?;
                ast::expr(ExprKind::Lit(Lit::Number(value)), self.span)
            }
            TokenKind::Str(value) => {
                self.next_token()?;
                ast::expr(ExprKind::Lit(Lit::Str(value)), self.span)
            }
            TokenKind::Reserved(Keyword::True) => {
                self.next_token()?;
                ast::expr(ExprKind::Lit(Lit::Bool(true)), self.span)
            }
            TokenKind::Reserved(Keyword::False) => {
                self.next_token()?;
                ast::expr(ExprKind::Lit(Lit::Bool(false)), self.span)
            }
            TokenKind::Reserved(Keyword::Null) | TokenKind::Reserved(Keyword::Undefined) => {
                self.next_token()?;
                ast::expr(ExprKind::Lit(Lit::Null), self.span)
            }
            TokenKind::Ident(_) => {
                let ident = self.ident()?;
                let span = ident.span;
                ast::expr(ExprKind::Reference(ident), span)
            }
            // Array literals
            TokenKind::LBrace => {
                self.next_token()?;
                let lo = self.span;
                let exprs = self.expr_list(&TokenKind::RBrace)?;
                let span = lo.merge(self.span);
                ast::expr(ExprKind::Array(exprs), span)
            }
            TokenKind::LCurlyBrace => self.object_expr(),
            // Unary expressions
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Exclaim
            | TokenKind::Reserved(Keyword::Typeof) => {
                let token = self.next_token()?;
                let lo = self.span;
                let op = match token.to_un_op() {
                    Some(op) => op,
                    None => return Err(self.fatal("Expected an operator", "Here", lo)),
                };
                let expr = self.expr(Precedence::PREFIX)?;
                let span = lo.merge(self.span);
                ast::expr(ExprKind::Unary(op, Box::new(expr)), span)
            }
            // Group expression
            TokenKind::LParen => {
                self.next_token()?;
                let lo = self.span;
                let mut expr = self.expr(Precedence::NONE)?;
                self.expect(&TokenKind::RParen)?;
                // Update the expression to include the wrapping parens
                expr.span = lo.merge(self.span);
                Ok(expr)
            }
            _ => {
                let token = self.next_token()?;
                Err(self.fatal(
                    &format!("Unexpected `{}`", token.kind),
                    "We expected an expression here",
                    token.span,
                ))
            }
        }
    }

    fn infix_expr(&mut self, left: Expr) -> Result<Expr> {
        use TokenKind::*;
        match self.peek_kind()? {
            Plus | Minus | Mul | Div | Mod | DblEquals | TripleEquals | NotEquals
            | NotDblEquals | LessThan | LessThanEquals | GreaterThan | GreaterThanEquals
            | And | Or | Nullish => self.binary_expr(left),
            Question => self.cond_expr(left),
            LParen => self.call_expr(left),
            LBrace => self.index_expr(left),
            Dot | QuestionDot => self.member_expr(left),
            _ => {
                let token = self.next_token()?;
                Err(self.fatal("Unknown infix expression", "Here", token.span))
            }
        }
    }

    fn member_expr(&mut self, object: Expr) -> Result<Expr> {
        // `?.` behaves like `.`; missing values already read as null
        self.next_token()?;
        let property = self.ident()?;
        let span = object.span.merge(self.span);
        ast::expr(ExprKind::Member(Box::new(object), property), span)
    }

    fn index_expr(&mut self, object: Expr) -> Result<Expr> {
        self.expect(&TokenKind::LBrace)?;
        let index = self.expr(Precedence::NONE)?;
        self.expect(&TokenKind::RBrace)?;
        let span = object.span.merge(self.span);
        ast::expr(ExprKind::Index(Box::new(object), Box::new(index)), span)
    }

    fn expr_list(&mut self, terminator: &TokenKind) -> Result<Vec<Expr>> {
        let mut exprs = vec![];
        loop {
            if self.eat(terminator)? {
                break;
            }
            let expr = self.expr(Precedence::NONE)?;
            exprs.push(expr);
            // If we find a comma, move on
            if self.eat(&TokenKind::Comma)? {
                continue;
            }
            self.expect(terminator)?;
            break;
        }
        Ok(exprs)
    }

    fn object_expr(&mut self) -> Result<Expr> {
        self.expect(&TokenKind::LCurlyBrace)?;
        let lo = self.span;
        let mut properties = vec![];
        loop {
            if self.eat(&TokenKind::RCurlyBrace)? {
                break;
            }
            let token = self.next_token()?;
            let key = match token.kind {
                TokenKind::Ident(name) => name,
                TokenKind::Str(value) => value,
                TokenKind::Number(value) => value.to_string(),
                TokenKind::Reserved(keyword) => keyword.as_str().to_string(),
                _ => {
                    return Err(self.fatal(
                        "Invalid object key",
                        "Expected an identifier or string",
                        token.span,
                    ))
                }
            };
            let key_span = token.span;
            if self.eat(&TokenKind::Colon)? {
                let value = self.expr(Precedence::NONE)?;
                properties.push(Property {
                    key,
                    value,
                    shorthand: false,
                });
            } else {
                let value = Expr {
                    kind: ExprKind::Reference(Ident {
                        name: key.clone(),
                        span: key_span,
                    }),
                    span: key_span,
                };
                properties.push(Property {
                    key,
                    value,
                    shorthand: true,
                });
            }
            if self.eat(&TokenKind::Comma)? {
                continue;
            }
            self.expect(&TokenKind::RCurlyBrace)?;
            break;
        }
        let span = lo.merge(self.span);
        ast::expr(ExprKind::Object(properties), span)
    }

    fn call_expr(&mut self, callee: Expr) -> Result<Expr> {
        self.expect(&TokenKind::LParen)?;
        let lo = callee.span;
        let arguments = self.expr_list(&TokenKind::RParen)?;
        let span = lo.merge(self.span);
        ast::expr(ExprKind::Call(Box::new(callee), arguments), span)
    }

    fn binary_expr(&mut self, left: Expr) -> Result<Expr> {
        let lo = left.span;
        let (op, precedence) = {
            let token = self.next_token()?;
            let precedence = token.precedence();
            match token.to_bin_op() {
                Some(op) => (op, precedence),
                None => return Err(self.fatal("Expected a binary operator", "Here", token.span)),
            }
        };
        let right = self.expr(precedence)?;
        let kind = ExprKind::Binary(op, Box::new(left), Box::new(right));
        let span = lo.merge(self.span);
        ast::expr(kind, span)
    }

    fn cond_expr(&mut self, test: Expr) -> Result<Expr> {
        self.expect(&TokenKind::Question)?;
        let consequent = self.expr(Precedence::NONE)?;
        self.expect(&TokenKind::Colon)?;
        let alt = self.expr(Precedence::NONE)?;
        let span = test.span.merge(self.span);
        ast::expr(
            ExprKind::Cond(Box::new(test), Box::new(consequent), Box::new(alt)),
            span,
        )
    }
}

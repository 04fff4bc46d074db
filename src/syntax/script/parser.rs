//! Hand-written recursive descent parser for script blocks.
//!
//! Statements are parsed top-down; expressions go through a Pratt core
//! with precedence climbing. A `<` in expression-head position starts an
//! embedded markup element; after an expression it is the comparison
//! operator.
//!
//! Parsing is bounded by a fuel counter so a pathological input turns
//! into a regular [`SyntaxError`] instead of an unbounded parse.

use super::ast::*;
use super::lexer::{STATEMENT_KEYWORDS, Token};
use crate::syntax::{Span, SyntaxError};
use compact_str::format_compact;
use logos::Logos;

/// Upper bound on parser steps per script block.
pub const PARSER_FUEL: u32 = 100_000;

/// Parse a script block into a [`Module`].
///
/// Spans in the result and in any error are byte offsets relative to
/// `source`.
pub fn parse(source: &str) -> Result<Module, SyntaxError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let snippet = &source[span.clone()];
                return Err(SyntaxError::new(
                    span,
                    format!("unrecognized token `{snippet}`"),
                ));
            }
        }
    }

    let mut stream = TokenStream::new(&tokens);
    let mut stmts = Vec::new();
    while !stream.at_end() {
        stmts.push(parse_stmt(&mut stream)?);
    }
    Ok(Module { stmts })
}

/// Token stream with lookahead and span tracking.
///
/// Each token is paired with its byte span from the source, enabling
/// accurate error locations. The fuel counter is shared by all parse
/// functions operating on the stream.
struct TokenStream<'src> {
    tokens: &'src [(Token, Span)],
    pos: usize,
    fuel: u32,
}

impl<'src> TokenStream<'src> {
    fn new(tokens: &'src [(Token, Span)]) -> Self {
        Self {
            tokens,
            pos: 0,
            fuel: PARSER_FUEL,
        }
    }

    /// Peek at the current token without consuming it.
    fn peek(&self) -> Option<&'src Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Peek at the nth token ahead without consuming.
    fn peek_nth(&self, n: usize) -> Option<&'src Token> {
        self.tokens.get(self.pos + n).map(|(tok, _)| tok)
    }

    /// Advance to the next token and return the consumed one.
    fn advance(&mut self) -> Option<&'src Token> {
        let token = self.tokens.get(self.pos).map(|(tok, _)| tok);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token kind.
    fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Expect a specific token, advance past it, and return its span.
    fn expect(&mut self, expected: Token) -> Result<Span, SyntaxError> {
        if self.check(&expected) {
            let start = self.pos;
            self.advance();
            Ok(self.span_from(start))
        } else {
            Err(unexpected(
                self.peek(),
                &format!("`{expected}`"),
                self.current_span(),
            ))
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current_pos(&self) -> usize {
        self.pos
    }

    /// Byte span from the token at index `start` through the last
    /// consumed token.
    fn span_from(&self, start: usize) -> Span {
        let start_byte = self
            .tokens
            .get(start)
            .map(|(_, span)| span.start)
            .unwrap_or_else(|| self.current_span().start);
        let end_byte = if self.pos > 0 {
            self.tokens
                .get(self.pos - 1)
                .map(|(_, span)| span.end)
                .unwrap_or(start_byte)
        } else {
            start_byte
        };
        start_byte..end_byte
    }

    /// Span of the current token, or a zero-width span at the end of
    /// input.
    fn current_span(&self) -> Span {
        if let Some((_, span)) = self.tokens.get(self.pos) {
            span.clone()
        } else if let Some((_, span)) = self.tokens.last() {
            span.end..span.end
        } else {
            0..0
        }
    }

    /// Spend one unit of fuel.
    fn burn(&mut self) -> Result<(), SyntaxError> {
        if self.fuel == 0 {
            return Err(SyntaxError::new(
                self.current_span(),
                format!("script exceeded the parser work limit of {PARSER_FUEL} steps"),
            ));
        }
        self.fuel -= 1;
        Ok(())
    }
}

fn unexpected(found: Option<&Token>, expected: &str, span: Span) -> SyntaxError {
    match found {
        Some(token) => SyntaxError::new(span, format!("expected {expected}, found `{token}`")),
        None => SyntaxError::new(span, format!("expected {expected}, found end of input")),
    }
}

fn parse_ident(stream: &mut TokenStream) -> Result<Ident, SyntaxError> {
    let span = stream.current_span();
    match stream.advance() {
        Some(Token::Ident(name)) => Ok(Ident {
            name: name.clone(),
            span,
        }),
        other => Err(unexpected(other, "an identifier", span)),
    }
}

// === Statements ===

fn parse_stmt(stream: &mut TokenStream) -> Result<Stmt, SyntaxError> {
    stream.burn()?;
    let start = stream.current_pos();

    match stream.peek() {
        Some(Token::Export) => {
            stream.advance();
            let inner = parse_stmt(stream)?;
            if !matches!(inner.kind, StmtKind::Binding { .. } | StmtKind::Function(_)) {
                return Err(SyntaxError::new(
                    inner.span.clone(),
                    "`export` must be followed by a binding or `fn` declaration",
                ));
            }
            let span = stream.span_from(start);
            Ok(Stmt {
                kind: StmtKind::Export(Box::new(inner)),
                span,
            })
        }
        Some(Token::Let) => parse_binding(stream, BindingKind::Let),
        Some(Token::Const) => parse_binding(stream, BindingKind::Const),
        Some(Token::Var) => parse_binding(stream, BindingKind::Var),
        Some(Token::Import) => parse_import(stream),
        Some(Token::Fn) => parse_function(stream),
        Some(Token::Return) => parse_return(stream),
        Some(Token::If) => parse_if(stream),
        Some(Token::Ident(word)) if looks_like_misspelled_keyword(stream, word) => {
            let span = stream.current_span();
            let suggestions = keyword_suggestions(word);
            Err(
                SyntaxError::new(span, format!("unknown statement keyword `{word}`"))
                    .with_suggestions(suggestions),
            )
        }
        _ => {
            let expr = parse_expr(stream)?;
            stream.expect(Token::Semicolon)?;
            let span = stream.span_from(start);
            Ok(Stmt {
                kind: StmtKind::Expr(expr),
                span,
            })
        }
    }
}

fn parse_binding(stream: &mut TokenStream, kind: BindingKind) -> Result<Stmt, SyntaxError> {
    let start = stream.current_pos();
    // Binding keyword, already matched by the caller.
    stream.advance();
    let name = parse_ident(stream)?;

    let ty = if stream.check(&Token::Colon) {
        stream.advance();
        Some(parse_type(stream)?)
    } else {
        None
    };

    stream.expect(Token::Eq)?;
    let init = parse_expr(stream)?;
    stream.expect(Token::Semicolon)?;

    Ok(Stmt {
        kind: StmtKind::Binding {
            kind,
            name,
            ty,
            init,
        },
        span: stream.span_from(start),
    })
}

/// Import: `import { a, b } from "source";` or `import name from "source";`.
fn parse_import(stream: &mut TokenStream) -> Result<Stmt, SyntaxError> {
    let start = stream.current_pos();
    stream.expect(Token::Import)?;

    let mut names = Vec::new();
    if stream.check(&Token::LBrace) {
        stream.advance();
        while !matches!(stream.peek(), Some(Token::RBrace)) {
            names.push(parse_ident(stream)?);
            if !matches!(stream.peek(), Some(Token::RBrace)) {
                stream.expect(Token::Comma)?;
            }
        }
        stream.expect(Token::RBrace)?;
    } else {
        names.push(parse_ident(stream)?);
    }

    stream.expect(Token::From)?;
    let span = stream.current_span();
    let source = match stream.advance() {
        Some(Token::String(s)) => s.clone(),
        other => return Err(unexpected(other, "a module path string", span)),
    };
    stream.expect(Token::Semicolon)?;

    Ok(Stmt {
        kind: StmtKind::Import { names, source },
        span: stream.span_from(start),
    })
}

fn parse_function(stream: &mut TokenStream) -> Result<Stmt, SyntaxError> {
    let start = stream.current_pos();
    stream.expect(Token::Fn)?;
    let name = parse_ident(stream)?;

    stream.expect(Token::LParen)?;
    let mut params = Vec::new();
    while !matches!(stream.peek(), Some(Token::RParen)) {
        let name = parse_ident(stream)?;
        let ty = if stream.check(&Token::Colon) {
            stream.advance();
            Some(parse_type(stream)?)
        } else {
            None
        };
        params.push(Param { name, ty });

        if !matches!(stream.peek(), Some(Token::RParen)) {
            stream.expect(Token::Comma)?;
        }
    }
    stream.expect(Token::RParen)?;

    let ret = if stream.check(&Token::Arrow) {
        stream.advance();
        Some(parse_type(stream)?)
    } else {
        None
    };

    let body = parse_block(stream)?;

    Ok(Stmt {
        kind: StmtKind::Function(Function {
            name,
            params,
            ret,
            body,
        }),
        span: stream.span_from(start),
    })
}

fn parse_return(stream: &mut TokenStream) -> Result<Stmt, SyntaxError> {
    let start = stream.current_pos();
    stream.expect(Token::Return)?;

    let value = if stream.check(&Token::Semicolon) {
        None
    } else {
        Some(parse_expr(stream)?)
    };
    stream.expect(Token::Semicolon)?;

    Ok(Stmt {
        kind: StmtKind::Return(value),
        span: stream.span_from(start),
    })
}

fn parse_if(stream: &mut TokenStream) -> Result<Stmt, SyntaxError> {
    let start = stream.current_pos();
    stream.expect(Token::If)?;
    let cond = parse_expr(stream)?;
    let then_branch = parse_block(stream)?;

    let else_branch = if stream.check(&Token::Else) {
        stream.advance();
        if stream.check(&Token::If) {
            // `else if` chains nest as a single-statement else branch
            Some(vec![parse_if(stream)?])
        } else {
            Some(parse_block(stream)?)
        }
    } else {
        None
    };

    Ok(Stmt {
        kind: StmtKind::If {
            cond,
            then_branch,
            else_branch,
        },
        span: stream.span_from(start),
    })
}

fn parse_block(stream: &mut TokenStream) -> Result<Vec<Stmt>, SyntaxError> {
    stream.expect(Token::LBrace)?;
    let mut stmts = Vec::new();
    while !matches!(stream.peek(), Some(Token::RBrace) | None) {
        stmts.push(parse_stmt(stream)?);
    }
    stream.expect(Token::RBrace)?;
    Ok(stmts)
}

fn parse_type(stream: &mut TokenStream) -> Result<TypeAnnotation, SyntaxError> {
    let start = stream.current_pos();
    let span = stream.current_span();
    let name = match stream.advance() {
        Some(Token::Ident(name)) => name.clone(),
        other => return Err(unexpected(other, "a type name", span)),
    };

    let mut args = Vec::new();
    if stream.check(&Token::Lt) {
        stream.advance();
        loop {
            args.push(parse_type(stream)?);
            if stream.check(&Token::Comma) {
                stream.advance();
            } else {
                break;
            }
        }
        stream.expect(Token::Gt)?;
    }

    Ok(TypeAnnotation {
        name,
        args,
        span: stream.span_from(start),
    })
}

// === Expressions ===

fn parse_expr(stream: &mut TokenStream) -> Result<Expr, SyntaxError> {
    parse_pratt(stream, 0)
}

/// Binary operator metadata: (precedence, operator). Higher precedence
/// binds tighter; all operators are left-associative.
fn binary_op_info(token: &Token) -> Option<(u8, BinaryOp)> {
    match token {
        Token::OrOr => Some((10, BinaryOp::Or)),
        Token::AndAnd => Some((20, BinaryOp::And)),
        Token::EqEq => Some((30, BinaryOp::Eq)),
        Token::BangEq => Some((30, BinaryOp::NotEq)),
        Token::Lt => Some((30, BinaryOp::Lt)),
        Token::LtEq => Some((30, BinaryOp::LtEq)),
        Token::Gt => Some((30, BinaryOp::Gt)),
        Token::GtEq => Some((30, BinaryOp::GtEq)),
        Token::Plus => Some((40, BinaryOp::Add)),
        Token::Minus => Some((40, BinaryOp::Sub)),
        Token::Star => Some((50, BinaryOp::Mul)),
        Token::Slash => Some((50, BinaryOp::Div)),
        Token::Percent => Some((50, BinaryOp::Rem)),
        _ => None,
    }
}

/// Pratt core: binary operators with precedence climbing.
fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, SyntaxError> {
    stream.burn()?;
    let mut left = parse_prefix(stream)?;

    while let Some(token) = stream.peek() {
        let Some((prec, op)) = binary_op_info(token) else {
            break;
        };
        if prec < min_prec {
            break;
        }

        stream.advance();
        let right = parse_pratt(stream, prec + 1)?;

        let span = left.span.start..right.span.end;
        left = Expr {
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            },
            span,
        };
    }

    Ok(left)
}

/// Prefix position: unary operators, embedded markup, arrow functions,
/// or a postfix chain.
fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, SyntaxError> {
    match stream.peek() {
        Some(Token::Minus | Token::Bang) => parse_unary(stream),
        // `<` at expression head opens a markup element
        Some(Token::Lt) => {
            let element = parse_element(stream)?;
            let span = element.span.clone();
            Ok(Expr {
                kind: ExprKind::Element(element),
                span,
            })
        }
        Some(Token::Ident(_)) if matches!(stream.peek_nth(1), Some(Token::FatArrow)) => {
            parse_arrow(stream)
        }
        Some(Token::LParen) if arrow_ahead(stream) => parse_arrow(stream),
        _ => parse_postfix(stream),
    }
}

/// Whether the `(` at the current position opens an arrow parameter
/// list rather than a parenthesized expression: scan to the matching
/// `)` and look for `=>` right after it.
fn arrow_ahead(stream: &TokenStream) -> bool {
    let mut depth = 0usize;
    let mut n = 0usize;
    loop {
        match stream.peek_nth(n) {
            Some(Token::LParen) => depth += 1,
            Some(Token::RParen) => {
                depth -= 1;
                if depth == 0 {
                    return matches!(stream.peek_nth(n + 1), Some(Token::FatArrow));
                }
            }
            None => return false,
            _ => {}
        }
        n += 1;
    }
}

/// Arrow function: `x => expr`, `(a, b: Num) => expr`, or either form
/// with a `{ .. }` block body.
fn parse_arrow(stream: &mut TokenStream) -> Result<Expr, SyntaxError> {
    let start = stream.current_pos();

    let mut params = Vec::new();
    if stream.check(&Token::LParen) {
        stream.advance();
        while !matches!(stream.peek(), Some(Token::RParen)) {
            let name = parse_ident(stream)?;
            let ty = if stream.check(&Token::Colon) {
                stream.advance();
                Some(parse_type(stream)?)
            } else {
                None
            };
            params.push(Param { name, ty });

            if !matches!(stream.peek(), Some(Token::RParen)) {
                stream.expect(Token::Comma)?;
            }
        }
        stream.expect(Token::RParen)?;
    } else {
        let name = parse_ident(stream)?;
        params.push(Param { name, ty: None });
    }

    stream.expect(Token::FatArrow)?;

    let body = if stream.check(&Token::LBrace) {
        ArrowBody::Block(parse_block(stream)?)
    } else {
        ArrowBody::Expr(parse_pratt(stream, 0)?)
    };

    Ok(Expr {
        kind: ExprKind::Arrow {
            params,
            body: Box::new(body),
        },
        span: stream.span_from(start),
    })
}

fn parse_unary(stream: &mut TokenStream) -> Result<Expr, SyntaxError> {
    let span = stream.current_span();
    let op = match stream.advance() {
        Some(Token::Minus) => UnaryOp::Neg,
        Some(Token::Bang) => UnaryOp::Not,
        other => return Err(unexpected(other, "a unary operator", span)),
    };

    let operand = parse_prefix(stream)?;
    let span = span.start..operand.span.end;

    Ok(Expr {
        kind: ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    })
}

/// Postfix chains: member access, calls, and indexing.
fn parse_postfix(stream: &mut TokenStream) -> Result<Expr, SyntaxError> {
    let mut expr = parse_atom(stream)?;

    loop {
        match stream.peek() {
            Some(Token::Dot) => {
                stream.advance();
                let property = parse_ident(stream)?;
                let span = expr.span.start..property.span.end;
                expr = Expr {
                    kind: ExprKind::Member {
                        object: Box::new(expr),
                        property,
                    },
                    span,
                };
            }
            Some(Token::LParen) => {
                let (args, close) = parse_call_args(stream)?;
                let span = expr.span.start..close.end;
                expr = Expr {
                    kind: ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    },
                    span,
                };
            }
            Some(Token::LBracket) => {
                stream.advance();
                let index = parse_expr(stream)?;
                let close = stream.expect(Token::RBracket)?;
                let span = expr.span.start..close.end;
                expr = Expr {
                    kind: ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                };
            }
            _ => break,
        }
    }

    Ok(expr)
}

fn parse_call_args(stream: &mut TokenStream) -> Result<(Vec<Expr>, Span), SyntaxError> {
    stream.expect(Token::LParen)?;

    let mut args = Vec::new();
    while !matches!(stream.peek(), Some(Token::RParen)) {
        args.push(parse_expr(stream)?);

        if !matches!(stream.peek(), Some(Token::RParen)) {
            stream.expect(Token::Comma)?;
        }
    }

    let close = stream.expect(Token::RParen)?;
    Ok((args, close))
}

fn parse_atom(stream: &mut TokenStream) -> Result<Expr, SyntaxError> {
    let span = stream.current_span();
    match stream.advance() {
        Some(Token::Number(n)) => Ok(Expr {
            kind: ExprKind::Number(*n),
            span,
        }),
        Some(Token::String(s)) => Ok(Expr {
            kind: ExprKind::String(s.clone()),
            span,
        }),
        Some(Token::True) => Ok(Expr {
            kind: ExprKind::Bool(true),
            span,
        }),
        Some(Token::False) => Ok(Expr {
            kind: ExprKind::Bool(false),
            span,
        }),
        Some(Token::Null) => Ok(Expr {
            kind: ExprKind::Null,
            span,
        }),
        Some(Token::Ident(name)) => Ok(Expr {
            kind: ExprKind::Ident(name.clone()),
            span,
        }),
        Some(Token::LParen) => {
            let inner = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            Ok(inner)
        }
        Some(Token::LBracket) => parse_array(stream, span),
        Some(Token::LBrace) => parse_object(stream, span),
        other => Err(unexpected(other, "an expression", span)),
    }
}

/// Array literal; the opening `[` has already been consumed.
fn parse_array(stream: &mut TokenStream, open: Span) -> Result<Expr, SyntaxError> {
    let mut elements = Vec::new();
    while !matches!(stream.peek(), Some(Token::RBracket)) {
        elements.push(parse_expr(stream)?);

        if !matches!(stream.peek(), Some(Token::RBracket)) {
            stream.expect(Token::Comma)?;
        }
    }
    let close = stream.expect(Token::RBracket)?;

    Ok(Expr {
        kind: ExprKind::Array(elements),
        span: open.start..close.end,
    })
}

/// Object literal; the opening `{` has already been consumed.
fn parse_object(stream: &mut TokenStream, open: Span) -> Result<Expr, SyntaxError> {
    let mut fields = Vec::new();
    while !matches!(stream.peek(), Some(Token::RBrace)) {
        let key_span = stream.current_span();
        let key = match stream.advance() {
            Some(Token::Ident(name)) => Ident {
                name: name.clone(),
                span: key_span,
            },
            Some(Token::String(s)) => Ident {
                name: s.clone(),
                span: key_span,
            },
            other => return Err(unexpected(other, "an object key", key_span)),
        };
        stream.expect(Token::Colon)?;
        let value = parse_expr(stream)?;
        fields.push(ObjectField { key, value });

        if !matches!(stream.peek(), Some(Token::RBrace)) {
            stream.expect(Token::Comma)?;
        }
    }
    let close = stream.expect(Token::RBrace)?;

    Ok(Expr {
        kind: ExprKind::Object(fields),
        span: open.start..close.end,
    })
}

// === Embedded markup ===

/// Parse `<name attr..>children..</name>` or `<name attr../>`.
///
/// Children are restricted to nested elements, `{ expr }`
/// interpolations, and string-literal text.
fn parse_element(stream: &mut TokenStream) -> Result<Element, SyntaxError> {
    stream.burn()?;
    let open = stream.expect(Token::Lt)?;
    let name = parse_ident(stream)?;

    let mut attrs = Vec::new();
    while matches!(stream.peek(), Some(Token::Ident(_))) {
        attrs.push(parse_attr(stream)?);
    }

    match stream.peek() {
        Some(Token::Slash) => {
            stream.advance();
            let close = stream.expect(Token::Gt)?;
            return Ok(Element {
                name,
                attrs,
                children: Vec::new(),
                self_closing: true,
                span: open.start..close.end,
            });
        }
        Some(Token::Gt) => {
            stream.advance();
        }
        other => {
            return Err(unexpected(
                other,
                "`>`, `/>`, or an attribute",
                stream.current_span(),
            ));
        }
    }

    let mut children = Vec::new();
    loop {
        match stream.peek() {
            Some(Token::Lt) if matches!(stream.peek_nth(1), Some(Token::Slash)) => {
                stream.advance();
                stream.advance();
                let closing = parse_ident(stream)?;
                if closing.name != name.name {
                    return Err(SyntaxError::new(
                        closing.span,
                        format!(
                            "mismatched closing tag: expected `</{}>`, found `</{}>`",
                            name.name, closing.name
                        ),
                    ));
                }
                let close = stream.expect(Token::Gt)?;
                return Ok(Element {
                    name,
                    attrs,
                    children,
                    self_closing: false,
                    span: open.start..close.end,
                });
            }
            Some(Token::Lt) => {
                children.push(ElementChild::Element(parse_element(stream)?));
            }
            Some(Token::LBrace) => {
                stream.advance();
                let expr = parse_expr(stream)?;
                stream.expect(Token::RBrace)?;
                children.push(ElementChild::Expr(expr));
            }
            Some(Token::String(text)) => {
                let text = text.clone();
                stream.advance();
                children.push(ElementChild::Text(text));
            }
            Some(_) => {
                return Err(unexpected(
                    stream.peek(),
                    "a child element, `{` interpolation, string literal, or closing tag",
                    stream.current_span(),
                ));
            }
            None => {
                return Err(SyntaxError::new(
                    stream.current_span(),
                    format!("unterminated element `<{}>`", name.name),
                ));
            }
        }
    }
}

/// Attribute: `name`, `name:suffix`, `name="text"` or `name={expr}`.
fn parse_attr(stream: &mut TokenStream) -> Result<Attr, SyntaxError> {
    let start = stream.current_pos();
    let first = parse_ident(stream)?;

    let name = if stream.check(&Token::Colon) {
        stream.advance();
        let suffix = parse_ident(stream)?;
        format_compact!("{}:{}", first.name, suffix.name)
    } else {
        first.name
    };

    let value = if stream.check(&Token::Eq) {
        stream.advance();
        match stream.peek() {
            Some(Token::LBrace) => {
                stream.advance();
                let expr = parse_expr(stream)?;
                stream.expect(Token::RBrace)?;
                Some(expr)
            }
            _ => {
                let span = stream.current_span();
                match stream.advance() {
                    Some(Token::String(s)) => Some(Expr {
                        kind: ExprKind::String(s.clone()),
                        span,
                    }),
                    other => {
                        return Err(unexpected(
                            other,
                            "an attribute value (string literal or `{expr}`)",
                            span,
                        ));
                    }
                }
            }
        }
    } else {
        None
    };

    Ok(Attr {
        name,
        value,
        span: stream.span_from(start),
    })
}

// === Misspelling suggestions ===

/// A statement that opens with two identifiers in a row is never valid;
/// when the first is close to a statement keyword, report it as a
/// misspelling instead of a generic expression error.
fn looks_like_misspelled_keyword(stream: &TokenStream, word: &str) -> bool {
    matches!(
        stream.peek_nth(1),
        Some(Token::Ident(_) | Token::Fn | Token::Let | Token::Const | Token::Var)
    ) && !keyword_suggestions(word).is_empty()
}

/// Statement keywords within edit distance 2 of `word`, sharing its
/// first character.
fn keyword_suggestions(word: &str) -> Vec<String> {
    STATEMENT_KEYWORDS
        .iter()
        .filter(|kw| kw.bytes().next() == word.bytes().next() && levenshtein(word, kw) <= 2)
        .map(|kw| kw.to_string())
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

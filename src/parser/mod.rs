pub mod ast;

use crate::diagnostics::CompileError;
use crate::lexer::token::Token;
use crate::span::{Span, Spanned};
use ast::*;

pub struct Parser<'a> {
    tokens: &'a [Spanned<Token>],
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Spanned<Token>], source: &'a str) -> Self {
        Self { tokens, source, pos: 0 }
    }

    fn peek(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Spanned<Token>> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&Spanned<Token>> {
        if self.pos < self.tokens.len() {
            let tok = &self.tokens[self.pos];
            self.pos += 1;
            Some(tok)
        } else {
            None
        }
    }

    fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(tok)
            if std::mem::discriminant(&tok.node) == std::mem::discriminant(expected))
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<&Spanned<Token>, CompileError> {
        match self.tokens.get(self.pos) {
            Some(tok) if std::mem::discriminant(&tok.node) == std::mem::discriminant(expected) => {
                self.pos += 1;
                Ok(&self.tokens[self.pos - 1])
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected {expected}, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                format!("expected {expected}, found end of file"),
                self.eof_span(),
            )),
        }
    }

    fn expect_ident(&mut self) -> Result<Spanned<String>, CompileError> {
        match self.tokens.get(self.pos) {
            Some(tok) if matches!(tok.node, Token::Ident) => {
                let name = self.source[tok.span.start..tok.span.end].to_string();
                self.pos += 1;
                Ok(Spanned::new(name, tok.span))
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected identifier, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                "expected identifier, found end of file",
                self.eof_span(),
            )),
        }
    }

    fn eof_span(&self) -> Span {
        if let Some(last) = self.tokens.last() {
            Span::new(last.span.end, last.span.end)
        } else {
            Span::dummy()
        }
    }

    pub fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut classes = Vec::new();
        while self.check(&Token::Class) {
            classes.push(self.parse_class()?);
        }

        if self.peek().is_none() {
            return Err(CompileError::syntax(
                "expected a top-level statement after class declarations",
                self.eof_span(),
            ));
        }
        let statement = self.parse_statement()?;

        if let Some(extra) = self.peek() {
            return Err(CompileError::syntax(
                format!("unexpected {} after the top-level statement", extra.node),
                extra.span,
            ));
        }

        Ok(Program { classes, statement })
    }

    // ==================== Declarations ====================

    fn parse_class(&mut self) -> Result<Spanned<ClassDecl>, CompileError> {
        let class_tok = self.expect(&Token::Class)?;
        let start = class_tok.span.start;
        let name = self.expect_ident()?;

        let type_params = if self.eat(&Token::Lt) {
            let mut params = Vec::new();
            while !self.check(&Token::Gt) {
                if !params.is_empty() {
                    self.expect(&Token::Comma)?;
                }
                params.push(self.expect_ident()?);
            }
            self.expect(&Token::Gt)?;
            params
        } else {
            Vec::new()
        };

        let extends = if self.eat(&Token::Extends) {
            let super_name = self.expect_ident()?;
            let type_args = if self.eat(&Token::Lt) {
                self.parse_type_args(&type_params)?
            } else {
                Vec::new()
            };
            Some(Extends { name: super_name, type_args })
        } else {
            None
        };

        self.expect(&Token::LBrace)?;

        let mut fields = Vec::new();
        let mut ctor: Option<Spanned<Constructor>> = None;
        let mut methods = Vec::new();

        while !self.check(&Token::RBrace) {
            if self.check(&Token::Constructor) {
                let c = self.parse_constructor(&type_params)?;
                if ctor.is_some() {
                    return Err(CompileError::syntax(
                        format!("class '{}' has more than one constructor", name.node),
                        c.span,
                    ));
                }
                ctor = Some(c);
            } else if self.check(&Token::Public) || self.check(&Token::Private) {
                methods.push(self.parse_method(&type_params)?);
            } else if self.peek().is_some() {
                let ty = self.parse_member_type(&type_params)?;
                let fname = self.expect_ident()?;
                self.expect(&Token::Semi)?;
                fields.push(Field { ty, name: fname });
            } else {
                return Err(CompileError::syntax(
                    format!("unclosed body of class '{}'", name.node),
                    self.eof_span(),
                ));
            }
        }
        let close = self.expect(&Token::RBrace)?;
        let end = close.span.end;

        let ctor = ctor.ok_or_else(|| {
            CompileError::syntax(
                format!("class '{}' has no constructor", name.node),
                Span::new(start, end),
            )
        })?;

        Ok(Spanned::new(
            ClassDecl { name, type_params, extends, fields, ctor, methods },
            Span::new(start, end),
        ))
    }

    fn parse_constructor(
        &mut self,
        type_params: &[Spanned<String>],
    ) -> Result<Spanned<Constructor>, CompileError> {
        let ctor_tok = self.expect(&Token::Constructor)?;
        let start = ctor_tok.span.start;
        self.expect(&Token::LParen)?;
        let params = self.parse_params(type_params)?;
        self.expect(&Token::RParen)?;
        let body = self.parse_statement()?;
        let end = body.span.end;
        Ok(Spanned::new(Constructor { params, body }, Span::new(start, end)))
    }

    fn parse_method(
        &mut self,
        type_params: &[Spanned<String>],
    ) -> Result<Spanned<MethodDecl>, CompileError> {
        let (access, start) = match self.peek() {
            Some(tok) if matches!(tok.node, Token::Public) => (Access::Public, tok.span.start),
            Some(tok) if matches!(tok.node, Token::Private) => (Access::Private, tok.span.start),
            Some(tok) => {
                return Err(CompileError::syntax(
                    format!("expected 'public' or 'private', found {}", tok.node),
                    tok.span,
                ))
            }
            None => {
                return Err(CompileError::syntax(
                    "expected a method declaration, found end of file",
                    self.eof_span(),
                ))
            }
        };
        self.advance();

        let return_type = self.parse_return_type(type_params)?;
        let name = self.expect_ident()?;
        self.expect(&Token::LParen)?;
        let params = self.parse_params(type_params)?;
        self.expect(&Token::RParen)?;
        let body = self.parse_statement()?;
        let end = body.span.end;

        Ok(Spanned::new(
            MethodDecl { access, return_type, name, params, body },
            Span::new(start, end),
        ))
    }

    fn parse_params(
        &mut self,
        type_params: &[Spanned<String>],
    ) -> Result<Vec<Param>, CompileError> {
        let mut params = Vec::new();
        while !self.check(&Token::RParen) {
            if !params.is_empty() {
                self.expect(&Token::Comma)?;
            }
            let ty = self.parse_member_type(type_params)?;
            let name = self.expect_ident()?;
            params.push(Param { ty, name });
        }
        Ok(params)
    }

    // ==================== Types ====================

    /// Type in class-member position: a bare identifier names one of the
    /// enclosing class's type parameters if it matches, a class otherwise.
    fn parse_member_type(
        &mut self,
        type_params: &[Spanned<String>],
    ) -> Result<Spanned<TypeExpr>, CompileError> {
        match self.peek() {
            Some(tok) if matches!(tok.node, Token::Int) => {
                let span = tok.span;
                self.advance();
                Ok(Spanned::new(TypeExpr::Int, span))
            }
            Some(tok) if matches!(tok.node, Token::Boolean) => {
                let span = tok.span;
                self.advance();
                Ok(Spanned::new(TypeExpr::Boolean, span))
            }
            Some(tok) if matches!(tok.node, Token::Ident) => {
                let name = self.expect_ident()?;
                let span = name.span;
                if self.eat(&Token::Lt) {
                    let args = self.parse_type_args(type_params)?;
                    Ok(Spanned::new(TypeExpr::Class { name: name.node, args }, span))
                } else if type_params.iter().any(|p| p.node == name.node) {
                    Ok(Spanned::new(TypeExpr::Var(name.node), span))
                } else {
                    Ok(Spanned::new(
                        TypeExpr::Class { name: name.node, args: Vec::new() },
                        span,
                    ))
                }
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected a type, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax("expected a type, found end of file", self.eof_span())),
        }
    }

    /// Type in local-declaration position: a bare identifier names a class.
    fn parse_local_type(&mut self) -> Result<Spanned<TypeExpr>, CompileError> {
        match self.peek() {
            Some(tok) if matches!(tok.node, Token::Int) => {
                let span = tok.span;
                self.advance();
                Ok(Spanned::new(TypeExpr::Int, span))
            }
            Some(tok) if matches!(tok.node, Token::Boolean) => {
                let span = tok.span;
                self.advance();
                Ok(Spanned::new(TypeExpr::Boolean, span))
            }
            _ => {
                let name = self.expect_ident()?;
                let args = if self.eat(&Token::Lt) {
                    self.parse_type_args(&[])?
                } else {
                    Vec::new()
                };
                let span = name.span;
                Ok(Spanned::new(TypeExpr::Class { name: name.node, args }, span))
            }
        }
    }

    /// Comma-separated type arguments up to and including the closing `>`.
    /// The opening `<` has already been consumed.
    fn parse_type_args(
        &mut self,
        type_params: &[Spanned<String>],
    ) -> Result<Vec<TypeExpr>, CompileError> {
        let mut args = Vec::new();
        while !self.check(&Token::Gt) {
            if !args.is_empty() {
                self.expect(&Token::Comma)?;
            }
            args.push(self.parse_member_type(type_params)?.node);
        }
        self.expect(&Token::Gt)?;
        Ok(args)
    }

    fn parse_return_type(
        &mut self,
        type_params: &[Spanned<String>],
    ) -> Result<Spanned<TypeExpr>, CompileError> {
        if let Some(tok) = self.peek() {
            if matches!(tok.node, Token::Void) {
                let span = tok.span;
                self.advance();
                return Ok(Spanned::new(TypeExpr::Void, span));
            }
        }
        self.parse_member_type(type_params)
    }

    // ==================== Statements ====================

    pub fn parse_statement(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let tok = self.peek().ok_or_else(|| {
            CompileError::syntax("expected a statement, found end of file", self.eof_span())
        })?;
        let start = tok.span.start;

        match tok.node {
            Token::LBrace => self.parse_block(),
            Token::Super => {
                self.advance();
                self.expect(&Token::LParen)?;
                let args = self.parse_args()?;
                self.expect(&Token::RParen)?;
                let semi = self.expect(&Token::Semi)?;
                let end = semi.span.end;
                Ok(Spanned::new(Stmt::Super(args), Span::new(start, end)))
            }
            Token::If => {
                self.advance();
                self.expect(&Token::LParen)?;
                let condition = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                let then_branch = Box::new(self.parse_statement()?);
                self.expect(&Token::Else)?;
                let else_branch = Box::new(self.parse_statement()?);
                let end = else_branch.span.end;
                Ok(Spanned::new(
                    Stmt::If { condition, then_branch, else_branch },
                    Span::new(start, end),
                ))
            }
            Token::While => {
                self.advance();
                self.expect(&Token::LParen)?;
                let condition = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                let body = Box::new(self.parse_statement()?);
                let end = body.span.end;
                Ok(Spanned::new(Stmt::While { condition, body }, Span::new(start, end)))
            }
            Token::Break => {
                self.advance();
                let semi = self.expect(&Token::Semi)?;
                Ok(Spanned::new(Stmt::Break, Span::new(start, semi.span.end)))
            }
            Token::Return => {
                self.advance();
                if self.check(&Token::Semi) {
                    let semi = self.expect(&Token::Semi)?;
                    Ok(Spanned::new(Stmt::Return(None), Span::new(start, semi.span.end)))
                } else {
                    let value = self.parse_expr()?;
                    let semi = self.expect(&Token::Semi)?;
                    Ok(Spanned::new(Stmt::Return(Some(value)), Span::new(start, semi.span.end)))
                }
            }
            Token::Print => {
                self.advance();
                self.expect(&Token::LParen)?;
                let value = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                let semi = self.expect(&Token::Semi)?;
                Ok(Spanned::new(Stmt::Print(value), Span::new(start, semi.span.end)))
            }
            Token::Int | Token::Boolean => self.parse_var_decl(),
            Token::Ident => {
                // Disambiguate on the token after the identifier:
                //   x = ...;        assignment
                //   T y = ...;      declaration with class type
                //   T<..> y = ...;  declaration with generic class type
                //   x.m(...);       expression statement
                match self.peek_at(1).map(|t| &t.node) {
                    Some(Token::Eq) => {
                        let target = self.expect_ident()?;
                        self.expect(&Token::Eq)?;
                        let value = self.parse_expr()?;
                        let semi = self.expect(&Token::Semi)?;
                        Ok(Spanned::new(
                            Stmt::Assign { target, value },
                            Span::new(start, semi.span.end),
                        ))
                    }
                    Some(Token::Ident) | Some(Token::Lt) => self.parse_var_decl(),
                    _ => {
                        let value = self.parse_expr()?;
                        let semi = self.expect(&Token::Semi)?;
                        Ok(Spanned::new(Stmt::Expr(value), Span::new(start, semi.span.end)))
                    }
                }
            }
            _ => {
                let value = self.parse_expr()?;
                let semi = self.expect(&Token::Semi)?;
                Ok(Spanned::new(Stmt::Expr(value), Span::new(start, semi.span.end)))
            }
        }
    }

    fn parse_block(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let open = self.expect(&Token::LBrace)?;
        let start = open.span.start;
        let mut stmts = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(CompileError::syntax("unclosed block", self.eof_span()));
            }
            stmts.push(self.parse_statement()?);
        }
        let close = self.expect(&Token::RBrace)?;
        Ok(Spanned::new(Stmt::Block(stmts), Span::new(start, close.span.end)))
    }

    fn parse_var_decl(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let ty = self.parse_local_type()?;
        let start = ty.span.start;
        let name = self.expect_ident()?;
        self.expect(&Token::Eq)?;
        let value = self.parse_expr()?;
        let semi = self.expect(&Token::Semi)?;
        Ok(Spanned::new(
            Stmt::VarDecl { ty, name, value },
            Span::new(start, semi.span.end),
        ))
    }

    // ==================== Expressions ====================

    pub fn parse_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek().map(|t| &t.node) {
                Some(Token::Lt) => BinOp::Lt,
                Some(Token::EqEq) => BinOp::Eq,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                span,
            );
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().map(|t| &t.node) {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                span,
            );
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut lhs = self.parse_primary()?;
        loop {
            let op = match self.peek().map(|t| &t.node) {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_primary()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
                span,
            );
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let tok = self.peek().ok_or_else(|| {
            CompileError::syntax("expected an expression, found end of file", self.eof_span())
        })?;
        let span = tok.span;

        match tok.node {
            Token::IntLit(n) => {
                self.advance();
                Ok(Spanned::new(Expr::IntLit(n), span))
            }
            Token::True => {
                self.advance();
                Ok(Spanned::new(Expr::BoolLit(true), span))
            }
            Token::False => {
                self.advance();
                Ok(Spanned::new(Expr::BoolLit(false), span))
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::New => {
                self.advance();
                let class = self.expect_ident()?;
                let type_args = if self.eat(&Token::Lt) {
                    self.parse_type_args(&[])?
                } else {
                    Vec::new()
                };
                self.expect(&Token::LParen)?;
                let args = self.parse_args()?;
                let close = self.expect(&Token::RParen)?;
                let full = Span::new(span.start, close.span.end);
                Ok(Spanned::new(Expr::New { class, type_args, args }, full))
            }
            Token::Ident => {
                let name = self.expect_ident()?;
                if self.check(&Token::Dot) {
                    self.advance();
                    let method = self.expect_ident()?;
                    self.expect(&Token::LParen)?;
                    let args = self.parse_args()?;
                    let close = self.expect(&Token::RParen)?;
                    let full = Span::new(span.start, close.span.end);
                    Ok(Spanned::new(
                        Expr::MethodCall { receiver: name, method, args },
                        full,
                    ))
                } else {
                    Ok(Spanned::new(Expr::Var(name.node), name.span))
                }
            }
            ref other => Err(CompileError::syntax(
                format!("expected an expression, found {other}"),
                span,
            )),
        }
    }

    /// Comma-separated argument expressions; the caller consumes the parens.
    fn parse_args(&mut self) -> Result<Vec<Spanned<Expr>>, CompileError> {
        let mut args = Vec::new();
        while !self.check(&Token::RParen) {
            if !args.is_empty() {
                self.expect(&Token::Comma)?;
            }
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }
}

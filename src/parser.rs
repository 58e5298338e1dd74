//! Recursive-descent parser.
//!
//! Grammar, from lowest to highest precedence:
//!
//! ```text
//! declaration → fnDecl | varDecl | statement
//! statement   → exprStmt | forStmt | ifStmt | printStmt | returnStmt | whileStmt | block
//! expression  → assignment
//! assignment  → IDENTIFIER "=" assignment | logic_or
//! logic_or    → logic_and ( "|" logic_and )*
//! logic_and   → equality ( "&" equality )*
//! equality    → comparison ( ( "!=" | "==" ) comparison )*
//! comparison  → term ( ( ">" | ">=" | "<" | "<=" ) term )*
//! term        → factor ( ( "-" | "+" ) factor )*
//! factor      → unary ( ( "/" | "*" ) unary )*
//! unary       → ( "!" | "-" ) unary | call
//! call        → primary ( "(" arguments? ")" )*
//! primary     → "true" | "false" | "null" | NUMBER | STRING | IDENTIFIER | "(" expression ")"
//! ```
//!
//! A syntax fault abandons the current declaration only: it is reported, tokens are skipped up
//! to the next statement boundary and parsing resumes.  Abandoned declarations are omitted from
//! the result.

use std::rc::Rc;

use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::diag::{Diagnostics, SyntaxError};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Maximum number of parameters of a function and of arguments of a call.
pub const MAX_ARITY: usize = 255;

type ParseResult<T> = Result<T, SyntaxError>;

#[derive(Debug)]
pub struct Parser<'d> {
    tokens: Vec<Token>,
    current: usize,
    diags: &'d mut Diagnostics,
}

impl<'d> Parser<'d> {
    /// `tokens` must end with an `Eof` token, as produced by the scanner.
    pub fn new(tokens: Vec<Token>, diags: &'d mut Diagnostics) -> Parser<'d> {
        debug_assert!(tokens.last().is_some_and(|t| t.is(TokenKind::Eof)));
        Parser {
            tokens,
            current: 0,
            diags,
        }
    }

    pub fn parse(mut self) -> Vec<Stmt> {
        let mut prg = vec![];
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                prg.push(stmt);
            }
        }
        tracing::debug!(statements = prg.len(), "parsed program");
        prg
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let stmt = if self.matches(TokenKind::Fn) {
            self.fn_decl()
        } else if self.matches(TokenKind::Var) {
            self.var_decl()
        } else {
            self.statement()
        };
        match stmt {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.diags.syntax(e);
                self.synchronize();
                None
            }
        }
    }

    /// Parse function declaration.
    /// Previous token is `fn`.
    fn fn_decl(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect function name.")?;
        self.consume(TokenKind::LeftParen, "Expect '(' after function name.")?;
        let mut params = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARITY {
                    // Reported without abandoning the declaration.
                    let e = SyntaxError::at_token(
                        self.peek(),
                        format!("Can't have more than {} parameters.", MAX_ARITY),
                    );
                    self.diags.syntax(e);
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        let body = self.block()?;
        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    /// Parse variable declaration.
    /// Previous token is `var`.
    fn var_decl(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let init = if self.matches(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;
        Ok(Stmt::Var(name, init))
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        ensure_sufficient_stack(|| self.statement_inner())
    }

    fn statement_inner(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::If => {
                self.advance();
                self.if_stmt()
            }
            TokenKind::For => {
                self.advance();
                self.for_stmt()
            }
            TokenKind::While => {
                self.advance();
                self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
                let cond = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
                let body = self.statement()?;
                Ok(Stmt::While(cond, Box::new(body)))
            }
            TokenKind::Print => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
                Ok(Stmt::Print(expr))
            }
            TokenKind::Return => {
                let keyword = self.advance().clone();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
                Ok(Stmt::Return(keyword, value))
            }
            TokenKind::LeftBrace => {
                self.advance();
                Ok(Stmt::Block(self.block()?))
            }
            _ => {
                let expr = self.expression()?;
                self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
                Ok(Stmt::Expression(expr))
            }
        }
    }

    fn if_stmt(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let cond = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::If(cond, then_branch, else_branch))
    }

    /// `for` has no node of its own: it becomes
    /// `{ init; while (cond) { body; incr; } }`, dropping the parts that are absent.
    fn for_stmt(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let init = if self.matches(TokenKind::Semicolon) {
            None
        } else if self.matches(TokenKind::Var) {
            Some(self.var_decl()?)
        } else {
            let expr = self.expression()?;
            self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
            Some(Stmt::Expression(expr))
        };

        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let incr = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;
        if let Some(incr) = incr {
            body = Stmt::Block(vec![body, Stmt::Expression(incr)]);
        }
        let cond = cond.unwrap_or(Expr::Literal(Value::True));
        body = Stmt::While(cond, Box::new(body));
        if let Some(init) = init {
            body = Stmt::Block(vec![init, body]);
        }
        Ok(body)
    }

    /// Parse the declarations of a block.
    /// Previous token is `{`.
    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        ensure_sufficient_stack(|| self.block_inner())
    }

    fn block_inner(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = vec![];
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                stmts.push(stmt);
            }
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(stmts)
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        ensure_sufficient_stack(|| self.assignment_inner())
    }

    fn assignment_inner(&mut self) -> ParseResult<Expr> {
        let lhs = self.or()?;
        if !self.matches(TokenKind::Equal) {
            return Ok(lhs);
        }
        let equals = self.previous().clone();
        let rhs = self.assignment()?;
        match lhs {
            Expr::Variable(name) => Ok(Expr::Assign(name, Box::new(rhs))),
            lhs => {
                // Nothing needs skipping: report and keep going.
                self.diags
                    .syntax(SyntaxError::at_token(&equals, "Invalid assignment target."));
                Ok(lhs)
            }
        }
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;
        while self.matches(TokenKind::Or) {
            let op = self.previous().clone();
            let rhs = self.and()?;
            expr = Expr::Logical(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;
        while self.matches(TokenKind::And) {
            let op = self.previous().clone();
            let rhs = self.equality()?;
            expr = Expr::Logical(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;
        while self.matches_any(&[TokenKind::BangEqual, TokenKind::EqualEqual]) {
            let op = self.previous().clone();
            let rhs = self.comparison()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;
        while self.matches_any(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let op = self.previous().clone();
            let rhs = self.term()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;
        while self.matches_any(&[TokenKind::Minus, TokenKind::Plus]) {
            let op = self.previous().clone();
            let rhs = self.factor()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;
        while self.matches_any(&[TokenKind::Slash, TokenKind::Star]) {
            let op = self.previous().clone();
            let rhs = self.unary()?;
            expr = Expr::Binary(Box::new(expr), op, Box::new(rhs));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        ensure_sufficient_stack(|| self.unary_inner())
    }

    fn unary_inner(&mut self) -> ParseResult<Expr> {
        if self.matches_any(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous().clone();
            let rhs = self.unary()?;
            Ok(Expr::Unary(op, Box::new(rhs)))
        } else {
            self.call()
        }
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        while self.matches(TokenKind::LeftParen) {
            expr = self.finish_call(expr)?;
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut args = vec![];
        if !self.check(TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARITY {
                    return Err(SyntaxError::at_token(
                        self.peek(),
                        format!("Can't have more than {} arguments.", MAX_ARITY),
                    ));
                }
                args.push(self.expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call(Box::new(callee), paren, args))
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let expr = match self.peek().kind {
            TokenKind::False => Expr::Literal(Value::False),
            TokenKind::True => Expr::Literal(Value::True),
            TokenKind::Null => Expr::Literal(Value::Nil),
            TokenKind::Number | TokenKind::String => Expr::Literal(self.peek().literal.clone()),
            TokenKind::Identifier => Expr::Variable(self.peek().clone()),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
                return Ok(Expr::Grouping(Box::new(expr)));
            }
            _ => {
                return Err(SyntaxError::at_token(
                    self.peek(),
                    "Unknown literal in primary expression.",
                ))
            }
        };
        self.advance();
        Ok(expr)
    }

    /// Skip tokens until the start of the next statement: just after a `;` or just before a
    /// keyword that begins a statement.
    fn synchronize(&mut self) {
        tracing::trace!(line = self.peek().line, "synchronizing after syntax fault");
        self.advance();
        while !self.is_at_end() {
            if self.previous().is(TokenKind::Semicolon) {
                return;
            }
            match self.peek().kind {
                TokenKind::Class
                | TokenKind::Fn
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => (),
            }
            self.advance();
        }
    }

    fn consume(&mut self, expected: TokenKind, message: &str) -> ParseResult<Token> {
        if self.check(expected) {
            Ok(self.advance().clone())
        } else {
            Err(SyntaxError::at_token(self.peek(), message))
        }
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn matches_any(&mut self, kinds: &[TokenKind]) -> bool {
        kinds.iter().any(|&kind| self.matches(kind))
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().is(kind)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().is(TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }
}

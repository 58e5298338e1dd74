//! Lexical analyzer

use std::rc::Rc;

use crate::ctx::Context;
use crate::diag::{Diagnostics, Position, SyntaxError};
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Scans a whole source text into tokens.
///
/// Uses a fresh [`Context`]; embedders keeping an [`Interpreter`](crate::interpreter::Interpreter)
/// never need this since the interpreter scans with its own context.
pub fn tokenize(source: &str, diags: &mut Diagnostics) -> Vec<Token> {
    Scanner::new(source, Context::new()).scan_tokens(diags)
}

/// Turn source text into a sequence of tokens.
#[derive(Debug)]
pub struct Scanner<'s> {
    source: &'s str,
    ctx: Rc<Context>,
    tokens: Vec<Token>,

    // Byte offsets of the first character of the current lexeme and of the next character.
    start: usize,
    current: usize,
    line: Position,
}

impl<'s> Scanner<'s> {
    /// Creates a new scanner operating on `source`.
    pub fn new(source: &'s str, ctx: Rc<Context>) -> Scanner<'s> {
        Scanner {
            source,
            ctx,
            tokens: vec![],
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Scans all tokens, reporting lexical faults to `diags`.  The result always ends with an
    /// `Eof` token carrying the last line reached.
    pub fn scan_tokens(mut self, diags: &mut Diagnostics) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(diags);
        }
        let eof = self.ctx.symbol("");
        self.tokens
            .push(Token::new(TokenKind::Eof, eof, Value::Nil, self.line));
        tracing::debug!(tokens = self.tokens.len(), lines = self.line, "scanned source");
        self.tokens
    }

    fn scan_token(&mut self, diags: &mut Diagnostics) {
        let ch = self.advance();
        match ch {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            '*' => self.add_token(TokenKind::Star),
            '/' => self.add_token(TokenKind::Slash),
            ';' => self.add_token(TokenKind::Semicolon),
            '&' => self.add_token(TokenKind::And),
            '|' => self.add_token(TokenKind::Or),
            '=' => {
                let kind = if self.matches('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind)
            }
            '!' => {
                let kind = if self.matches('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind)
            }
            '>' => {
                let kind = if self.matches('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind)
            }
            '<' => {
                let kind = if self.matches('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind)
            }
            '#' => self.skip_comment(),
            '"' => self.scan_string(diags),
            '\n' => self.line += 1,
            ch if ch.is_ascii_digit() => self.scan_number(),
            ch if ch.is_alphabetic() || ch == '_' => self.scan_identifier(),
            ch if ch.is_whitespace() => (),
            _ => diags.syntax(SyntaxError::at_line(self.line, "Unexpected character.")),
        }
    }

    fn scan_number(&mut self) {
        while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            self.advance();
        }

        // A trailing '.' is not part of the number.
        if self.peek() == Some('.') && self.peek_next().is_some_and(|ch| ch.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = &self.source[self.start..self.current];
        let n = text
            .parse::<f64>()
            .unwrap_or_else(|e| panic!("scanned numeric lexeme {:?} is not a number: {}", text, e));
        self.add_literal_token(TokenKind::Number, Value::Number(n));
    }

    fn scan_string(&mut self, diags: &mut Diagnostics) {
        while let Some(ch) = self.peek() {
            if ch == '"' {
                break;
            }
            if ch == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            diags.syntax(SyntaxError::at_line(self.line, "Unterminated string."));
            return;
        }

        // Closing quote.
        self.advance();

        let text = &self.source[self.start + 1..self.current - 1];
        self.add_literal_token(TokenKind::String, Value::String(text.to_owned()));
    }

    fn scan_identifier(&mut self) {
        while self.peek().is_some_and(|ch| ch.is_alphanumeric() || ch == '_') {
            self.advance();
        }

        let sym = self.ctx.symbol(&self.source[self.start..self.current]);
        let kind = self.ctx.keyword(&sym).unwrap_or(TokenKind::Identifier);
        self.tokens.push(Token::new(kind, sym, Value::Nil, self.line));
    }

    fn skip_comment(&mut self) {
        while self.peek().is_some_and(|ch| ch != '\n') {
            self.advance();
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_literal_token(kind, Value::Nil)
    }

    fn add_literal_token(&mut self, kind: TokenKind, literal: Value) {
        let lexeme = self.ctx.symbol(&self.source[self.start..self.current]);
        self.tokens
            .push(Token::new(kind, lexeme, literal, self.line));
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    /// Consume and return the next character.  Only call when not at end.
    fn advance(&mut self) -> char {
        let ch = self.source[self.current..]
            .chars()
            .next()
            .expect("advance() called at end of input");
        self.current += ch.len_utf8();
        ch
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next()
    }

    /// Consume the next character if it is `expected`.
    fn matches(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.current += expected.len_utf8();
            true
        } else {
            false
        }
    }
}

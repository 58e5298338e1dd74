use std::fmt;

use crate::diag::Position;
use crate::interner::Symbol;
use crate::value::Value;

/// Lexical categories produced by the scanner.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    // Single characters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Star,
    Slash,
    Semicolon,
    Equal,
    Bang,
    Greater,
    Less,
    And,
    Or,

    // Double characters
    EqualEqual,
    BangEqual,
    GreaterEqual,
    LessEqual,

    // Literals
    Identifier,
    String,
    Number,

    // Keywords
    Class,
    Fn,
    Return,
    Var,
    If,
    Else,
    True,
    False,
    For,
    While,
    Print,
    Super,
    This,
    Null,

    Eof,
}

/// "Words" produced by `Scanner`.
///
/// `literal` is `Value::Nil` except for number and string tokens, which carry their parsed
/// payload.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: Symbol,
    pub literal: Value,
    pub line: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: Symbol, literal: Value, line: Position) -> Token {
        Token {
            kind,
            lexeme,
            literal,
            line,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "EOF"),
            _ => write!(f, "{}", self.lexeme),
        }
    }
}

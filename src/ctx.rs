use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::interner::{Interner, Symbol};
use crate::token::TokenKind;

/// Mostly read-only state shared by every scan performed for one interpreter session.
///
/// Anchors the string interner so that identifiers seen on successive REPL lines map to the
/// same symbols, and holds the reserved-word table.
#[derive(Debug)]
pub struct Context {
    interner: RefCell<Interner>,
    keywords: HashMap<Symbol, TokenKind>,
}

impl Context {
    /// Creates a new context.
    ///
    /// Returns a Rc because the context is shared between the interpreter and its scanners.
    pub fn new() -> Rc<Self> {
        let mut interner = Interner::new();

        let mut keywords = HashMap::new();
        for (name, kind) in KEYWORDS.iter().copied() {
            keywords.insert(interner.symbol(name), kind);
        }

        Rc::new(Context {
            interner: RefCell::new(interner),
            keywords,
        })
    }

    /// Intern the given string if needed and return its associated symbol.
    pub fn symbol(&self, name: &str) -> Symbol {
        self.interner.borrow_mut().symbol(name)
    }

    /// Return the token kind associated with the given symbol if it is a reserved word.
    pub fn keyword(&self, id: &Symbol) -> Option<TokenKind> {
        self.keywords.get(id).copied()
    }
}

const KEYWORDS: [(&str, TokenKind); 14] = [
    ("class", TokenKind::Class),
    ("fn", TokenKind::Fn),
    ("return", TokenKind::Return),
    ("var", TokenKind::Var),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("for", TokenKind::For),
    ("while", TokenKind::While),
    ("print", TokenKind::Print),
    ("super", TokenKind::Super),
    ("this", TokenKind::This),
    ("null", TokenKind::Null),
];

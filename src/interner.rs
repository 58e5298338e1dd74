//! String interner
//!
//! Lexemes and binding names are interned so that scopes can hash and compare them cheaply.
//! Symbols produced by different interners still compare equal when their text matches, so
//! tokens scanned with a throwaway context can be evaluated by any interpreter.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Stores all known symbols.
#[derive(Debug, Default)]
pub struct Interner(HashSet<Symbol>);

impl Interner {
    pub fn new() -> Interner {
        Interner(HashSet::new())
    }

    /// Maps a string to a symbol.
    pub fn symbol(&mut self, name: &str) -> Symbol {
        if let Some(sym) = self.0.get(name) {
            sym.clone()
        } else {
            let sym = Symbol(Rc::from(name));
            self.0.insert(sym.clone());
            sym
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An immutable shared string.  Symbols from the same interner share storage and compare by
/// address first.
#[derive(Debug, Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for Symbol {}

// Must agree with `Borrow<str>`: hash the text, not the address.
impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state)
    }
}

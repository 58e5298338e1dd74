use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::eval::RuntimeError;
use crate::interner::Symbol;
use crate::token::Token;
use crate::value::Value;

/// One scope of the lexical scope chain.
///
/// Scopes are shared: a function value keeps the scope it was declared in alive and sees later
/// writes to it.
#[derive(Debug, Default)]
pub struct Env {
    parent: Option<Rc<Env>>,
    bindings: RefCell<HashMap<Symbol, Value>>,
}

impl Env {
    pub fn new() -> Rc<Env> {
        Rc::new(Env::default())
    }

    pub fn with_parent(parent: Rc<Env>) -> Rc<Env> {
        Rc::new(Env {
            parent: Some(parent),
            bindings: RefCell::new(HashMap::new()),
        })
    }

    /// Binds `name` in this scope, replacing any binding of the same name in this scope and
    /// shadowing those of enclosing scopes.
    pub fn define(&self, name: Symbol, val: Value) {
        self.bindings.borrow_mut().insert(name, val);
    }

    /// Looks `name` up from this scope outward.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(val) = self.bindings.borrow().get(&name.lexeme) {
            return Ok(val.clone());
        }
        match self.parent.as_ref() {
            Some(parent) => parent.get(name),
            None => Err(RuntimeError::UndefinedVariable {
                name: name.lexeme.name().to_owned(),
                line: name.line,
            }),
        }
    }

    /// Overwrites the nearest existing binding of `name`.  Never declares.
    pub fn assign(&self, name: &Token, val: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.bindings.borrow_mut().get_mut(&name.lexeme) {
            *slot = val;
            return Ok(());
        }
        match self.parent.as_ref() {
            Some(parent) => parent.assign(name, val),
            None => Err(RuntimeError::UndefinedVariable {
                name: name.lexeme.name().to_owned(),
                line: name.line,
            }),
        }
    }
}

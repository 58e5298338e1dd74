//! Runtime values.

use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::env::Env;

/// A dynamically typed Almond value.
///
/// Truth is two distinct kinds rather than a boolean payload: truthiness is decided by the kind.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    True,
    False,
    Number(f64),
    String(String),
    Callable(Callable),
}

impl Value {
    pub fn from_bool(b: bool) -> Value {
        if b {
            Value::True
        } else {
            Value::False
        }
    }

    /// `null`, `false` and the number zero are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil | Value::False => false,
            Value::Number(n) => *n != 0.0,
            Value::True | Value::String(_) | Value::Callable(_) => true,
        }
    }

    /// Name of the kind, used in fault messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "null",
            Value::True => "true",
            Value::False => "false",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Callable(_) => "callable",
        }
    }

    pub fn same_kind(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Structural equality: kinds must match, then payloads must match.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil)
            | (Value::True, Value::True)
            | (Value::False, Value::False) => true,
            (Value::Number(l), Value::Number(r)) => l == r,
            (Value::String(l), Value::String(r)) => l == r,
            (Value::Callable(l), Value::Callable(r)) => l == r,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "null"),
            Value::True => write!(f, "true"),
            Value::False => write!(f, "false"),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Callable(c) => write!(f, "{}", c),
        }
    }
}

/// Anything that can appear on the left of a call.
#[derive(Debug, Clone)]
pub enum Callable {
    Native(Native),
    User(Rc<UserFunction>),
}

/// Built-in functions bound in the root scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Native {
    /// `clock()`: seconds elapsed since the interpreter started.
    Clock,
    /// `sleep(ms)`: blocks the interpreter thread.
    Sleep,
}

impl Native {
    pub const ALL: [Native; 2] = [Native::Clock, Native::Sleep];

    pub fn name(self) -> &'static str {
        match self {
            Native::Clock => "clock",
            Native::Sleep => "sleep",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Native::Clock => 0,
            Native::Sleep => 1,
        }
    }
}

/// A function declaration paired with the scope it was declared in.
pub struct UserFunction {
    pub decl: Rc<FunctionDecl>,
    pub closure: Rc<Env>,
}

// The closure may (indirectly) contain this very function: never dump it.
impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFunction")
            .field("name", &self.decl.name.lexeme)
            .field("arity", &self.decl.params.len())
            .finish()
    }
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity(),
            Callable::User(func) => func.decl.params.len(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Native(native) => native.name(),
            Callable::User(func) => func.decl.name.lexeme.name(),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Native(l), Callable::Native(r)) => l == r,
            (Callable::User(l), Callable::User(r)) => Rc::ptr_eq(l, r),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(native) => write!(f, "<native fn {}>", native.name()),
            Callable::User(func) => write!(f, "<fn {}>", func.decl.name.lexeme),
        }
    }
}

//! A tree-walking interpreter for Almond, a small dynamically typed C-like scripting language.
//!
//! The pipeline is: source text → [`scanner`] → tokens → [`parser`] → statements →
//! evaluator, against a root scope pre-seeded with the `clock` and `sleep` natives.
//! Faults are collected in a [`diag::Diagnostics`] value rather than in global state.
//!
//! # Examples
//!
//! See [`crate::interpreter::Interpreter`].
//!
//! # Limitations
//!
//! - `class`, `super` and `this` are reserved words but nothing parses them.
//! - Scopes are reference counted: a closure stored in the scope it captures is never freed.

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod ast;
pub mod diag;
pub mod interner;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

mod ctx;
mod env;
mod eval;
mod stack;

pub use diag::{Diagnostics, SyntaxError};
pub use eval::{RuntimeError, MAX_CALL_DEPTH};
pub use interpreter::{AlmondError, Interpreter};
pub use scanner::tokenize;

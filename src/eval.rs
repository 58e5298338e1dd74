use std::io;
use std::io::prelude::*;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::ast::{Expr, Stmt};
use crate::ctx::Context;
use crate::diag::Position;
use crate::env::Env;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenKind};
use crate::value::{Callable, Native, UserFunction, Value};

/// Maximum nesting of user function calls.
pub const MAX_CALL_DEPTH: usize = 1024;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String, line: Position },

    #[error("Illegal unary operator '{op}' on {operand}.")]
    IllegalUnary {
        op: String,
        operand: &'static str,
        line: Position,
    },

    #[error("Type mismatch between {left} and {right}.")]
    TypeMismatch {
        left: &'static str,
        right: &'static str,
        line: Position,
    },

    #[error("Invalid binary operation '{op}' on {kind}.")]
    InvalidBinary {
        op: String,
        kind: &'static str,
        line: Position,
    },

    #[error("Can only call functions, not {kind}.")]
    NotCallable { kind: &'static str, line: Position },

    #[error("Expected {expected} arguments but got {got}.")]
    Arity {
        expected: usize,
        got: usize,
        line: Position,
    },

    #[error("Usage: sleep(ms) where ms is a non-negative number of milliseconds.")]
    SleepUsage { line: Position },

    #[error("Stack overflow.")]
    StackOverflow { line: Position },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RuntimeError {
    /// Source line of the construct that faulted, if any.
    pub fn line(&self) -> Option<Position> {
        match self {
            RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::IllegalUnary { line, .. }
            | RuntimeError::TypeMismatch { line, .. }
            | RuntimeError::InvalidBinary { line, .. }
            | RuntimeError::NotCallable { line, .. }
            | RuntimeError::Arity { line, .. }
            | RuntimeError::SleepUsage { line }
            | RuntimeError::StackOverflow { line } => Some(*line),
            RuntimeError::Io(_) => None,
        }
    }
}

/// How a statement completed.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Normal,
    /// A `return` is unwinding to the nearest call.
    Return(Value),
}

#[derive(Debug)]
pub struct Evaluator<'t, W: Write> {
    output: &'t mut W,
    globals: Rc<Env>,
    started: Instant,
    depth: usize,
}

impl<'a, W: Write> Evaluator<'a, W> {
    /// Creates an evaluator whose root scope binds the native functions.
    pub fn new(output: &'a mut W, ctx: &Context) -> Evaluator<'a, W> {
        let globals = Env::new();
        for native in Native::ALL {
            globals.define(
                ctx.symbol(native.name()),
                Value::Callable(Callable::Native(native)),
            );
        }
        Evaluator {
            output,
            globals,
            started: Instant::now(),
            depth: 0,
        }
    }

    /// Executes `stmts` in the root scope, stopping at the first fault or top-level `return`.
    pub fn interpret(&mut self, stmts: &[Stmt]) -> Result<(), RuntimeError> {
        let globals = self.globals.clone();
        for stmt in stmts {
            if let Flow::Return(_) = self.exec_stmt(stmt, &globals)? {
                break;
            }
        }
        Ok(())
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: &Rc<Env>) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal => (),
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Rc<Env>) -> Result<Flow, RuntimeError> {
        ensure_sufficient_stack(|| self.exec_stmt_inner(stmt, env))
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt, env: &Rc<Env>) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expression(e) => {
                self.eval_expr(e, env)?;
            }
            Stmt::Print(e) => {
                let v = self.eval_expr(e, env)?;
                writeln!(self.output, "{}", v)?;
            }
            Stmt::Var(name, init) => {
                let v = match init {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::Nil,
                };
                env.define(name.lexeme.clone(), v);
            }
            Stmt::Block(stmts) => {
                return self.exec_block(stmts, &Env::with_parent(env.clone()));
            }
            Stmt::If(cond, then_branch, else_branch) => {
                if self.eval_expr(cond, env)?.is_truthy() {
                    return self.exec_stmt(then_branch, env);
                } else if let Some(else_branch) = else_branch {
                    return self.exec_stmt(else_branch, env);
                }
            }
            Stmt::While(cond, body) => {
                // The body shares the loop's scope; only a block body gets a fresh one, and it
                // gets it on every iteration.
                while self.eval_expr(cond, env)?.is_truthy() {
                    if let Flow::Return(v) = self.exec_stmt(body, env)? {
                        return Ok(Flow::Return(v));
                    }
                }
            }
            Stmt::Function(decl) => {
                let func = UserFunction {
                    decl: decl.clone(),
                    closure: env.clone(),
                };
                env.define(
                    decl.name.lexeme.clone(),
                    Value::Callable(Callable::User(Rc::new(func))),
                );
            }
            Stmt::Return(_, value) => {
                let v = match value {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(v));
            }
        };
        Ok(Flow::Normal)
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Rc<Env>) -> Result<Value, RuntimeError> {
        ensure_sufficient_stack(|| self.eval_expr_inner(expr, env))
    }

    fn eval_expr_inner(&mut self, expr: &Expr, env: &Rc<Env>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Grouping(e) => self.eval_expr(e, env),
            Expr::Variable(name) => env.get(name),
            Expr::Assign(name, rhs) => {
                let v = self.eval_expr(rhs, env)?;
                env.assign(name, v.clone())?;
                Ok(v)
            }
            Expr::Unary(op, rhs) => {
                let v = self.eval_expr(rhs, env)?;
                match (op.kind, v) {
                    (TokenKind::Bang, v) => Ok(Value::from_bool(!v.is_truthy())),
                    (TokenKind::Minus, Value::Number(n)) => Ok(Value::Number(-n)),
                    (_, v) => Err(RuntimeError::IllegalUnary {
                        op: op.lexeme.name().to_owned(),
                        operand: v.kind_name(),
                        line: op.line,
                    }),
                }
            }
            Expr::Binary(lhs, op, rhs) => self.eval_binary(lhs, op, rhs, env),
            Expr::Logical(lhs, op, rhs) => {
                let l = self.eval_expr(lhs, env)?;
                let decided = if op.is(TokenKind::Or) {
                    l.is_truthy()
                } else {
                    !l.is_truthy()
                };
                if decided {
                    Ok(l)
                } else {
                    self.eval_expr(rhs, env)
                }
            }
            Expr::Call(callee, paren, args) => {
                let callee = self.eval_expr(callee, env)?;
                let args = args
                    .iter()
                    .map(|a| self.eval_expr(a, env))
                    .collect::<Result<Vec<Value>, RuntimeError>>()?;
                let callable = match callee {
                    Value::Callable(c) => c,
                    v => {
                        return Err(RuntimeError::NotCallable {
                            kind: v.kind_name(),
                            line: paren.line,
                        })
                    }
                };
                if args.len() != callable.arity() {
                    return Err(RuntimeError::Arity {
                        expected: callable.arity(),
                        got: args.len(),
                        line: paren.line,
                    });
                }
                match callable {
                    Callable::Native(native) => self.call_native(native, &args, paren.line),
                    Callable::User(func) => self.call_user(&func, args, paren.line),
                }
            }
        }
    }

    /// The right operand is evaluated before the left one.
    fn eval_binary(
        &mut self,
        lhs: &Expr,
        op: &Token,
        rhs: &Expr,
        env: &Rc<Env>,
    ) -> Result<Value, RuntimeError> {
        let r = self.eval_expr(rhs, env)?;
        let l = self.eval_expr(lhs, env)?;

        match op.kind {
            TokenKind::EqualEqual => return Ok(Value::from_bool(l == r)),
            TokenKind::BangEqual => return Ok(Value::from_bool(l != r)),
            _ => (),
        }

        if !l.same_kind(&r) {
            return Err(RuntimeError::TypeMismatch {
                left: l.kind_name(),
                right: r.kind_name(),
                line: op.line,
            });
        }

        match (op.kind, &l, &r) {
            (TokenKind::Plus, Value::String(ls), Value::String(rs)) => {
                Ok(Value::String(format!("{}{}", ls, rs)))
            }
            (TokenKind::Plus, Value::Number(ln), Value::Number(rn)) => Ok(Value::Number(ln + rn)),
            (TokenKind::Minus, Value::Number(ln), Value::Number(rn)) => Ok(Value::Number(ln - rn)),
            (TokenKind::Star, Value::Number(ln), Value::Number(rn)) => Ok(Value::Number(ln * rn)),
            (TokenKind::Slash, Value::Number(ln), Value::Number(rn)) => Ok(Value::Number(ln / rn)),
            (TokenKind::Greater, Value::Number(ln), Value::Number(rn)) => {
                Ok(Value::from_bool(ln > rn))
            }
            (TokenKind::GreaterEqual, Value::Number(ln), Value::Number(rn)) => {
                Ok(Value::from_bool(ln >= rn))
            }
            (TokenKind::Less, Value::Number(ln), Value::Number(rn)) => {
                Ok(Value::from_bool(ln < rn))
            }
            (TokenKind::LessEqual, Value::Number(ln), Value::Number(rn)) => {
                Ok(Value::from_bool(ln <= rn))
            }
            _ => Err(RuntimeError::InvalidBinary {
                op: op.lexeme.name().to_owned(),
                kind: l.kind_name(),
                line: op.line,
            }),
        }
    }

    fn call_native(
        &mut self,
        native: Native,
        args: &[Value],
        line: Position,
    ) -> Result<Value, RuntimeError> {
        match native {
            Native::Clock => Ok(Value::Number(self.started.elapsed().as_secs_f64())),
            Native::Sleep => {
                let ms = match args[0] {
                    Value::Number(ms) => ms,
                    _ => return Err(RuntimeError::SleepUsage { line }),
                };
                let duration = Duration::try_from_secs_f64(ms / 1000.0)
                    .map_err(|_| RuntimeError::SleepUsage { line })?;
                tracing::trace!(?duration, "sleeping");
                thread::sleep(duration);
                Ok(Value::Nil)
            }
        }
    }

    fn call_user(
        &mut self,
        func: &UserFunction,
        args: Vec<Value>,
        line: Position,
    ) -> Result<Value, RuntimeError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::StackOverflow { line });
        }
        tracing::trace!(function = %func.decl.name, depth = self.depth, "calling function");

        let env = Env::with_parent(func.closure.clone());
        for (param, arg) in func.decl.params.iter().zip(args) {
            env.define(param.lexeme.clone(), arg);
        }

        self.depth += 1;
        let flow = self.exec_block(&func.decl.body, &env);
        self.depth -= 1;

        match flow? {
            Flow::Return(v) => Ok(v),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

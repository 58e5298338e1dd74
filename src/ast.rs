use std::fmt;
use std::rc::Rc;

use crate::token::Token;
use crate::value::Value;

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Expression(Expr),
    Print(Expr),
    /// `var name [= init];`
    Var(Token, Option<Expr>),
    Block(Vec<Stmt>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    While(Expr, Box<Stmt>),
    /// Shared so that every function value created from it points at the same body.
    Function(Rc<FunctionDecl>),
    /// `return [value];`, keeping the keyword for its line.
    Return(Token, Option<Expr>),
}

#[derive(Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Literal(Value),
    Unary(Token, Box<Expr>),
    Binary(Box<Expr>, Token, Box<Expr>),
    Grouping(Box<Expr>),
    Variable(Token),
    Assign(Token, Box<Expr>),
    Logical(Box<Expr>, Token, Box<Expr>),
    /// Callee, closing parenthesis, arguments.
    Call(Box<Expr>, Token, Vec<Expr>),
}

// Parenthesized prefix notation, handy to compare trees in tests and logs.

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::String(s)) => write!(f, "\"{}\"", s),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Unary(op, e) => write!(f, "({} {})", op, e),
            Expr::Binary(l, op, r) | Expr::Logical(l, op, r) => {
                write!(f, "({} {} {})", op, l, r)
            }
            Expr::Grouping(e) => write!(f, "(group {})", e),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Assign(name, e) => write!(f, "(= {} {})", name, e),
            Expr::Call(callee, _, args) => {
                write!(f, "(call {}", callee)?;
                for a in args {
                    write!(f, " {}", a)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expression(e) => write!(f, "(; {})", e),
            Stmt::Print(e) => write!(f, "(print {})", e),
            Stmt::Var(name, None) => write!(f, "(var {})", name),
            Stmt::Var(name, Some(init)) => write!(f, "(var {} {})", name, init),
            Stmt::Block(stmts) => {
                write!(f, "(block")?;
                for s in stmts {
                    write!(f, " {}", s)?;
                }
                write!(f, ")")
            }
            Stmt::If(cond, then_branch, None) => write!(f, "(if {} {})", cond, then_branch),
            Stmt::If(cond, then_branch, Some(else_branch)) => {
                write!(f, "(if {} {} {})", cond, then_branch, else_branch)
            }
            Stmt::While(cond, body) => write!(f, "(while {} {})", cond, body),
            Stmt::Function(decl) => {
                write!(f, "(fn {} (", decl.name)?;
                for (i, p) in decl.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ")")?;
                for s in &decl.body {
                    write!(f, " {}", s)?;
                }
                write!(f, ")")
            }
            Stmt::Return(_, None) => write!(f, "(return)"),
            Stmt::Return(_, Some(e)) => write!(f, "(return {})", e),
        }
    }
}

//! API to control the interpreter.

use std::fmt;
use std::io::prelude::*;
use std::rc::Rc;

use thiserror::Error;

use crate::ctx::Context;
use crate::diag::{Diagnostics, SyntaxError};
use crate::eval::{Evaluator, RuntimeError};
use crate::parser::Parser;
use crate::scanner::Scanner;

/// Tree-walk interpreter.
///
/// One interpreter owns one root scope: definitions made by one call to [`Interpreter::eval`]
/// are visible to the next.
///
/// # Example
///
/// Invoke the interpreter a first time to define a function then additional times to call this
/// function:
///
/// ```
/// # use almond::interpreter::{Interpreter, AlmondError};
///
/// let mut output: Vec<u8> = Vec::new();
/// let mut interp = Interpreter::new(&mut output);
///
/// let func_def = r#"
///     fn max(x, y) {
///         if (x > y) {
///             return x;
///         } else {
///             return y;
///         }
///     }
/// "#;
/// interp.eval(func_def)?;
///
/// interp.eval("print max(10, 20);").expect("interpreter error");
/// interp.eval("print max(5, 4);").expect("interpreter error");
///
/// assert_eq!(output, b"20\n5\n");
/// # Ok::<(), AlmondError>(())
/// ```
#[derive(Debug)]
pub struct Interpreter<'t, W: Write> {
    ctx: Rc<Context>,
    evaluator: Evaluator<'t, W>,
}

/// Errors the interpreter can raise.
#[derive(Debug, Error)]
pub enum AlmondError {
    /// Faults found during lexical or syntactic analysis.  The program was not executed.
    #[error("{}", SyntaxErrors(.0))]
    Syntax(Vec<SyntaxError>),

    /// Fault that stopped execution.
    #[error("{}", RuntimeReport(.0))]
    Runtime(#[from] RuntimeError),
}

impl AlmondError {
    /// Conventional process exit status for this class of fault.
    pub fn exit_code(&self) -> i32 {
        match self {
            AlmondError::Syntax(_) => 65,
            AlmondError::Runtime(_) => 70,
        }
    }
}

struct SyntaxErrors<'a>(&'a [SyntaxError]);

impl fmt::Display for SyntaxErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

struct RuntimeReport<'a>(&'a RuntimeError);

impl fmt::Display for RuntimeReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.line() {
            Some(line) => write!(f, "{}\n[line {}]", self.0, line),
            None => write!(f, "{}", self.0),
        }
    }
}

impl<W: Write> Interpreter<'_, W> {
    pub fn new(output: &mut W) -> Interpreter<'_, W> {
        let ctx = Context::new();
        let evaluator = Evaluator::new(output, &ctx);
        Interpreter { ctx, evaluator }
    }

    /// Scans, parses and, when no syntax fault was found, executes `source`.
    ///
    /// Faults are recorded in `diags` rather than returned.
    pub fn run(&mut self, source: &str, diags: &mut Diagnostics) {
        let span = tracing::debug_span!("run", bytes = source.len());
        let _enter = span.enter();

        let tokens = Scanner::new(source, self.ctx.clone()).scan_tokens(diags);
        let prg = Parser::new(tokens, diags).parse();
        if diags.had_syntax_error() {
            tracing::debug!(
                faults = diags.syntax_errors().len(),
                "not executing program with syntax faults"
            );
            return;
        }

        if let Err(e) = self.evaluator.interpret(&prg) {
            diags.runtime(e);
        }
    }

    pub fn eval(&mut self, source: &str) -> Result<(), AlmondError> {
        let mut diags = Diagnostics::new();
        self.run(source, &mut diags);
        let syntax = diags.take_syntax();
        if !syntax.is_empty() {
            return Err(AlmondError::Syntax(syntax));
        }
        match diags.take_runtime() {
            Some(e) => Err(AlmondError::Runtime(e)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn interpret(input: &str) -> Result<String, AlmondError> {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        interp.eval(input)?;
        let output = String::from_utf8(raw_output).expect("cannot convert output to string");
        Ok(output)
    }

    #[test]
    fn print_expr() -> Result<(), AlmondError> {
        assert_eq!(interpret("print 3*2;")?, "6\n");
        Ok(())
    }

    #[test]
    fn init_set_get_var() -> Result<(), AlmondError> {
        assert_eq!(interpret("var foo=42; foo=24; print foo;")?, "24\n");
        Ok(())
    }

    #[test]
    fn block_with_shadowed_var() -> Result<(), AlmondError> {
        assert_eq!(
            interpret("var foo=42; { var foo=24; print foo; } print foo; ")?,
            "24\n42\n"
        );
        Ok(())
    }

    #[test]
    fn inc_var_declared_in_outer_block() -> Result<(), AlmondError> {
        assert_eq!(
            interpret("var foo = 2; { foo = foo + 1; } print foo; ")?,
            "3\n"
        );
        Ok(())
    }

    #[test]
    fn if_else() -> Result<(), AlmondError> {
        assert_eq!(
            interpret("var foo; if (2 + 2 == 4) foo = 1; else foo = 2; print foo;")?,
            "1\n"
        );
        assert_eq!(
            interpret("var foo; if (2 + 2 != 4) foo = 1; else foo = 2; print foo;")?,
            "2\n"
        );
        Ok(())
    }

    #[test]
    fn syntax_faults_prevent_execution() {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        match interp.eval("print 1; print ;\nvar;") {
            Err(AlmondError::Syntax(errors)) => assert_eq!(errors.len(), 2),
            r => panic!("unexpected output: {:?}", r),
        }
        assert!(raw_output.is_empty());
    }

    #[test]
    fn syntax_error_report() {
        let e = interpret("print 1;\n@ print 2").unwrap_err();
        assert_eq!(e.exit_code(), 65);
        assert_eq!(
            e.to_string(),
            "[line 2] Error: Unexpected character.\n[line 2] Error at end: Expect ';' after value."
        );
    }

    #[test]
    fn runtime_error_report() {
        let e = interpret("print 1;\nprint -\"a\";").unwrap_err();
        assert_eq!(e.exit_code(), 70);
        assert_eq!(
            e.to_string(),
            "Illegal unary operator '-' on string.\n[line 2]"
        );
    }

    #[test]
    fn session_survives_faults() -> Result<(), AlmondError> {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        interp.eval("var a = 1;")?;
        assert!(interp.eval("a = ;").is_err());
        assert!(interp.eval("a = a + b;").is_err());
        interp.eval("print a;")?;
        assert_eq!(raw_output, b"1\n");
        Ok(())
    }

    #[test]
    fn run_records_faults() {
        let mut raw_output: Vec<u8> = Vec::new();
        let mut interp = Interpreter::new(&mut raw_output);
        let mut diags = Diagnostics::new();
        interp.run("print undefined;", &mut diags);
        assert!(!diags.had_syntax_error());
        assert!(diags.had_runtime_error());
        match diags.runtime_error() {
            Some(RuntimeError::UndefinedVariable { name, line: 1 }) if name == "undefined" => (),
            e => panic!("unexpected fault: {:?}", e),
        }
    }
}

//! Almond interpreter command-line.
//!
//! When called without argument it drops into an interactive read-evaluate-print loop.
//!
//! When called with a script path, it runs the whole file and exits with status 65 if the
//! script has syntax faults or 70 if execution stopped on a runtime fault.

use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use almond::interpreter::{AlmondError, Interpreter};
use almond::Diagnostics;

/// Exit status when the script cannot be read.
const EXIT_IO: u8 = 74;

#[derive(Parser, Debug)]
#[command(name = "almond", version, about = "Run Almond scripts or start a prompt")]
struct Args {
    /// Script to execute.  Without it an interactive prompt starts.
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let outcome = match args.script {
        Some(path) => run_file(&path),
        None => run_prompt()
            .map(|()| ExitCode::SUCCESS)
            .context("prompt i/o failed"),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("almond: {:#}", e);
            ExitCode::from(EXIT_IO)
        }
    }
}

/// Logs go to stderr, and only when `RUST_LOG` asks for them.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run_file(path: &Path) -> Result<ExitCode, anyhow::Error> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    tracing::debug!(path = %path.display(), "running script");

    let mut interp_stdout = io::stdout();
    let mut interp = Interpreter::new(&mut interp_stdout);
    let code = match interp.eval(&source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            exit_code(&e)
        }
    };
    drop(interp);
    interp_stdout.flush()?;
    Ok(code)
}

fn exit_code(e: &AlmondError) -> ExitCode {
    u8::try_from(e.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from)
}

fn run_prompt() -> Result<(), io::Error> {
    let stdin = io::stdin();
    let mut repl_stdout = io::stdout();
    let mut interp_stdout = io::stdout();

    let mut interp = Interpreter::new(&mut interp_stdout);
    let mut diags = Diagnostics::new();

    let mut input = String::new();
    loop {
        repl_stdout.write_all(b"> ")?;
        repl_stdout.flush()?;

        input.clear();
        let nbytes = stdin.read_line(&mut input)?;
        if nbytes == 0 {
            break;
        }

        interp.run(&input, &mut diags);
        for e in diags.syntax_errors() {
            eprintln!("{}", e);
        }
        diags.reset_syntax();
        if let Some(e) = diags.take_runtime() {
            eprintln!("{}", AlmondError::from(e));
        }
    }

    Ok(())
}

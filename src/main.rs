use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser as ClapParser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use loxide::{Lox, RunOutcome};

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to execute; starts the REPL when omitted.
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        std::process::exit(64);
    });

    match args.script {
        Some(path) => run_file(&path),
        None => run_prompt(),
    }
}

fn run_file(path: &PathBuf) -> anyhow::Result<()> {
    let source: Vec<u8> =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    let mut lox: Lox<io::Stdout> = Lox::new(io::stdout());

    let (outcome, diags) = lox.run(&source);
    diags.print_all();

    match outcome {
        RunOutcome::Ok => Ok(()),
        RunOutcome::SyntaxError => std::process::exit(65),
        RunOutcome::RuntimeError => std::process::exit(70),
    }
}

/// Read-eval-print loop.  Runtime errors are printed but the session keeps
/// its globals and continues until EOF or interrupt.
fn run_prompt() -> anyhow::Result<()> {
    let mut editor: DefaultEditor = DefaultEditor::new()?;
    let mut lox: Lox<io::Stdout> = Lox::new(io::stdout());

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());

                let (_outcome, diags) = lox.run(line.as_bytes());
                diags.print_all();
            }

            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,

            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

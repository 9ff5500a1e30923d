//! A tree-walk interpreter for the Lox scripting language.
//!
//! The pipeline is `source → Scanner → Parser → Resolver → Interpreter`; the
//! [`Lox`] facade wires the stages together and owns the interpreter, so the
//! REPL can feed it line after line while globals persist.

pub mod ast;
pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use std::io::Write;

use log::info;

use crate::ast::{ExprId, Stmt};
use crate::error::Diagnostics;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// What a single run of the pipeline produced, mapped by the CLI onto the
/// conventional exit codes (0 / 65 / 70).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Ok,
    SyntaxError,
    RuntimeError,
}

/// A persistent interpreter session.  `run` may be called repeatedly; global
/// state carries over between calls, which is exactly what the REPL needs.
pub struct Lox<W: Write> {
    interpreter: Interpreter<W>,
    next_expr_id: ExprId,
}

impl<W: Write> Lox<W> {
    pub fn new(output: W) -> Self {
        Lox {
            interpreter: Interpreter::new(output),
            next_expr_id: 0,
        }
    }

    /// Run one source text through the full pipeline.  Returns the outcome
    /// together with every diagnostic the run produced; printing them is the
    /// caller's job.
    pub fn run(&mut self, source: &[u8]) -> (RunOutcome, Diagnostics) {
        let mut diags = Diagnostics::new();

        // Scan, keeping every well-formed token even when some input bytes
        // were rejected.
        let mut tokens: Vec<Token> = Vec::new();
        for item in Scanner::new(source) {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => diags.report(e),
            }
        }

        let parser = Parser::new(tokens, self.next_expr_id, &mut diags);
        let (statements, next_id): (Vec<Stmt>, ExprId) = parser.parse();
        self.next_expr_id = next_id;

        if diags.had_error() {
            info!("Skipping execution: syntax errors were recorded");
            return (RunOutcome::SyntaxError, diags);
        }

        Resolver::new(&mut self.interpreter, &mut diags).resolve(&statements);

        if diags.had_error() {
            info!("Skipping execution: resolution errors were recorded");
            return (RunOutcome::SyntaxError, diags);
        }

        match self.interpreter.interpret(&statements) {
            // Warnings never block execution, but a run that produced any
            // still fails with the static-error exit code.
            Ok(()) if diags.had_warning() => (RunOutcome::SyntaxError, diags),

            Ok(()) => (RunOutcome::Ok, diags),

            Err(e) => {
                diags.report_runtime(e);
                (RunOutcome::RuntimeError, diags)
            }
        }
    }

    /// Everything the interpreter printed so far.
    pub fn output(&self) -> &W {
        self.interpreter.output()
    }
}

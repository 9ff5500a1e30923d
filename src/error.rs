//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) must convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! The module **does not** print diagnostics itself; accumulation and output
//! ordering are owned by [`Diagnostics`].

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  `location` is pre-rendered as either the
    /// empty string, ` at end`, or ` at '<lexeme>'`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis error or warning raised by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error.  Unwinds every active call frame and is
    /// reported by the driver in the two-line form below.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Parser error anchored to a token.  `lexeme` is empty for EOF.
    pub fn parse_at<S: Into<String>>(line: usize, lexeme: &str, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Parse error: line={}, at={:?}, msg={}",
            line, lexeme, message
        );

        LoxError::Parse {
            message,
            location: render_location(lexeme),
            line,
        }
    }

    /// Resolver error with no token context (unused-local warnings).
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        LoxError::Resolve {
            message,
            location: String::new(),
            line,
        }
    }

    /// Resolver error anchored to a token.
    pub fn resolve_at<S: Into<String>>(line: usize, lexeme: &str, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}, at={:?}, msg={}",
            line, lexeme, message
        );

        LoxError::Resolve {
            message,
            location: render_location(lexeme),
            line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }
}

fn render_location(lexeme: &str) -> String {
    if lexeme.is_empty() {
        " at end".to_string()
    } else {
        format!(" at '{}'", lexeme)
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Accumulating diagnostic sink shared by the scanner, parser, and resolver.
///
/// Static errors are collected so a single run can surface as many problems
/// as possible; the driver consults [`Diagnostics::had_error`] to decide
/// whether execution may proceed.  A runtime error unwinds instead and is
/// recorded separately so the driver can pick exit code 70 over 65.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
    warnings: Vec<LoxError>,
    runtime: Option<LoxError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a static (lex/parse/resolve) error.
    pub fn report(&mut self, error: LoxError) {
        info!("Diagnostic recorded: {}", error);

        self.errors.push(error);
    }

    /// Record a resolver warning (dead locals).  Warnings do not block
    /// execution but still fail the run with exit code 65.
    pub fn warn(&mut self, warning: LoxError) {
        info!("Warning recorded: {}", warning);

        self.warnings.push(warning);
    }

    /// Record the runtime error that aborted evaluation.
    pub fn report_runtime(&mut self, error: LoxError) {
        info!("Runtime diagnostic recorded: {}", error);

        self.runtime = Some(error);
    }

    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn had_warning(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.runtime.is_some()
    }

    /// Rendered messages: static errors, then warnings, then the runtime
    /// error, each in recording order.
    pub fn messages(&self) -> impl Iterator<Item = String> + '_ {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .chain(self.runtime.iter())
            .map(|e| e.to_string())
    }

    /// Write every recorded diagnostic to stderr.
    pub fn print_all(&self) {
        for message in self.messages() {
            eprintln!("{}", message);
        }
    }
}

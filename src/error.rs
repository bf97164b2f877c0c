//! Centralised error hierarchy for the **Rox interpreter**.
//!
//! All passes (scanner, parser, resolver, runtime, CLI) convert their internal
//! failure modes into one of the variants defined here.  Static passes do not
//! stop on the first problem: they push errors into a [`Diagnostics`]
//! accumulator and keep going, so one run can surface several mistakes.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::{info, warn};

use crate::token::{Token, TokenType};

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

    /// Syntactic (parser) error.  `location` is `""`, `" at end"` or
    /// `" at '<lexeme>'"`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Static‑analysis failure (self‑initializer, redeclaration, misplaced
    /// `this` / `return`).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Render the `where` part of a static diagnostic for `token`.
fn location_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**, located at `token`.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **resolver**, located at `token`.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}, msg={}",
            token.line, message
        );

        LoxError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for **runtime** failures raised at `token`.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Runtime error: line={}, msg={}",
            token.line, message
        );

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// Is this a compile‑time (lex / parse / resolve) error?
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Batch collector for diagnostics produced by one pipeline run.
///
/// The driver inspects it after each pass and refuses to continue once a
/// static error has been recorded.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one error.
    pub fn report(&mut self, error: LoxError) {
        warn!("Diagnostic recorded: {}", error);

        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn had_static_error(&self) -> bool {
        self.errors.iter().any(LoxError::is_static)
    }

    pub fn had_runtime_error(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, LoxError::Runtime { .. }))
    }

    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    /// Conventional process exit status: 65 for static errors, 70 for
    /// runtime errors, `None` when the run was clean.
    pub fn exit_code(&self) -> Option<i32> {
        if self.had_static_error() {
            Some(65)
        } else if self.had_runtime_error() {
            Some(70)
        } else {
            None
        }
    }
}

use std::io::Write;

use log::{debug, info};

use crate::error::Diagnostics;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::stdlib::GlobalProvider;
use crate::stmt::Stmt;
use crate::token::Token;

/// Runs source text through the whole pipeline against one long‑lived
/// interpreter, so globals persist from one `run` to the next.
pub struct Lox {
    interpreter: Interpreter,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
        }
    }

    pub fn with_provider(output: Box<dyn Write>, provider: Box<dyn GlobalProvider>) -> Self {
        Self {
            interpreter: Interpreter::with_provider(output, provider),
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// scan → parse → resolve → interpret.  Each static stage only runs if
    /// the previous ones reported nothing; a runtime error is reported once
    /// and ends the run.
    pub fn run(&mut self, source: &str) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        let tokens: Vec<Token> = scan_tokens(source, &mut diagnostics);
        let statements: Vec<Stmt> = Parser::new(&tokens).parse(&mut diagnostics);

        if diagnostics.has_errors() {
            info!("Static errors after parsing, skipping resolution");
            return diagnostics;
        }

        Resolver::new(&mut self.interpreter, &mut diagnostics).resolve(&statements);

        if diagnostics.has_errors() {
            info!("Static errors after resolution, skipping execution");
            self.interpreter.release(&statements);
            return diagnostics;
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            debug!("Runtime debug: {}", e);
            diagnostics.report(e);
        }

        self.interpreter.release(&statements);

        diagnostics
    }
}

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::Diagnostics;
use rox::session::Lox;

/// In-memory output sink that stays readable after the interpreter takes
/// ownership of a clone.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output is UTF-8")
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fresh session writing into a buffer.
pub fn session() -> (Lox, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let lox = Lox::with_output(Box::new(buffer.clone()));
    (lox, buffer)
}

/// Run `source` in a fresh session, returning printed output and diagnostics.
pub fn run(source: &str) -> (String, Diagnostics) {
    let (mut lox, buffer) = session();
    let diagnostics = lox.run(source);
    (buffer.contents(), diagnostics)
}

/// Run `source` and assert it completed without any diagnostic.
pub fn run_ok(source: &str) -> String {
    let (output, diagnostics) = run(source);
    assert!(
        !diagnostics.has_errors(),
        "unexpected diagnostics: {:?}",
        diagnostics.errors()
    );
    output
}

/// Rendered messages of every diagnostic.
pub fn messages(diagnostics: &Diagnostics) -> Vec<String> {
    diagnostics.errors().iter().map(|e| e.to_string()).collect()
}

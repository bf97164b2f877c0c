//! Global injection seam.
//!
//! `import std.<module>;` asks the interpreter's [`GlobalProvider`] for the
//! globals that module contributes.  This is the only way host capabilities
//! enter a program's global scope.

use std::rc::Rc;

use chrono::Utc;
use log::debug;

use crate::callable::{LoxCallable, NativeFunction};
use crate::class::LoxClass;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// What a provided global materialises as.
pub enum GlobalKind {
    /// Bound directly as a callable.
    Function(Rc<NativeFunction>),

    /// A constructor‑less class, called once with no arguments; the resulting
    /// singleton instance is what gets bound.
    Class(Rc<LoxClass>),
}

/// One global contributed by an import.
pub struct GlobalEntry {
    pub name: String,
    pub kind: GlobalKind,
}

impl GlobalEntry {
    pub fn function(function: NativeFunction) -> Self {
        Self {
            name: function.name().to_string(),
            kind: GlobalKind::Function(Rc::new(function)),
        }
    }

    pub fn class<S: Into<String>>(name: S, class: LoxClass) -> Self {
        Self {
            name: name.into(),
            kind: GlobalKind::Class(Rc::new(class)),
        }
    }
}

/// Resolves an import path (with the `std` namespace already stripped) to
/// the globals it defines.  Unknown paths yield nothing.
pub trait GlobalProvider {
    fn globals(&self, path: &[&str]) -> Vec<GlobalEntry>;
}

/// The built‑in standard library.
///
/// * `std.io`   ‑ `log(value)`, `println(value)`, and the `person` singleton.
/// * `std.time` ‑ `clock()`, seconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLib;

impl GlobalProvider for StdLib {
    fn globals(&self, path: &[&str]) -> Vec<GlobalEntry> {
        debug!("StdLib lookup for {:?}", path);

        match path {
            ["io"] => vec![
                GlobalEntry::function(NativeFunction::new("log", 1, print_value)),
                GlobalEntry::function(NativeFunction::new("println", 1, print_value)),
                GlobalEntry::class(
                    "person",
                    LoxClass::native("Person", vec![NativeFunction::new("hello", 0, person_hello)]),
                ),
            ],
            ["time"] => vec![GlobalEntry::function(NativeFunction::new("clock", 0, clock))],
            _ => Vec::new(),
        }
    }
}

fn print_value(interpreter: &mut Interpreter, arguments: &[Value]) -> Result<Value> {
    interpreter.write_line(&arguments[0].to_string())?;

    Ok(Value::Nil)
}

fn person_hello(interpreter: &mut Interpreter, _arguments: &[Value]) -> Result<Value> {
    interpreter.write_line("Hello from person!")?;

    Ok(Value::Nil)
}

fn clock(_interpreter: &mut Interpreter, _arguments: &[Value]) -> Result<Value> {
    let millis: i64 = Utc::now().timestamp_millis();

    Ok(Value::Number(millis as f64 / 1000.0))
}

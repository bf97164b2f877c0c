use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::{LoxCallable, LoxFunction, NativeFunction};
use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// Method name that runs automatically when a class is called.
pub const INITIALIZER: &str = "constructor";

/// A class: a name plus its methods.  Immutable once built.
///
/// Host classes injected by a [`GlobalProvider`](crate::stdlib::GlobalProvider)
/// carry `natives` instead of Rox methods; those are handed out unbound.
pub struct LoxClass {
    name: String,
    methods: HashMap<String, Rc<LoxFunction>>,
    natives: HashMap<String, Rc<NativeFunction>>,
}

impl LoxClass {
    pub fn new<S: Into<String>>(name: S, methods: HashMap<String, Rc<LoxFunction>>) -> Self {
        Self {
            name: name.into(),
            methods,
            natives: HashMap::new(),
        }
    }

    /// A host class without a constructor.
    pub fn native<S: Into<String>>(name: S, natives: Vec<NativeFunction>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
            natives: natives
                .into_iter()
                .map(|f| (f.name().to_string(), Rc::new(f)))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.methods.get(name).cloned()
    }

    fn find_native(&self, name: &str) -> Option<Rc<NativeFunction>> {
        self.natives.get(name).cloned()
    }
}

impl LoxCallable for LoxClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.find_method(INITIALIZER)
            .map_or(0, |initializer| initializer.arity())
    }

    fn call(self: Rc<Self>, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Instantiating class '{}'", self.name);

        let instance: Rc<LoxInstance> = Rc::new(LoxInstance::new(Rc::clone(&self)));

        if let Some(initializer) = self.find_method(INITIALIZER) {
            // The initializer's own result is discarded: construction always
            // yields the instance.
            Rc::new(initializer.bind(Rc::clone(&instance))).call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Debug for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

/// An object: a pointer to its class plus a lazily grown field bag.
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: RefCell<HashMap<String, Value>>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    /// Property lookup: fields shadow methods; methods come back bound.
    pub fn get(self: &Rc<Self>, name: &Token) -> Result<Value> {
        if let Some(value) = self.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = self.class.find_method(&name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(Rc::clone(self)))));
        }

        if let Some(native) = self.class.find_native(&name.lexeme) {
            return Ok(Value::Native(native));
        }

        Err(LoxError::runtime(
            name,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    /// Create or overwrite a field.
    pub fn set(&self, name: &Token, value: Value) {
        debug!("Setting field '{}' = {}", name.lexeme, value);

        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}

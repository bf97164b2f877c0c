use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to a scope.  Closures, child scopes and bound methods all
/// hold one, so a scope lives as long as anything that can still see it.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: a name → value map plus a link to its parent.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// The global (root) scope.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap into a shareable handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Insert or overwrite `name` in this scope.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up here, then in each enclosing scope.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Overwrite an *existing* binding; never creates one.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Non‑recursive lookup in this scope only.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

/// Walk exactly `distance` parent links from `env`.
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let next: EnvRef = current.borrow().enclosing.clone()?;
        current = next;
    }

    Some(current)
}

/// Read `name` from the scope exactly `distance` hops above `env`.
///
/// A resolved distance guarantees the binding exists; a miss here means the
/// resolver and interpreter disagree, surfaced as an internal runtime error.
pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
    debug!("get_at distance={} name={}", distance, name.lexeme);

    let scope: EnvRef = ancestor(env, distance).ok_or_else(|| unresolved(name, distance))?;
    let value: Option<Value> = scope.borrow().get_local(&name.lexeme);

    value.ok_or_else(|| unresolved(name, distance))
}

/// Overwrite `name` in the scope exactly `distance` hops above `env`.
pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
    debug!("assign_at distance={} name={}", distance, name.lexeme);

    let scope: EnvRef = ancestor(env, distance).ok_or_else(|| unresolved(name, distance))?;
    let mut scope = scope.borrow_mut();

    match scope.values.get_mut(&name.lexeme) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(unresolved(name, distance)),
    }
}

fn unresolved(name: &Token, distance: usize) -> LoxError {
    LoxError::runtime(
        name,
        format!(
            "Internal error: '{}' not bound at scope distance {}.",
            name.lexeme, distance
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn get_falls_back_to_enclosing_scope() {
        let globals = Environment::new().into_ref();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&globals));
        assert_eq!(inner.get(&ident("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_never_creates_a_binding() {
        let mut env = Environment::new();
        let err = env.assign(&ident("missing"), Value::Nil).unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable 'missing'.\n[line 1]");
        assert!(env.get_local("missing").is_none());
    }

    #[test]
    fn assign_updates_the_scope_that_owns_the_name() {
        let globals = Environment::new().into_ref();
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&globals)).into_ref();
        inner
            .borrow_mut()
            .assign(&ident("a"), Value::Number(2.0))
            .unwrap();

        assert!(inner.borrow().get_local("a").is_none());
        assert_eq!(globals.borrow().get_local("a"), Some(Value::Number(2.0)));
    }

    #[test]
    fn distance_lookups_skip_shadowing_scopes() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("x", Value::String("outer".into()));

        let inner = Environment::with_enclosing(Rc::clone(&outer)).into_ref();
        inner.borrow_mut().define("x", Value::String("inner".into()));

        assert_eq!(
            get_at(&inner, 1, &ident("x")).unwrap(),
            Value::String("outer".into())
        );

        assign_at(&inner, 0, &ident("x"), Value::Bool(true)).unwrap();
        assert_eq!(inner.borrow().get_local("x"), Some(Value::Bool(true)));
        assert_eq!(
            outer.borrow().get_local("x"),
            Some(Value::String("outer".into()))
        );
    }

    #[test]
    fn distance_past_the_root_is_an_internal_error() {
        let root = Environment::new().into_ref();
        assert!(get_at(&root, 3, &ident("x")).is_err());
    }
}

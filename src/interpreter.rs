//! Tree‑walking evaluator.
//!
//! Statements execute to a [`Flow`] completion: `Normal`, or `Return` carrying
//! the value of a `return` statement up to the nearest call boundary.  Runtime
//! failures travel separately as `Err(LoxError::Runtime { .. })`, so a
//! `return` can never be mistaken for an error by the top‑level loop.

use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::callable::{LoxCallable, LoxFunction};
use crate::class::{LoxClass, INITIALIZER};
use crate::environment::{self, EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::stdlib::{GlobalKind, GlobalProvider, StdLib};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// First import path segment that routes to the [`GlobalProvider`].
pub const STD_NAMESPACE: &str = "std";

/// Deepest allowed nesting of calls before `Stack overflow.` is raised.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Grow the native stack when less than this remains (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Stack space allocated per growth (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    /// Binding distances keyed by node.  Entries for a run's top-level code
    /// are dropped by [`Interpreter::release`]; entries inside function
    /// bodies stay for as long as the session, since closures may outlive
    /// the run that declared them.
    locals: HashMap<ExprId, usize>,
    call_depth: usize,
    output: Box<dyn Write>,
    provider: Box<dyn GlobalProvider>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter printing to stdout with the default standard library.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter printing to `output` with the default standard library.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self::with_provider(output, Box::new(StdLib))
    }

    pub fn with_provider(output: Box<dyn Write>, provider: Box<dyn GlobalProvider>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new().into_ref();

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            call_depth: 0,
            output,
            provider,
        }
    }

    /// Record that the node `id` refers to a binding `depth` scopes out.
    /// Called by the resolver.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Scope distance recorded for `id`, `None` for globals.
    pub fn distance(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Forget the distances recorded for `statements` outside any function
    /// or method body.  Called once a run's top-level code can no longer be
    /// executed again.
    pub fn release(&mut self, statements: &[Stmt]) {
        let mut ids: Vec<ExprId> = Vec::new();
        for stmt in statements {
            transient_ids_stmt(stmt, &mut ids);
        }

        debug!("Releasing {} resolved node(s)", ids.len());

        for id in ids {
            self.locals.remove(&id);
        }
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// Write one line to the program's output sink.
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;

        Ok(())
    }

    /// Run a program.  The first runtime error aborts the remaining
    /// statements and is returned to the caller.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statements", statements.len());

        // A top-level `return` is rejected by the resolver; if one slips
        // through it simply ends that statement.
        let result: Result<()> = statements
            .iter()
            .try_for_each(|stmt| self.execute(stmt).map(|_| ()));

        self.output.flush()?;

        if result.is_ok() {
            info!("Interpretation completed successfully");
        }

        result
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);
                self.write_line(&value.to_string())?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope: EnvRef = Environment::with_enclosing(Rc::clone(&self.environment)).into_ref();
                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = LoxFunction::new(Rc::clone(declaration), Rc::clone(&self.environment), false);

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);

                Ok(Flow::Return(value))
            }

            Stmt::Class { name, methods } => {
                debug!("Declaring class '{}'", name.lexeme);

                // Forward declaration so methods may mention the class.
                self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

                let mut table: HashMap<String, Rc<LoxFunction>> = HashMap::new();

                for method in methods {
                    let is_initializer: bool = method.name.lexeme == INITIALIZER;
                    let function =
                        LoxFunction::new(Rc::clone(method), Rc::clone(&self.environment), is_initializer);

                    // Later declarations with the same name win.
                    table.insert(method.name.lexeme.clone(), Rc::new(function));
                }

                let class = LoxClass::new(name.lexeme.clone(), table);

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(Rc::new(class)))?;

                Ok(Flow::Normal)
            }

            Stmt::Import { path, .. } => {
                self.import(path)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` with `environment` as the current scope, restoring
    /// the previous scope on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> Result<Flow> {
        debug!("Entering block with {} statements", statements.len());

        let previous: EnvRef = mem::replace(&mut self.environment, environment);
        let result: Result<Flow> = self.execute_sequence(statements);
        self.environment = previous;

        result
    }

    fn execute_sequence(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    fn import(&mut self, path: &[Token]) -> Result<()> {
        let segments: Vec<&str> = path.iter().map(|t| t.lexeme.as_str()).collect();

        let Some((&namespace, module)) = segments.split_first() else {
            return Ok(());
        };

        if namespace != STD_NAMESPACE {
            warn!("Ignoring import outside the '{}' namespace: {}", STD_NAMESPACE, segments.join("."));
            return Ok(());
        }

        let entries = self.provider.globals(module);

        if entries.is_empty() {
            warn!("Import of '{}' provided no globals", segments.join("."));
        }

        for entry in entries {
            let value: Value = match entry.kind {
                GlobalKind::Function(function) => Value::Native(function),
                GlobalKind::Class(class) => class.call(self, Vec::new())?,
            };

            info!("Importing global '{}' ({})", entry.name, value.type_name());

            // Silently replaces any existing global of the same name.
            self.globals.borrow_mut().define(&entry.name, value);
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match (&operator.token_type, right) {
                    (TokenType::BANG, value) => Ok(Value::Bool(!value.is_truthy())),
                    (TokenType::MINUS, Value::Number(n)) => Ok(Value::Number(-n)),
                    (TokenType::MINUS, _) => Err(LoxError::runtime(operator, "Operand must be a number.")),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
                }
            }

            Expr::Binary { left, operator, right } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;

                binary(operator, left, right)
            }

            Expr::Logical { left, operator, right } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.distance(*id) {
                    Some(distance) => environment::assign_at(&self.environment, distance, name, value.clone())?,
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                debug!("Assigned {} to '{}'", value, name.lexeme);

                Ok(value)
            }

            Expr::Call { callee, paren, arguments } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call_value(callee, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set { object, name, value } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.set(name, value.clone());

                Ok(value)
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        let value: Value = match self.distance(id) {
            Some(distance) => environment::get_at(&self.environment, distance, name)?,
            None => self.globals.borrow().get(name)?,
        };

        debug!("Variable '{}' evaluated to: {}", name.lexeme, value);

        Ok(value)
    }

    /// Invoke `callee`; the arity check happens before any of its code runs.
    fn call_value(&mut self, callee: Value, paren: &Token, arguments: Vec<Value>) -> Result<Value> {
        let Some(callable) = callee.as_callable() else {
            return Err(LoxError::runtime(paren, "Can only call functions and classes."));
        };

        if arguments.len() != callable.arity() {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        self.call_depth += 1;
        let result: Result<Value> =
            stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || callable.call(self, arguments));
        self.call_depth -= 1;

        let result: Value = result?;

        debug!("Call returned: {}", result);

        Ok(result)
    }
}

/// Ids of name‑bearing nodes reachable from `stmt` without entering a
/// function or method body.
fn transient_ids_stmt(stmt: &Stmt, ids: &mut Vec<ExprId>) {
    match stmt {
        Stmt::Expression(expr) | Stmt::Print(expr) => transient_ids_expr(expr, ids),
        Stmt::Var { initializer, .. } => {
            if let Some(expr) = initializer {
                transient_ids_expr(expr, ids);
            }
        }
        Stmt::Block(statements) => {
            for s in statements {
                transient_ids_stmt(s, ids);
            }
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            transient_ids_expr(condition, ids);
            transient_ids_stmt(then_branch, ids);
            if let Some(else_branch) = else_branch {
                transient_ids_stmt(else_branch, ids);
            }
        }
        Stmt::While { condition, body } => {
            transient_ids_expr(condition, ids);
            transient_ids_stmt(body, ids);
        }
        Stmt::Return { value, .. } => {
            if let Some(expr) = value {
                transient_ids_expr(expr, ids);
            }
        }
        Stmt::Function(_) | Stmt::Class { .. } | Stmt::Import { .. } => {}
    }
}

fn transient_ids_expr(expr: &Expr, ids: &mut Vec<ExprId>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Grouping(inner) | Expr::Unary { right: inner, .. } => transient_ids_expr(inner, ids),
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            transient_ids_expr(left, ids);
            transient_ids_expr(right, ids);
        }
        Expr::Variable { id, .. } | Expr::This { id, .. } => ids.push(*id),
        Expr::Assign { id, value, .. } => {
            ids.push(*id);
            transient_ids_expr(value, ids);
        }
        Expr::Call { callee, arguments, .. } => {
            transient_ids_expr(callee, ids);
            for argument in arguments {
                transient_ids_expr(argument, ids);
            }
        }
        Expr::Get { object, .. } => transient_ids_expr(object, ids),
        Expr::Set { object, value, .. } => {
            transient_ids_expr(object, ids);
            transient_ids_expr(value, ids);
        }
    }
}

/// Arithmetic, comparison and equality.  `1 / 0` is IEEE infinity, not an
/// error: the only check is that both operands are numbers.
fn binary(operator: &Token, left: Value, right: Value) -> Result<Value> {
    use Value::{Bool, Number};

    match (&operator.token_type, left, right) {
        (TokenType::EQUAL_EQUAL, l, r) => Ok(Bool(l == r)),
        (TokenType::BANG_EQUAL, l, r) => Ok(Bool(l != r)),

        (TokenType::PLUS, Number(a), Number(b)) => Ok(Number(a + b)),
        (TokenType::PLUS, Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (TokenType::PLUS, _, _) => Err(LoxError::runtime(
            operator,
            "Operands must be two numbers or two strings.",
        )),

        (TokenType::MINUS, Number(a), Number(b)) => Ok(Number(a - b)),
        (TokenType::STAR, Number(a), Number(b)) => Ok(Number(a * b)),
        (TokenType::SLASH, Number(a), Number(b)) => Ok(Number(a / b)),
        (TokenType::GREATER, Number(a), Number(b)) => Ok(Bool(a > b)),
        (TokenType::GREATER_EQUAL, Number(a), Number(b)) => Ok(Bool(a >= b)),
        (TokenType::LESS, Number(a), Number(b)) => Ok(Bool(a < b)),
        (TokenType::LESS_EQUAL, Number(a), Number(b)) => Ok(Bool(a <= b)),

        (
            TokenType::MINUS
            | TokenType::STAR
            | TokenType::SLASH
            | TokenType::GREATER
            | TokenType::GREATER_EQUAL
            | TokenType::LESS
            | TokenType::LESS_EQUAL,
            _,
            _,
        ) => Err(LoxError::runtime(operator, "Operands must be numbers.")),

        _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
    }
}

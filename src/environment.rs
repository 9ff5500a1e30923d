use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// A name is either declared-but-uninitialized (`var a;`) or bound to a
/// value.  Reading an uninitialized binding is a runtime error; assignment
/// initializes it.
#[derive(Debug, Clone)]
enum Binding {
    Uninitialized,
    Value(Value),
}

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Binding>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Define (or redefine) a name.  Redefinition is always allowed here;
    /// the resolver forbids it in non-global scopes before execution starts.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("Defining '{}'", name);

        self.values.insert(name.to_string(), Binding::Value(value));
    }

    pub fn define_uninitialized(&mut self, name: &str) {
        debug!("Defining '{}' (uninitialized)", name);

        self.values.insert(name.to_string(), Binding::Uninitialized);
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        match self.values.get(name) {
            Some(Binding::Value(value)) => Ok(value.clone()),

            Some(Binding::Uninitialized) => Err(LoxError::runtime(
                line,
                format!("Use of uninitialized variable '{}'.", name),
            )),

            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get(name, line),

                None => Err(LoxError::runtime(
                    line,
                    format!("Undefined variable '{}'.", name),
                )),
            },
        }
    }

    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), Binding::Value(value));
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value, line),

            None => Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            )),
        }
    }

    /// Read a name exactly `depth` hops up the chain.  The resolver
    /// guarantees the ancestor exists and holds the name; the error paths
    /// are kept so a resolution bug surfaces as a runtime error rather than
    /// a panic.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
        name: &str,
        line: usize,
    ) -> Result<Value> {
        let ancestor = Self::ancestor(env, depth, name, line)?;
        let borrowed = ancestor.borrow();

        match borrowed.values.get(name) {
            Some(Binding::Value(value)) => Ok(value.clone()),

            Some(Binding::Uninitialized) => Err(LoxError::runtime(
                line,
                format!("Use of uninitialized variable '{}'.", name),
            )),

            None => Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            )),
        }
    }

    /// Assign a name exactly `depth` hops up the chain.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let ancestor = Self::ancestor(env, depth, name, line)?;
        let mut borrowed = ancestor.borrow_mut();

        if borrowed.values.contains_key(name) {
            borrowed
                .values
                .insert(name.to_string(), Binding::Value(value));
            Ok(())
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        depth: usize,
        name: &str,
        line: usize,
    ) -> Result<Rc<RefCell<Environment>>> {
        let mut current = env.clone();

        for _ in 0..depth {
            let next = match &current.borrow().enclosing {
                Some(enclosing) => enclosing.clone(),

                None => {
                    return Err(LoxError::runtime(
                        line,
                        format!("Undefined variable '{}'.", name),
                    ));
                }
            };
            current = next;
        }

        Ok(current)
    }
}

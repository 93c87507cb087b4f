use crate::natives;
use crate::value::Value;
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A lexical scope. Lookups and assignments walk the `enclosing` chain outwards; a scope is
/// shared (`Rc<RefCell<_>>`) between the blocks executing in it and every closure created
/// there.
#[derive(Debug, Default)]
pub struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: AHashMap<String, Value>,
}

// Hands the value back to the caller so it can be bound somewhere else
#[derive(Debug, PartialEq)]
pub(crate) struct UndefinedVariable(pub(crate) Value);

impl Environment {
    pub fn new() -> Self {
        Environment {
            enclosing: None,
            values: AHashMap::new(),
        }
    }

    /// A root scope with the `JSON` namespace already bound.
    pub fn global() -> Self {
        let mut env = Environment::new();
        env.define("JSON", natives::json::namespace());
        env
    }

    pub fn with(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            enclosing: Some(enclosing),
            values: AHashMap::new(),
        }
    }

    /// Binds `key` in this scope, replacing a previous binding of the same scope.
    pub fn define(&mut self, key: &str, value: Value) {
        self.values.insert(String::from(key), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(val) = self.values.get(key) {
            Some(val.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.as_ref().borrow().get(key)
        } else {
            None
        }
    }

    /// Updates the nearest existing binding of `key`. When no scope in the chain has one, the
    /// name is defined in this scope instead.
    pub fn assign(&mut self, key: &str, value: Value) {
        if let Err(UndefinedVariable(value)) = self.assign_existing(key, value) {
            self.define(key, value);
        }
    }

    pub(crate) fn assign_existing(
        &mut self,
        key: &str,
        value: Value,
    ) -> Result<(), UndefinedVariable> {
        if let Some(val) = self.values.get_mut(key) {
            *val = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.as_ref().borrow_mut().assign_existing(key, value)
        } else {
            Err(UndefinedVariable(value))
        }
    }
}

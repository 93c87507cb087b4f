use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use sable_core::Token;

use crate::ast::Stmt;
use crate::env::Environment;
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

pub trait Callable {
    fn name(&self) -> &str;

    /// Calls never fail: problems surface as values, usually absent or an error object.
    fn execute(self: Rc<Self>, interpreter: &mut Interpreter<'_>, args: &[Value]) -> Value;
}

pub type NativeFn = Box<dyn Fn(&mut Interpreter<'_>, &[Value]) -> Value>;

// `Native` bridges rust closures and the interpreter. Natives receive the interpreter so
// they can call back into script functions, which `map` and `filter` need.
pub struct Native {
    name: String,
    func: NativeFn,
}

impl Native {
    pub fn new(name: &str, func: NativeFn) -> Self {
        Native {
            name: String::from(name),
            func,
        }
    }
}

impl Debug for Native {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native {}>", self.name)
    }
}

impl Callable for Native {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(self: Rc<Self>, interpreter: &mut Interpreter<'_>, args: &[Value]) -> Value {
        (self.func)(interpreter, args)
    }
}

/// A function literal together with the scope it was evaluated in.
pub struct Function {
    closure: Rc<RefCell<Environment>>,
    params: Vec<Token>,
    body: Rc<Vec<Stmt>>,
}

impl Function {
    // The body is shared with the syntax tree, evaluating a literal only bumps a count
    pub(crate) fn new(
        closure: Rc<RefCell<Environment>>,
        params: &[Token],
        body: &Rc<Vec<Stmt>>,
    ) -> Self {
        Function {
            closure,
            params: Vec::from(params),
            body: Rc::clone(body),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

// Closures can reach themselves through their environment, so this must not print it
impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let params: Vec<&str> = self.params.iter().map(|p| p.lexeme.as_str()).collect();
        write!(f, "<function({})>", params.join(", "))
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        "function"
    }

    // Missing arguments are bound as absent, extra ones are dropped. The body runs directly
    // in the call scope, so parameters and top-level body bindings share it.
    fn execute(self: Rc<Self>, interpreter: &mut Interpreter<'_>, args: &[Value]) -> Value {
        let mut env = Environment::with(Rc::clone(&self.closure));
        for (i, param) in self.params.iter().enumerate() {
            env.define(&param.lexeme, args.get(i).cloned().unwrap_or_default());
        }

        match interpreter.execute_block_with_env(&self.body, Rc::new(RefCell::new(env))) {
            Flow::Normal(value) | Flow::Return(value) => value,
        }
    }
}

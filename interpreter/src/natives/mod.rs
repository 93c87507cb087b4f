use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use ahash::AHashMap;
use tracing::warn;

use crate::callable::Native;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub(crate) mod array;
pub(crate) mod fetch;
pub(crate) mod json;
mod print;

/// Functions callable by bare name from scripts. The interpreter looks a call's identifier up
/// here before consulting the environment, so registered names can't be shadowed by script
/// variables when called.
#[derive(Default)]
pub struct Natives {
    functions: AHashMap<String, Rc<Native>>,
}

impl Natives {
    pub fn new() -> Self {
        Natives {
            functions: AHashMap::new(),
        }
    }

    /// The standard set: `print` writing to `stdout`, and `fetch`.
    pub fn standard(stdout: Rc<RefCell<dyn Write>>) -> Self {
        let mut natives = Natives::new();
        natives.register("print", print::print(stdout));
        natives.register("fetch", fetch::fetch);
        natives
    }

    pub fn register<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&mut Interpreter<'_>, &[Value]) -> Value + 'static,
    {
        self.functions
            .insert(String::from(name), Rc::new(Native::new(name, Box::new(func))));
    }

    pub fn get(&self, name: &str) -> Option<&Rc<Native>> {
        self.functions.get(name)
    }
}

pub(crate) fn native<F>(name: &str, func: F) -> Value
where
    F: Fn(&mut Interpreter<'_>, &[Value]) -> Value + 'static,
{
    Value::Native(Rc::new(Native::new(name, Box::new(func))))
}

/// Natives report failures as ordinary objects with a single `error` field.
pub(crate) fn error_object(msg: String) -> Value {
    warn!(error = %msg, "native returned an error");
    Value::object([("error", Value::from(msg))])
}

use std::cell::RefCell;
use std::rc::Rc;

use sable_core::Scanner;

mod ast;
mod callable;
mod env;
mod error;
mod interpreter;
mod natives;
mod parser;
mod printer;
mod value;

pub use ast::Program;
pub use callable::{Callable, Function, Native, NativeFn};
pub use env::Environment;
pub use error::Error;
pub use interpreter::{Flow, Interpreter};
pub use natives::Natives;
pub use parser::Parser;
pub use printer::AstPrinter;
pub use value::{Array, Object, Value};

/// Parses `source` into a program, or every diagnostic the parser produced.
pub fn parse(source: &str) -> Result<Program, Error> {
    Parser::new(Scanner::new().scan_tokens(source)).finish()
}

/// Scans, parses and evaluates `source` in `env`. Nothing is evaluated when the source has
/// parse errors; the errors are returned as a single `Error::Parse` instead.
pub fn evaluate(
    source: &str,
    env: &Rc<RefCell<Environment>>,
    natives: &Natives,
) -> Result<Value, Error> {
    let program = parse(source)?;
    Ok(Interpreter::new(natives, Rc::clone(env)).interpret(&program))
}

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use sable_core::{Token, Type};
use tracing::trace;

use crate::ast::{Expr, ExprVisitor, Literal, Program, Stmt, StmtVisitor};
use crate::callable::{Callable, Function};
use crate::env::Environment;
use crate::natives::{self, Natives};
use crate::value::Value;

/// Outcome of executing a statement. A `return` unwinds through enclosing blocks and loops
/// as `Flow::Return` until the function call that owns it unwraps it.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal(Value),
    Return(Value),
}

pub struct Interpreter<'a> {
    natives: &'a Natives,
    env: Rc<RefCell<Environment>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(natives: &'a Natives, env: Rc<RefCell<Environment>>) -> Self {
        Interpreter { natives, env }
    }

    /// Runs a program directly in the interpreter's environment and returns the value of its
    /// last statement, or the value of a top-level `return`.
    pub fn interpret(&mut self, program: &Program) -> Value {
        match self.execute_statements(&program.statements) {
            Flow::Normal(value) | Flow::Return(value) => value,
        }
    }

    /// Invokes a callable value with already evaluated arguments. Anything that isn't
    /// callable yields absent.
    pub fn call_value(&mut self, callee: &Value, args: &[Value]) -> Value {
        match callee {
            Value::Function(function) => {
                trace!(arity = function.arity(), args = args.len(), "calling function");
                Rc::clone(function).execute(self, args)
            }
            Value::Native(native) => {
                trace!(native = native.name(), args = args.len(), "calling native");
                Rc::clone(native).execute(self, args)
            }
            _ => Value::Undefined,
        }
    }

    pub(crate) fn execute_block_with_env(
        &mut self,
        statements: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> Flow {
        let previous = mem::replace(&mut self.env, env);
        let flow = self.execute_statements(statements);
        self.env = previous;
        flow
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Flow {
        let env = Environment::with(Rc::clone(&self.env));
        self.execute_block_with_env(statements, Rc::new(RefCell::new(env)))
    }

    fn execute_statements(&mut self, statements: &[Stmt]) -> Flow {
        let mut last = Value::Undefined;
        for stmt in statements {
            match self.visit_stmt(stmt) {
                Flow::Normal(value) => last = value,
                flow @ Flow::Return(_) => return flow,
            }
        }

        Flow::Normal(last)
    }

    fn evaluate_args(&mut self, args: &[Expr]) -> Vec<Value> {
        args.iter().map(|arg| self.visit_expr(arg)).collect()
    }
}

impl<'a> ExprVisitor for Interpreter<'a> {
    type Item = Value;

    fn visit_identifier(&mut self, name: &Token) -> Value {
        self.env.borrow().get(&name.lexeme).unwrap_or_default()
    }

    fn visit_literal(&mut self, value: &Literal) -> Value {
        match value {
            Literal::Str(val) => Value::from(val.as_str()),
            Literal::Num(val) => Value::from(*val),
            Literal::Bool(val) => Value::from(*val),
        }
    }

    fn visit_prefix(&mut self, operator: &Token, right: &Expr) -> Value {
        let right = self.visit_expr(right);
        match operator.ty {
            Type::Minus => Value::from(-right.to_number()),
            Type::Bang => Value::from(!right.is_truthy()),
            _ => Value::Undefined,
        }
    }

    fn visit_infix(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Value {
        let left = self.visit_expr(left);
        let right = self.visit_expr(right);

        match operator.ty {
            Type::Plus => match (&left, &right) {
                (Value::Str(_), _) | (_, Value::Str(_)) => {
                    Value::from(format!("{}{}", left, right))
                }
                _ => Value::from(left.to_number() + right.to_number()),
            },
            Type::Minus => Value::from(left.to_number() - right.to_number()),
            Type::Star => Value::from(left.to_number() * right.to_number()),
            Type::Slash => {
                let divisor = right.to_number();
                if divisor == 0.0 {
                    Value::from(0)
                } else {
                    Value::from(left.to_number() / divisor)
                }
            }
            Type::EqualEqual => Value::from(left == right),
            Type::BangEqual => Value::from(left != right),
            Type::Less => Value::from(left.to_number() < right.to_number()),
            Type::LessEqual => Value::from(left.to_number() <= right.to_number()),
            Type::Greater => Value::from(left.to_number() > right.to_number()),
            Type::GreaterEqual => Value::from(left.to_number() >= right.to_number()),
            _ => Value::Undefined,
        }
    }

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> Value {
        let value = self.visit_expr(value);
        self.env.borrow_mut().assign(&name.lexeme, value.clone());
        value
    }

    fn visit_function(&mut self, params: &[Token], body: &Rc<Vec<Stmt>>) -> Value {
        Value::Function(Rc::new(Function::new(
            Rc::clone(&self.env),
            params,
            body,
        )))
    }

    fn visit_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr]) -> Value {
        if let Expr::Identifier { name } = callee {
            let natives = self.natives;
            if let Some(native) = natives.get(&name.lexeme) {
                let args = self.evaluate_args(args);
                trace!(
                    native = native.name(),
                    line = paren.line,
                    args = args.len(),
                    "calling registered native"
                );
                return Rc::clone(native).execute(self, &args);
            }
        }

        let callee = self.visit_expr(callee);
        if !callee.is_callable() {
            trace!(line = paren.line, ty = callee.type_name(), "callee is not callable");
            return Value::Undefined;
        }

        let args = self.evaluate_args(args);
        self.call_value(&callee, &args)
    }

    fn visit_object(&mut self, pairs: &[(String, Expr)]) -> Value {
        let mut fields = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            fields.push((key.as_str(), self.visit_expr(value)));
        }
        Value::object(fields)
    }

    fn visit_array(&mut self, elements: &[Expr]) -> Value {
        Value::array(self.evaluate_args(elements))
    }

    fn visit_property(&mut self, object: &Expr, name: &Token) -> Value {
        match self.visit_expr(object) {
            Value::Array(array) => natives::array::property(&array, &name.lexeme),
            Value::Object(fields) => fields.get(&name.lexeme).cloned().unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    fn visit_index(&mut self, left: &Expr, index: &Expr) -> Value {
        let left = self.visit_expr(left);
        let index = self.visit_expr(index);

        match (&left, &index) {
            (Value::Array(elements), Value::Num(idx)) => {
                let idx = idx.trunc();
                let elements = elements.borrow();
                if !idx.is_finite() || idx < 0.0 || idx >= elements.len() as f64 {
                    Value::Undefined
                } else {
                    elements[idx as usize].clone()
                }
            }
            (Value::Object(fields), Value::Str(key)) => {
                fields.get(key.as_str()).cloned().unwrap_or_default()
            }
            _ => Value::Undefined,
        }
    }
}

impl<'a> StmtVisitor for Interpreter<'a> {
    type Item = Flow;

    fn visit_var(&mut self, name: &Token, init: Option<&Expr>) -> Flow {
        let value = match init {
            Some(init) => self.visit_expr(init),
            None => Value::Undefined,
        };

        self.env.borrow_mut().define(&name.lexeme, value.clone());
        Flow::Normal(value)
    }

    fn visit_return(&mut self, _keyword: &Token, value: Option<&Expr>) -> Flow {
        let value = match value {
            Some(value) => self.visit_expr(value),
            None => Value::Undefined,
        };

        Flow::Return(value)
    }

    fn visit_expression(&mut self, expression: &Expr) -> Flow {
        Flow::Normal(self.visit_expr(expression))
    }

    fn visit_block(&mut self, statements: &[Stmt]) -> Flow {
        self.execute_block(statements)
    }

    fn visit_if(
        &mut self,
        condition: &Expr,
        then_branch: &[Stmt],
        else_branch: Option<&Stmt>,
    ) -> Flow {
        if self.visit_expr(condition).is_truthy() {
            self.execute_block(then_branch)
        } else if let Some(else_branch) = else_branch {
            self.visit_stmt(else_branch)
        } else {
            Flow::Normal(Value::Undefined)
        }
    }

    fn visit_while(&mut self, condition: &Expr, body: &[Stmt]) -> Flow {
        let mut last = Value::Undefined;
        while self.visit_expr(condition).is_truthy() {
            match self.execute_block(body) {
                Flow::Normal(value) => last = value,
                flow @ Flow::Return(_) => return flow,
            }
        }

        Flow::Normal(last)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::env::Environment;
    use crate::error::Error;
    use crate::evaluate;
    use crate::interpreter::{Flow, Interpreter};
    use crate::natives::Natives;
    use crate::value::Value;

    fn natives(stdout: Rc<RefCell<Vec<u8>>>) -> Natives {
        Natives::standard(stdout)
    }

    fn eval(src: &str) -> Value {
        let env = Rc::new(RefCell::new(Environment::global()));
        let natives = natives(Rc::new(RefCell::new(Vec::new())));
        match evaluate(src, &env, &natives) {
            Ok(value) => value,
            Err(err) => panic!("unexpected error for {:?}: {}", src, err),
        }
    }

    fn output(src: &str) -> String {
        let stdout = Rc::new(RefCell::new(Vec::new()));
        let env = Rc::new(RefCell::new(Environment::global()));
        let natives = natives(stdout.clone());
        if let Err(err) = evaluate(src, &env, &natives) {
            panic!("unexpected error for {:?}: {}", src, err);
        }
        let out = stdout.borrow();
        String::from_utf8_lossy(&out).into_owned()
    }

    #[test]
    fn test_arithmetic() {
        let tests = [
            ("2 + 3 * 4", Value::from(14)),
            ("(2 + 3) * 4", Value::from(20)),
            ("10 / 4", Value::from(2.5)),
            ("10 / 0", Value::from(0)),
            ("-5 + 2", Value::from(-3)),
            ("\"6\" * \"7\"", Value::from(42)),
            ("\" 3 \" - 1", Value::from(2)),
            ("\"abc\" * 2", Value::from(0)),
            ("true * 3", Value::from(0)),
            ("-\"4\"", Value::from(-4)),
            ("5 - x", Value::from(5)),
        ];

        for (src, expected) in tests {
            assert_eq!(eval(src), expected, "source: {}", src);
        }
    }

    #[test]
    fn test_string_concatenation() {
        let tests = [
            ("\"foo\" + \"bar\"", "foobar"),
            ("\"n=\" + 5", "n=5"),
            ("1.5 + \"x\"", "1.5x"),
            ("\"v: \" + true", "v: true"),
            ("\"a\" + [1, 2]", "a[1, 2]"),
            ("\"u: \" + nothing", "u: nil"),
        ];

        for (src, expected) in tests {
            assert_eq!(eval(src), Value::from(expected), "source: {}", src);
        }
    }

    #[test]
    fn test_comparison_and_equality() {
        let tests = [
            ("1 < 2", true),
            ("2 <= 2", true),
            ("3 > 4", false),
            ("\"10\" > 9", true),
            ("5 == 5", true),
            ("5 == \"5\"", false),
            ("\"a\" != \"b\"", true),
            ("true == true", true),
            ("1 == true", false),
            ("nope == nada", true),
            ("0 == nope", false),
            ("[1] == [1]", false),
            ("var a = [1]; var b = a; a == b", true),
            ("var a = {}; var b = {}; a == b", false),
            ("!0", true),
            ("!\"\"", true),
            ("!![]", true),
        ];

        for (src, expected) in tests {
            assert_eq!(eval(src), Value::from(expected), "source: {}", src);
        }
    }

    #[test]
    fn test_variables_and_scopes() {
        let tests = [
            ("var x = 5; { x = 10; } x;", Value::from(10)),
            ("var x = 5; { var x = 10; } x;", Value::from(5)),
            ("let y; y", Value::Undefined),
            ("z = 3; z", Value::from(3)),
            ("{ w = 3; } w", Value::Undefined),
            ("var a = 1; var b = a = 2; a + b", Value::from(4)),
            ("undefinedThing", Value::Undefined),
            ("var x = 7", Value::from(7)),
        ];

        for (src, expected) in tests {
            assert_eq!(eval(src), expected, "source: {}", src);
        }
    }

    #[test]
    fn test_control_flow() {
        let tests = [
            ("if (1 < 2) { 10 } else { 20 }", Value::from(10)),
            ("if (0) { 10 } else { 20 }", Value::from(20)),
            ("if (false) { 10 }", Value::Undefined),
            ("var n = 5; if (n < 3) { 1 } else if (n < 6) { 2 } else { 3 }", Value::from(2)),
            ("var i = 0; while (i < 5) { i = i + 1; } i", Value::from(5)),
            ("var i = 0; while (i < 3) { i = i + 1; i * 10 }", Value::from(30)),
            ("while (false) { 1 }", Value::Undefined),
            ("{}", Value::Undefined),
            ("", Value::Undefined),
        ];

        for (src, expected) in tests {
            assert_eq!(eval(src), expected, "source: {}", src);
        }
    }

    #[test]
    fn test_functions_and_closures() {
        let tests = [
            ("var add = function(a, b) { return a + b; }; add(2, 3)", Value::from(5)),
            ("var f = function(a, b) { return b; }; f(1)", Value::Undefined),
            ("var f = function(a) { return a; }; f(1, 2, 3)", Value::from(1)),
            ("var f = function() { 1; 2; 3 }; f()", Value::from(3)),
            ("var f = function() { return; }; f()", Value::Undefined),
            (
                "var f = function(){ while(true){ return 7; } return 8; }; f();",
                Value::from(7),
            ),
            (
                "var f = function(x) { if (x > 0) { return \"pos\"; } return \"neg\"; }; f(-1)",
                Value::from("neg"),
            ),
            (
                "var fib = function(n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); }; fib(15)",
                Value::from(610),
            ),
            (
                "var adder = function(x) { return function(y) { return x + y; }; }; adder(2)(3)",
                Value::from(5),
            ),
            ("var x = 5; x()", Value::Undefined),
            ("var n = 0; var f = 1; f(n = 5); n", Value::from(0)),
            ("return 1; 2", Value::from(1)),
        ];

        for (src, expected) in tests {
            assert_eq!(eval(src), expected, "source: {}", src);
        }
    }

    #[test]
    fn test_counter_closure() {
        let src = "
            var makeCounter = function() {
                var count = 0;
                return function() {
                    count = count + 1;
                    return count;
                };
            };
            var counter = makeCounter();
            print(counter());
            print(counter());
            print(counter());
        ";
        assert_eq!(output(src), "1\n2\n3\n");
    }

    #[test]
    fn test_arrays_and_objects() {
        let tests = [
            ("var a = [1, 2, 3]; a[0]", Value::from(1)),
            ("var a = [1, 2, 3]; a[1.9]", Value::from(2)),
            ("var a = [1, 2, 3]; a[5]", Value::Undefined),
            ("var a = [1, 2, 3]; a[-1]", Value::Undefined),
            ("var a = [1, 2, 3]; a[\"nan\" * 1]", Value::Undefined),
            ("var a = [1, 2, 3]; a[\"inf\" * 1]", Value::Undefined),
            ("var a = [1, 2, 3]; a[\"0\"]", Value::Undefined),
            ("[1, 2, 3].length", Value::from(3)),
            ("var o = {name: \"Alice\", age: 30}; o.name", Value::from("Alice")),
            ("var o = {name: \"Alice\"}; o[\"name\"]", Value::from("Alice")),
            ("var o = {name: \"Alice\"}; o.missing", Value::Undefined),
            ("var o = {a: 1, a: 2}; o.a", Value::from(2)),
            ("var o = {inner: {v: [10, 20]}}; o.inner.v[1]", Value::from(20)),
            ("var n = 5; n.foo", Value::Undefined),
            ("\"str\"[0]", Value::Undefined),
        ];

        for (src, expected) in tests {
            assert_eq!(eval(src), expected, "source: {}", src);
        }
    }

    #[test]
    fn test_arrays_are_shared() {
        let src = "
            var a = [1];
            var b = a;
            b.push(2);
            print(a, a.length);
        ";
        assert_eq!(output(src), "[1, 2] 2\n");
    }

    #[test]
    fn test_return_unwinds_as_flow() {
        let program = crate::parse("while (true) { return 3; } 4").unwrap();
        let natives = Natives::new();
        let mut interpreter =
            Interpreter::new(&natives, Rc::new(RefCell::new(Environment::new())));

        assert_eq!(
            interpreter.execute_statements(&program.statements),
            Flow::Return(Value::from(3))
        );
        assert_eq!(interpreter.interpret(&program), Value::from(3));
    }

    #[test]
    fn test_print_self_containing_array() {
        assert_eq!(output("var a = [1]; a.push(a); print(a)"), "[1, [...]]\n");
    }

    #[test]
    fn test_parse_errors_refuse_evaluation() {
        let stdout = Rc::new(RefCell::new(Vec::new()));
        let env = Rc::new(RefCell::new(Environment::global()));
        let natives = natives(stdout.clone());

        match evaluate("print(1); var x = ;", &env, &natives) {
            Err(Error::Parse(errors)) => assert!(!errors.is_empty()),
            other => panic!("expected parse errors, got {:?}", other),
        }
        assert!(stdout.borrow().is_empty());
    }
}

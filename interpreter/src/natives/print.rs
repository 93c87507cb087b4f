use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use tracing::warn;

use crate::interpreter::Interpreter;
use crate::value::Value;

// Arguments are written space separated with a trailing newline
pub(super) fn print(
    stdout: Rc<RefCell<dyn Write>>,
) -> impl Fn(&mut Interpreter<'_>, &[Value]) -> Value + 'static {
    move |_: &mut Interpreter<'_>, args: &[Value]| {
        let line = args
            .iter()
            .map(|arg| arg.to_string())
            .collect::<Vec<String>>()
            .join(" ");

        if let Err(err) = writeln!(stdout.borrow_mut(), "{}", line) {
            warn!(error = %err, "print failed to write");
        }
        Value::Undefined
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::env::Environment;
    use crate::evaluate;
    use crate::natives::Natives;
    use crate::value::Value;

    #[test]
    fn test_print() {
        let tests = [
            ("print(\"hello\")", "hello\n"),
            ("print(1, \"a\", true)", "1 a true\n"),
            ("print()", "\n"),
            ("print(3.14, -2, nothing)", "3.14 -2 nil\n"),
            ("print([1, [2, 3]], {b: 2, a: 1})", "[1, [2, 3]] {a: 1, b: 2}\n"),
            ("print(function() {})", "<function>\n"),
            ("print(JSON.parse)", "<native parse>\n"),
        ];

        for (src, expected) in tests {
            let stdout = Rc::new(RefCell::new(Vec::new()));
            let natives = Natives::standard(stdout.clone());
            let env = Rc::new(RefCell::new(Environment::global()));

            assert_eq!(evaluate(src, &env, &natives), Ok(Value::Undefined));
            assert_eq!(String::from_utf8_lossy(&stdout.borrow()), expected);
        }
    }
}

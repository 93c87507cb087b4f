use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::callable::{Callable, Function, Native};

/// Arrays are shared by reference, so `push` through one holder is seen by every holder.
pub type Array = Rc<RefCell<Vec<Value>>>;

/// Objects are never mutated in place by scripts, only built by literals and natives. Keys
/// are kept sorted so printing and `JSON.stringify` are deterministic.
pub type Object = Rc<BTreeMap<String, Value>>;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Bool(bool),
    Num(f64),
    Str(Rc<String>),
    Array(Array),
    Object(Object),
    Function(Rc<Function>),
    Native(Rc<Native>),
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn object<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(Rc::new(
            pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Absent, `false`, zero (and NaN) and the empty string are falsy, everything else is
    /// truthy, including empty arrays and objects.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Bool(val) => *val,
            Value::Num(val) => *val != 0.0 && !val.is_nan(),
            Value::Str(val) => !val.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Native(_) => true,
        }
    }

    /// Numeric coercion used by the arithmetic and relational operators. Strings are parsed
    /// (unparsable ones count as zero), every other non-number is zero.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Num(val) => *val,
            Value::Str(val) => val.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) | Value::Native(_) => "function",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    /// Property lookup on objects. Anything that isn't an object has no properties here;
    /// array properties are resolved by the interpreter.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Value::Object(fields) => fields.get(key).cloned(),
            _ => None,
        }
    }
}

// Equality never coerces: values of different variants are unequal. Containers and
// callables compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
            (Value::Num(lhs), Value::Num(rhs)) => lhs == rhs,
            (Value::Str(lhs), Value::Str(rhs)) => lhs == rhs,
            (Value::Array(lhs), Value::Array(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Object(lhs), Value::Object(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Function(lhs), Value::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            (Value::Native(lhs), Value::Native(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Rc::new(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Rc::new(String::from(value)))
    }
}

macro_rules! impl_from_num_for_value {
    ( $( $t:ident )* ) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Value {
                    Value::Num(n as f64)
                }
            }
        )*
    }
}

impl_from_num_for_value!(u8 i8 u16 i16 u32 i32 u64 i64 usize isize f32 f64);

fn write_num(f: &mut Formatter<'_>, n: f64) -> std::fmt::Result {
    // -0 prints as 0, integral values print without a fraction
    if n == 0.0 {
        write!(f, "0")
    } else {
        write!(f, "{}", n)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_value(f, self, &mut Vec::new())
    }
}

// `open` holds the containers currently being written. A container reached again from
// inside itself prints as `[...]` or `{...}`.
fn write_value(
    f: &mut Formatter<'_>,
    value: &Value,
    open: &mut Vec<*const ()>,
) -> std::fmt::Result {
    match value {
        Value::Undefined => write!(f, "nil"),
        Value::Bool(val) => write!(f, "{}", val),
        Value::Num(val) => write_num(f, *val),
        Value::Str(val) => write!(f, "{}", val),
        Value::Array(elements) => {
            let ptr = Rc::as_ptr(elements) as *const ();
            if open.contains(&ptr) {
                return write!(f, "[...]");
            }

            open.push(ptr);
            write!(f, "[")?;
            for (i, elem) in elements.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_value(f, elem, open)?;
            }
            open.pop();
            write!(f, "]")
        }
        Value::Object(fields) => {
            let ptr = Rc::as_ptr(fields) as *const ();
            if open.contains(&ptr) {
                return write!(f, "{{...}}");
            }

            open.push(ptr);
            write!(f, "{{")?;
            for (i, (key, val)) in fields.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: ", key)?;
                write_value(f, val, open)?;
            }
            open.pop();
            write!(f, "}}")
        }
        Value::Function(_) => write!(f, "<function>"),
        Value::Native(native) => write!(f, "<native {}>", native.name()),
    }
}

#[cfg(test)]
mod tests {
    use crate::value::Value;

    #[test]
    fn test_display() {
        let tests = [
            (Value::from(42), "42"),
            (Value::from(3.14), "3.14"),
            (Value::from(-5), "-5"),
            (Value::from(0), "0"),
            (Value::from(-0.0), "0"),
            (Value::from(100.0), "100"),
            (Value::from("hello"), "hello"),
            (Value::from(true), "true"),
            (Value::from(false), "false"),
            (Value::Undefined, "nil"),
            (
                Value::array(vec![Value::from(1), Value::from("a"), Value::Undefined]),
                "[1, a, nil]",
            ),
            (
                Value::object([("name", Value::from("Alice")), ("age", Value::from(30))]),
                "{age: 30, name: Alice}",
            ),
            (Value::object(Vec::<(String, Value)>::new()), "{}"),
        ];

        for (value, expected) in tests {
            assert_eq!(value.to_string(), expected);
        }
    }

    #[test]
    fn test_display_cycles() {
        let inner = Value::array(vec![Value::from(1)]);
        let shared = Value::array(vec![inner.clone(), inner.clone()]);
        assert_eq!(shared.to_string(), "[[1], [1]]");

        let cyclic = Value::array(vec![Value::from(1)]);
        if let Value::Array(elements) = &cyclic {
            elements.borrow_mut().push(cyclic.clone());
        }
        assert_eq!(cyclic.to_string(), "[1, [...]]");

        let holder = Value::array(Vec::new());
        let object = Value::object([("items", holder.clone())]);
        if let Value::Array(elements) = &holder {
            elements.borrow_mut().push(object.clone());
        }
        assert_eq!(object.to_string(), "{items: [{...}]}");
    }

    #[test]
    fn test_truthiness() {
        let tests = [
            (Value::Undefined, false),
            (Value::from(false), false),
            (Value::from(true), true),
            (Value::from(0), false),
            (Value::from(f64::NAN), false),
            (Value::from(-1), true),
            (Value::from(""), false),
            (Value::from("0"), true),
            (Value::array(Vec::new()), true),
            (Value::object(Vec::<(String, Value)>::new()), true),
        ];

        for (value, expected) in tests {
            assert_eq!(value.is_truthy(), expected, "truthiness of {}", value);
        }
    }

    #[test]
    fn test_to_number() {
        let tests = [
            (Value::from(2.5), 2.5),
            (Value::from("12"), 12.0),
            (Value::from(" 7.5 "), 7.5),
            (Value::from("abc"), 0.0),
            (Value::from(true), 0.0),
            (Value::Undefined, 0.0),
            (Value::array(vec![Value::from(1)]), 0.0),
        ];

        for (value, expected) in tests {
            assert_eq!(value.to_number(), expected, "coercion of {}", value);
        }
    }

    #[test]
    fn test_equality_is_per_variant() {
        assert_eq!(Value::from(5), Value::from(5));
        assert_ne!(Value::from(5), Value::from("5"));
        assert_ne!(Value::from(1), Value::from(true));
        assert_ne!(Value::from(0), Value::Undefined);
        assert_eq!(Value::Undefined, Value::Undefined);
        assert_eq!(Value::from("a"), Value::from("a"));

        let arr = Value::array(vec![Value::from(1)]);
        assert_eq!(arr, arr.clone());
        assert_ne!(arr, Value::array(vec![Value::from(1)]));
    }
}

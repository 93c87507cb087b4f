use std::rc::Rc;

use crate::interpreter::Interpreter;
use crate::natives::{error_object, native};
use crate::value::Value;

/// The `JSON` namespace object bound in the global environment.
pub(crate) fn namespace() -> Value {
    Value::object([
        ("stringify", native("stringify", stringify)),
        ("parse", native("parse", parse)),
    ])
}

fn stringify(_: &mut Interpreter<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return error_object(String::from(
            "JSON.stringify requires exactly 1 argument",
        ));
    }

    let text = to_json(&args[0])
        .and_then(|json| serde_json::to_string(&json).map_err(|err| err.to_string()));
    match text {
        Ok(text) => Value::from(text),
        Err(msg) => error_object(format!("JSON.stringify error: {}", msg)),
    }
}

fn parse(_: &mut Interpreter<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return error_object(String::from("JSON.parse requires exactly 1 argument"));
    }

    let text = match &args[0] {
        Value::Str(text) => text,
        other => {
            return error_object(format!(
                "JSON.parse requires a string argument, got {}",
                other.type_name()
            ))
        }
    };

    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json) => from_json(json),
        Err(err) => error_object(format!("JSON.parse error: {}", err)),
    }
}

pub(crate) fn to_json(value: &Value) -> Result<serde_json::Value, String> {
    convert(value, &mut Vec::new())
}

// `open` holds the containers on the current path, meeting one again means a cycle.
fn convert(value: &Value, open: &mut Vec<*const ()>) -> Result<serde_json::Value, String> {
    match value {
        Value::Undefined => Ok(serde_json::Value::Null),
        Value::Bool(val) => Ok(serde_json::Value::Bool(*val)),
        Value::Num(val) => {
            // integral values are written without a fraction
            if val.fract() == 0.0 && val.abs() < i64::MAX as f64 {
                Ok(serde_json::Value::from(*val as i64))
            } else {
                serde_json::Number::from_f64(*val)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| format!("unsupported value: {}", val))
            }
        }
        Value::Str(val) => Ok(serde_json::Value::String(val.to_string())),
        Value::Array(elements) => {
            let ptr = Rc::as_ptr(elements) as *const ();
            if open.contains(&ptr) {
                return Err(String::from("cyclic value"));
            }

            open.push(ptr);
            let mut out = Vec::new();
            for elem in elements.borrow().iter() {
                out.push(convert(elem, open)?);
            }
            open.pop();
            Ok(serde_json::Value::Array(out))
        }
        Value::Object(fields) => {
            let ptr = Rc::as_ptr(fields) as *const ();
            if open.contains(&ptr) {
                return Err(String::from("cyclic value"));
            }

            open.push(ptr);
            let mut map = serde_json::Map::new();
            for (key, val) in fields.iter() {
                map.insert(key.clone(), convert(val, open)?);
            }
            open.pop();
            Ok(serde_json::Value::Object(map))
        }
        Value::Function(_) | Value::Native(_) => {
            Err(format!("unsupported type: {}", value.type_name()))
        }
    }
}

pub(crate) fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Undefined,
        serde_json::Value::Bool(val) => Value::from(val),
        serde_json::Value::Number(n) => Value::from(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::from(s),
        serde_json::Value::Array(elements) => {
            Value::array(elements.into_iter().map(from_json).collect())
        }
        serde_json::Value::Object(fields) => {
            Value::object(fields.into_iter().map(|(k, v)| (k, from_json(v))))
        }
    }
}

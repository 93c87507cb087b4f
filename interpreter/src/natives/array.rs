use std::rc::Rc;

use crate::interpreter::Interpreter;
use crate::natives::native;
use crate::value::{Array, Value};

/// Resolves `array.name`. Methods come back as natives bound to the receiving array.
pub(crate) fn property(array: &Array, name: &str) -> Value {
    match name {
        "length" => Value::from(array.borrow().len()),
        "push" => {
            let array = Rc::clone(array);
            native("push", move |_, args| {
                let mut elements = array.borrow_mut();
                elements.extend_from_slice(args);
                Value::from(elements.len())
            })
        }
        "map" => {
            let array = Rc::clone(array);
            native("map", move |interpreter, args| {
                each(interpreter, &array, args, |out, _, res| out.push(res))
            })
        }
        "filter" => {
            let array = Rc::clone(array);
            native("filter", move |interpreter, args| {
                each(interpreter, &array, args, |out, elem, res| {
                    if res.is_truthy() {
                        out.push(elem);
                    }
                })
            })
        }
        _ => Value::Undefined,
    }
}

// Calls `callback(element, index, array)` for each element of a snapshot of the array, so
// callbacks pushing to the array neither see the new elements nor hold a borrow.
fn each<F>(
    interpreter: &mut Interpreter<'_>,
    array: &Array,
    args: &[Value],
    mut collect: F,
) -> Value
where
    F: FnMut(&mut Vec<Value>, Value, Value),
{
    let callback = match args.first() {
        Some(callback) if callback.is_callable() => callback.clone(),
        _ => return Value::Undefined,
    };

    let snapshot = array.borrow().clone();
    let mut out = Vec::with_capacity(snapshot.len());
    for (i, elem) in snapshot.into_iter().enumerate() {
        let res = interpreter.call_value(
            &callback,
            &[elem.clone(), Value::from(i), Value::Array(Rc::clone(array))],
        );
        collect(&mut out, elem, res);
    }

    Value::array(out)
}

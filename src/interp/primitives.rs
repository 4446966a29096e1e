//! Primitive operation library
//!
//! Each primitive checks the tag of every operand and faults with a type
//! mismatch naming the expected type. Arity is checked by the caller.
//! `print` and `array-map` need the evaluator and are handled there.

use crate::ast::Primitive;

use super::error::{RuntimeError, RuntimeResult};
use super::value::{ArrayStorage, Value};

fn int(prim: Primitive, value: &Value) -> RuntimeResult<i64> {
    value
        .as_int()
        .ok_or_else(|| RuntimeError::type_mismatch(prim.name(), "integer", value.type_name()))
}

fn string(prim: Primitive, value: &Value) -> RuntimeResult<&str> {
    value
        .as_string()
        .ok_or_else(|| RuntimeError::type_mismatch(prim.name(), "string", value.type_name()))
}

pub(crate) fn array(prim: Primitive, value: &Value) -> RuntimeResult<ArrayStorage> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        other => Err(RuntimeError::type_mismatch(
            prim.name(),
            "array",
            other.type_name(),
        )),
    }
}

fn checked_index(index: i64, len: usize) -> RuntimeResult<usize> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or(RuntimeError::IndexOutOfBounds { index, len })
}

/// Resolve a possibly negative slice bound against `len`, clamping
fn slice_bound(bound: i64, len: usize) -> usize {
    let len = len as i64;
    let resolved = if bound < 0 { bound + len } else { bound };
    resolved.clamp(0, len) as usize
}

fn substring(s: &str, start: i64, end: i64) -> String {
    let len = s.chars().count();
    let start = slice_bound(start, len);
    let end = slice_bound(end, len);
    if start >= end {
        return String::new();
    }
    s.chars().skip(start).take(end - start).collect()
}

/// Apply a primitive to already-evaluated operands
pub fn apply(prim: Primitive, args: &[Value]) -> RuntimeResult<Value> {
    debug_assert_eq!(args.len(), prim.arity());

    match prim {
        Primitive::Add => Ok(Value::Int(
            int(prim, &args[0])?.wrapping_add(int(prim, &args[1])?),
        )),
        Primitive::Sub => Ok(Value::Int(
            int(prim, &args[0])?.wrapping_sub(int(prim, &args[1])?),
        )),
        Primitive::Mul => Ok(Value::Int(
            int(prim, &args[0])?.wrapping_mul(int(prim, &args[1])?),
        )),
        Primitive::Div => {
            let (a, b) = (int(prim, &args[0])?, int(prim, &args[1])?);
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            // Truncates toward zero
            Ok(Value::Int(a.wrapping_div(b)))
        }
        Primitive::Lt => Ok(Value::Bool(int(prim, &args[0])? < int(prim, &args[1])?)),
        Primitive::Gt => Ok(Value::Bool(int(prim, &args[0])? > int(prim, &args[1])?)),
        Primitive::Le => Ok(Value::Bool(int(prim, &args[0])? <= int(prim, &args[1])?)),
        Primitive::Ge => Ok(Value::Bool(int(prim, &args[0])? >= int(prim, &args[1])?)),
        Primitive::Eq => Ok(Value::Bool(int(prim, &args[0])? == int(prim, &args[1])?)),
        Primitive::IsZero => Ok(Value::Bool(int(prim, &args[0])? == 0)),

        Primitive::Length => Ok(Value::Int(string(prim, &args[0])?.chars().count() as i64)),
        Primitive::Substring => {
            let s = string(prim, &args[0])?;
            let start = int(prim, &args[1])?;
            let end = int(prim, &args[2])?;
            Ok(Value::String(substring(s, start, end)))
        }
        Primitive::Concat => {
            let mut s = string(prim, &args[0])?.to_string();
            s.push_str(string(prim, &args[1])?);
            Ok(Value::String(s))
        }
        Primitive::StartsWith => Ok(Value::Bool(
            string(prim, &args[0])?.starts_with(string(prim, &args[1])?),
        )),
        Primitive::EndsWith => Ok(Value::Bool(
            string(prim, &args[0])?.ends_with(string(prim, &args[1])?),
        )),
        Primitive::Lower => Ok(Value::String(string(prim, &args[0])?.to_lowercase())),
        Primitive::Upper => Ok(Value::String(string(prim, &args[0])?.to_uppercase())),

        Primitive::Deref => match &args[0] {
            Value::Ref(cell) => Ok(cell.borrow().clone()),
            other => Err(RuntimeError::type_mismatch(
                "dereference",
                "ref",
                other.type_name(),
            )),
        },
        Primitive::Update => match &args[0] {
            Value::Ref(cell) => {
                *cell.borrow_mut() = args[1].clone();
                Ok(Value::None)
            }
            other => Err(RuntimeError::type_mismatch(
                "update",
                "ref",
                other.type_name(),
            )),
        },
        Primitive::UpdateArray => {
            let target = match &args[0] {
                Value::Ref(cell) => cell.borrow().clone(),
                other => {
                    return Err(RuntimeError::type_mismatch(
                        "update",
                        "ref",
                        other.type_name(),
                    ));
                }
            };
            let items = array(prim, &target)?;
            let index = int(prim, &args[2])?;
            let mut items = items.borrow_mut();
            let slot = checked_index(index, items.len())?;
            items[slot] = args[1].clone();
            Ok(Value::None)
        }

        Primitive::ArrayIndex => {
            let items = array(prim, &args[0])?;
            let index = int(prim, &args[1])?;
            let items = items.borrow();
            let slot = checked_index(index, items.len())?;
            Ok(items[slot].clone())
        }
        Primitive::ArrayLength => Ok(Value::Int(array(prim, &args[0])?.borrow().len() as i64)),

        Primitive::Print | Primitive::ArrayMap => Err(RuntimeError::type_mismatch(
            prim.name(),
            "evaluator context",
            "bare operands",
        )),
    }
}

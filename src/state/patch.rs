//! Patch operations against a JSON tree.
//!
//! Supports the operation set the transcript producer emits, with standard
//! pointer semantics: no intermediate structure is created, `-` appends to
//! an array, and an array index may equal the length only for `add`.

use serde_json::Value;

use super::pointer::{self, APPEND, parse_index, parse_pointer, split_parent};
use crate::error::{Error, Result};
use crate::model::{OpKind, Operation};

/// Apply a single operation to `doc` in place.
///
/// On error `doc` may be partially modified only for `move`, whose removal
/// precedes the insert; callers wanting atomicity apply to a copy.
pub fn apply_operation(doc: &mut Value, operation: &Operation) -> Result<()> {
    let path = operation.path.as_str();
    match operation.op {
        OpKind::Add => add(doc, OpKind::Add, path, value_of(operation)),
        OpKind::Remove => remove(doc, OpKind::Remove, path).map(drop),
        OpKind::Replace => replace(doc, path, value_of(operation)),
        OpKind::Copy => {
            let from = required_from(operation)?;
            let segments = parse_pointer(from)?;
            let value = pointer::get(doc, &segments)
                .cloned()
                .ok_or_else(|| Error::patch(OpKind::Copy, path, format!("source {from} does not exist")))?;
            add(doc, OpKind::Copy, path, value)
        }
        OpKind::Move => {
            let from = required_from(operation)?;
            if from == path {
                return Ok(());
            }
            if path.starts_with(from) && path[from.len()..].starts_with('/') {
                return Err(Error::patch(
                    OpKind::Move,
                    path,
                    format!("cannot move {from} into its own child"),
                ));
            }
            let value = remove(doc, OpKind::Move, from)?;
            add(doc, OpKind::Move, path, value)
        }
        OpKind::Test => {
            let expected = value_of(operation);
            let segments = parse_pointer(path)?;
            match pointer::get(doc, &segments) {
                Some(actual) if *actual == expected => Ok(()),
                Some(actual) => Err(Error::patch(
                    OpKind::Test,
                    path,
                    format!("expected {expected}, found {actual}"),
                )),
                None => Err(Error::patch(OpKind::Test, path, "path does not exist")),
            }
        }
    }
}

/// Apply operations in order, stopping at the first failure.
pub fn apply_operations(doc: &mut Value, operations: &[Operation]) -> Result<()> {
    operations
        .iter()
        .try_for_each(|operation| apply_operation(doc, operation))
}

/// JSON `null` and an absent `value` deserialize alike, so a missing
/// payload means null.
fn value_of(operation: &Operation) -> Value {
    operation.value.clone().unwrap_or(Value::Null)
}

fn required_from(operation: &Operation) -> Result<&str> {
    operation
        .from
        .as_deref()
        .ok_or_else(|| Error::patch(operation.op, &operation.path, "missing from"))
}

fn add(doc: &mut Value, op: OpKind, path: &str, value: Value) -> Result<()> {
    let segments = parse_pointer(path)?;
    let Some((parent, last)) = split_parent(&segments) else {
        *doc = value;
        return Ok(());
    };
    let container = pointer::get_mut(doc, parent)
        .ok_or_else(|| Error::patch(op, path, "parent does not exist"))?;
    match container {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            if last == APPEND {
                items.push(value);
                return Ok(());
            }
            let index =
                parse_index(last).ok_or_else(|| Error::patch(op, path, "invalid array index"))?;
            if index > items.len() {
                return Err(Error::patch(
                    op,
                    path,
                    format!("index {index} out of bounds for length {}", items.len()),
                ));
            }
            items.insert(index, value);
            Ok(())
        }
        _ => Err(Error::patch(op, path, "parent is not a container")),
    }
}

fn remove(doc: &mut Value, op: OpKind, path: &str) -> Result<Value> {
    let segments = parse_pointer(path)?;
    let Some((parent, last)) = split_parent(&segments) else {
        return Err(Error::patch(op, path, "cannot remove the root"));
    };
    let container = pointer::get_mut(doc, parent)
        .ok_or_else(|| Error::patch(op, path, "parent does not exist"))?;
    let removed = match container {
        Value::Object(map) => map.remove(last),
        Value::Array(items) => match parse_index(last) {
            Some(index) if index < items.len() => Some(items.remove(index)),
            _ => None,
        },
        _ => None,
    };
    removed.ok_or_else(|| Error::patch(op, path, "path does not exist"))
}

fn replace(doc: &mut Value, path: &str, value: Value) -> Result<()> {
    let segments = parse_pointer(path)?;
    let target = pointer::get_mut(doc, &segments)
        .ok_or_else(|| Error::patch(OpKind::Replace, path, "path does not exist"))?;
    *target = value;
    Ok(())
}

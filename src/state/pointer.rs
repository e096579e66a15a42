//! Slash-delimited pointers into the resolved state.

use serde_json::Value;

use crate::error::{Error, Result};

/// Terminal segment meaning "one past the end of an array".
pub const APPEND: &str = "-";

/// Split a pointer into unescaped segments. The empty pointer is the root.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(Error::Pointer(pointer.to_string()));
    };
    Ok(rest
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect())
}

/// Split segments into the parent path and the final segment.
pub fn split_parent(segments: &[String]) -> Option<(&[String], &str)> {
    let (last, parent) = segments.split_last()?;
    Some((parent, last.as_str()))
}

/// Parse an array index segment. Leading zeros and signs are rejected.
pub fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || (segment.len() > 1 && segment.starts_with('0')) {
        return None;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

pub fn get<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
        _ => None,
    })
}

pub fn get_mut<'a>(root: &'a mut Value, segments: &[String]) -> Option<&'a mut Value> {
    let mut node = root;
    for segment in segments {
        node = match node {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(items) => items.get_mut(parse_index(segment)?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Look up a pointer, treating a malformed pointer as absent.
pub fn lookup<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    let segments = parse_pointer(pointer).ok()?;
    get(root, &segments)
}

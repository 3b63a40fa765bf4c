//! Defensive navigation of response envelopes.
//!
//! Deployments differ in whether the payload sits under a `data` (or
//! `output`) wrapper and in whether keys carry a YANG module prefix. These
//! helpers accept both shapes.

use serde_json::Value;

/// Looks up `name` in an object, accepting a `module:` prefix on the key.
pub fn field<'v>(value: &'v Value, name: &str) -> Option<&'v Value> {
    let object = value.as_object()?;
    if let Some(found) = object.get(name) {
        return Some(found);
    }
    object.iter().find_map(|(key, v)| {
        key.rsplit_once(':')
            .filter(|(_, local)| *local == name)
            .map(|_| v)
    })
}

/// String value of a (possibly prefixed) key.
pub fn str_field<'v>(value: &'v Value, name: &str) -> Option<&'v str> {
    field(value, name).and_then(Value::as_str)
}

/// Strips an optional single-key `wrapper` object.
pub fn unwrap<'v>(value: &'v Value, wrapper: &str) -> &'v Value {
    match value.as_object() {
        Some(object) if object.len() == 1 => field(value, wrapper).unwrap_or(value),
        _ => value,
    }
}

/// Strips an optional `data` wrapper.
pub fn unwrap_data(value: &Value) -> &Value {
    unwrap(value, "data")
}

/// Strips an optional RPC `output` wrapper.
pub fn unwrap_output(value: &Value) -> &Value {
    unwrap(value, "output")
}

/// Views a list node as a slice, accepting a single object for a one-entry list.
pub fn as_list(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        Value::Null => &[],
        other => std::slice::from_ref(other),
    }
}

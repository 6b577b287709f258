//! # Structural Search
//!
//! Depth-first lookups over untyped manifest trees.
//!
//! At every mapping the keys of that mapping are checked before descending, then
//! nested mappings and the mapping elements of nested lists are searched in key
//! order. Inputs are expected to be finite and acyclic, which any tree built from
//! `serde_json::Value` is.

use serde_json::{Map, Value};

/// Key under which Kubernetes pod templates keep their container list
const CONTAINERS_KEY: &str = "containers";

/// First value stored under `key` at any depth of `container`
#[must_use]
pub fn find<'a>(container: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    find_where(container, key, &|_| true)
}

/// Same as [`find`] for a value that may itself be a list or a scalar
#[must_use]
pub fn find_in_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => find(map, key),
        Value::Array(items) => items.iter().find_map(|item| find_in_value(item, key)),
        _ => None,
    }
}

/// First `containers` array at any depth of `spec`
#[must_use]
pub fn find_containers(spec: &Map<String, Value>) -> Option<&Vec<Value>> {
    find_where(spec, CONTAINERS_KEY, &Value::is_array).and_then(Value::as_array)
}

/// Copy of `spec` with the first `containers` array replaced by `rewrite(array)`
///
/// The traversal order matches [`find_containers`], so the array that gets
/// rewritten is the one a lookup would have returned. The input is left untouched.
#[must_use]
pub fn map_containers<F>(spec: &Map<String, Value>, rewrite: F) -> Map<String, Value>
where
    F: Fn(&[Value]) -> Vec<Value>,
{
    let mut done = false;
    rewrite_map(spec, &rewrite, &mut done)
}

fn find_where<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    accept: &dyn Fn(&Value) -> bool,
) -> Option<&'a Value> {
    if let Some(value) = map.get(key).filter(|value| accept(value)) {
        return Some(value);
    }
    map.values().find_map(|value| match value {
        Value::Object(nested) => find_where(nested, key, accept),
        Value::Array(items) => items.iter().find_map(|item| {
            item.as_object()
                .and_then(|nested| find_where(nested, key, accept))
        }),
        _ => None,
    })
}

fn rewrite_map<F>(map: &Map<String, Value>, rewrite: &F, done: &mut bool) -> Map<String, Value>
where
    F: Fn(&[Value]) -> Vec<Value>,
{
    if !*done {
        if let Some(Value::Array(containers)) = map.get(CONTAINERS_KEY) {
            *done = true;
            let mut copy = map.clone();
            copy.insert(CONTAINERS_KEY.to_string(), Value::Array(rewrite(containers)));
            return copy;
        }
    }

    map.iter()
        .map(|(key, value)| (key.clone(), rewrite_value(value, rewrite, done)))
        .collect()
}

fn rewrite_value<F>(value: &Value, rewrite: &F, done: &mut bool) -> Value
where
    F: Fn(&[Value]) -> Vec<Value>,
{
    if *done {
        return value.clone();
    }
    match value {
        Value::Object(nested) => Value::Object(rewrite_map(nested, rewrite, done)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::Object(nested) if !*done => {
                        Value::Object(rewrite_map(nested, rewrite, done))
                    }
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

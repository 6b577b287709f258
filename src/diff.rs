//! # Resource Diff
//!
//! Structural comparison of a desired manifest against the current one.
//!
//! Both sides are compared as JSON, with desired treated as a subset of current.
//! Objects are compared over the keys desired declares, so fields the API server
//! fills in on the live object never count as changes. Arrays are compared index
//! by index, and trailing items only the live object has are reported as removed.
//! Every difference carries the JSON pointer of the value that differs. The diff
//! does not clean its inputs: callers pass manifests that already went through
//! [`crate::manifest::cleanup`].

use crate::error::PluginError;
use crate::manifest::Manifest;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    /// Present in desired, absent in current
    Added,
    /// Array item present in current beyond the end of desired
    Removed,
    Changed,
}

impl DiffKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffKind::Added => "added",
            DiffKind::Removed => "removed",
            DiffKind::Changed => "changed",
        }
    }
}

/// One difference between desired and current
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEntry {
    /// JSON pointer of the differing value; empty for the document root
    pub path: String,
    pub kind: DiffKind,
    pub desired: Option<Value>,
    pub current: Option<Value>,
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        match self.kind {
            DiffKind::Added => write!(f, "+ {path}"),
            DiffKind::Removed => write!(f, "- {path}"),
            DiffKind::Changed => write!(
                f,
                "~ {path}: {} -> {}",
                self.current.as_ref().unwrap_or(&Value::Null),
                self.desired.as_ref().unwrap_or(&Value::Null)
            ),
        }
    }
}

/// Desired state, current state, and what separates them
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDiff {
    pub desired: Manifest,
    pub current: Option<Manifest>,
    entries: Vec<DiffEntry>,
}

impl ResourceDiff {
    pub fn new(desired: Manifest, current: Option<Manifest>) -> Result<Self, PluginError> {
        let desired_value = desired.to_value()?;
        let mut entries = Vec::new();
        match &current {
            None => entries.push(DiffEntry {
                path: String::new(),
                kind: DiffKind::Added,
                desired: Some(desired_value),
                current: None,
            }),
            Some(current) => {
                let current_value = current.to_value()?;
                let mut path = String::new();
                compare(&mut entries, &mut path, &desired_value, &current_value);
            }
        }
        Ok(Self {
            desired,
            current,
            entries,
        })
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }
}

/// JSON pointer escaping of one reference token
fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn compare(entries: &mut Vec<DiffEntry>, path: &mut String, desired: &Value, current: &Value) {
    match (desired, current) {
        (Value::Object(desired), Value::Object(current)) => {
            compare_objects(entries, path, desired, current);
        }
        (Value::Array(desired), Value::Array(current)) => {
            compare_arrays(entries, path, desired, current);
        }
        (desired, current) if desired != current => entries.push(DiffEntry {
            path: path.clone(),
            kind: DiffKind::Changed,
            desired: Some(desired.clone()),
            current: Some(current.clone()),
        }),
        _ => {}
    }
}

fn compare_objects(
    entries: &mut Vec<DiffEntry>,
    path: &mut String,
    desired: &Map<String, Value>,
    current: &Map<String, Value>,
) {
    let len = path.len();
    for (key, desired_value) in desired {
        path.push('/');
        path.push_str(&escape(key));
        match current.get(key) {
            Some(current_value) => compare(entries, path, desired_value, current_value),
            None => entries.push(DiffEntry {
                path: path.clone(),
                kind: DiffKind::Added,
                desired: Some(desired_value.clone()),
                current: None,
            }),
        }
        path.truncate(len);
    }
}

fn compare_arrays(
    entries: &mut Vec<DiffEntry>,
    path: &mut String,
    desired: &[Value],
    current: &[Value],
) {
    let len = path.len();
    for index in 0..desired.len().max(current.len()) {
        path.push('/');
        path.push_str(&index.to_string());
        match (desired.get(index), current.get(index)) {
            (Some(desired_value), Some(current_value)) => {
                compare(entries, path, desired_value, current_value);
            }
            (Some(desired_value), None) => entries.push(DiffEntry {
                path: path.clone(),
                kind: DiffKind::Added,
                desired: Some(desired_value.clone()),
                current: None,
            }),
            (None, Some(current_value)) => entries.push(DiffEntry {
                path: path.clone(),
                kind: DiffKind::Removed,
                desired: None,
                current: Some(current_value.clone()),
            }),
            (None, None) => {}
        }
        path.truncate(len);
    }
}

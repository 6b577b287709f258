//! # Manifest Cleanup
//!
//! Strips server-populated bookkeeping from a manifest before it is used as a
//! diff baseline. Both sides of a diff must go through [`cleanup`], otherwise
//! status blocks, server-owned metadata and the `kubectl apply` annotation show
//! up as false changes.

use super::Manifest;
use crate::constants::{LAST_APPLIED_CONFIG_ANNOTATION, SERVER_MANAGED_METADATA};
use serde_json::Value;

/// Copy of `manifest` without `status`, server-owned metadata and the
/// last-applied annotation
///
/// `List` composites are cleaned item by item. Everything else passes through
/// unchanged, and cleaning twice yields the same manifest as cleaning once.
#[must_use]
pub fn cleanup(manifest: &Manifest) -> Manifest {
    let mut cleaned = manifest.clone();
    cleaned.status = None;
    for field in SERVER_MANAGED_METADATA {
        cleaned.metadata.remove(field);
    }

    let annotations_emptied = match cleaned.metadata.get_mut("annotations") {
        Some(Value::Object(annotations)) => {
            annotations.remove(LAST_APPLIED_CONFIG_ANNOTATION).is_some() && annotations.is_empty()
        }
        _ => false,
    };
    // kubectl drops the annotations map once the last entry is gone
    if annotations_emptied {
        cleaned.metadata.remove("annotations");
    }

    if let Some(items) = &cleaned.items {
        cleaned.items = Some(items.iter().map(cleanup).collect());
    }

    cleaned
}

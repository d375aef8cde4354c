// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

//! Field-level diffs between two flat attribute maps. Arrays are replaced
//! wholesale instead of patched element-wise; removed keys are recorded as
//! explicit tombstones (`Value::Undefined`).

use chronicle_type::{AttrMap, Value};

/// Attribute names owned by the host layer, never chronicled: the document
/// identifier, the host version counter and the soft-delete marker of the
/// live mirror.
pub const RESERVED_ATTRIBUTES: &[&str] = &["_id", "_version", "__chronicle_deleted"];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_ATTRIBUTES.contains(&key)
}

/// A copy of `payload` without reserved attributes and without explicit
/// undefined values, the shape every chunk payload is normalized to.
pub fn strip_reserved(payload: &AttrMap) -> AttrMap {
    payload
        .iter()
        .filter(|(key, value)| !is_reserved(key) && !value.is_undefined())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// The forward patch turning `original` into `updated`: changed keys map to
/// their new value, keys missing from `updated` map to the tombstone.
pub fn compute_delta(original: &AttrMap, updated: &AttrMap) -> AttrMap {
    let mut delta = AttrMap::new();
    for (key, value) in updated {
        if is_reserved(key) {
            continue;
        }
        if original.get(key) != Some(value) {
            delta.insert(key.clone(), value.clone());
        }
    }
    for key in original.keys() {
        if is_reserved(key) {
            continue;
        }
        if !updated.contains_key(key) {
            delta.insert(key.clone(), Value::Undefined);
        }
    }
    delta
}

/// Folds a delta onto `base` without mutating it; tombstoned keys are
/// removed, everything else is set.
pub fn apply_delta(base: &AttrMap, delta: &AttrMap) -> AttrMap {
    let mut next = base.clone();
    for (key, value) in delta {
        if value.is_undefined() {
            next.remove(key);
        } else {
            next.insert(key.clone(), value.clone());
        }
    }
    next
}

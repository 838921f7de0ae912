//! Approximate size accounting
//!
//! Reading every record to learn the real size of an async store is
//! expensive, so adapters keep a running guess with an error bar and only
//! learn the truth on full walks.

use serde::Serialize;
use serde_json::Value;

use crate::adapter::StorageItem;

/// Bytes a string occupies (UTF-16 code units, two bytes each)
pub fn estimate_str(value: &str) -> usize {
    value.encode_utf16().count() * 2
}

/// Approximate in-memory size of a JSON value
pub fn estimate_value(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 4,
        Value::Number(_) => 8,
        Value::String(s) => estimate_str(s),
        Value::Array(items) => items.iter().map(estimate_value).sum(),
        Value::Object(map) => map.iter().map(|(k, v)| estimate_str(k) + estimate_value(v)).sum(),
    }
}

/// Size charged for storing `item` under `key`
pub fn estimate_item(key: &str, item: &StorageItem) -> usize {
    // created + expires
    estimate_str(key) + estimate_value(&item.value) + 2 * 8
}

/// Running size guess.
///
/// Writes and removals nudge the guess and widen the error bar; a full walk
/// replaces both with the exact figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeEstimator {
    /// Current size guess in bytes
    pub size_guess: f64,
    /// How far off the guess may be
    pub error_bar: f64,
    /// Updates since the last full walk
    pub age: u32,
    /// Average record size at the last walk
    pub average_item_size: f64,
    /// Size found by the last walk
    pub real_size: usize,
    /// Record count found by the last walk
    pub real_count: usize,
    /// Largest difference between guess and walk seen so far
    pub max_misestimate: f64,
}

impl SizeEstimator {
    pub fn new(initial_average_item_size: f64) -> Self {
        Self {
            size_guess: 0.0,
            error_bar: 0.0,
            age: 0,
            average_item_size: initial_average_item_size,
            real_size: 0,
            real_count: 0,
            max_misestimate: 0.0,
        }
    }

    /// Record a write. Only half the size is credited to the guess; the
    /// other half goes to the error bar.
    pub fn record_set(&mut self, size: usize) {
        let half = size as f64 / 2.0;
        self.size_guess += half;
        self.error_bar += half;
        self.age += 1;
    }

    /// Record a removal of an item of unknown size
    pub fn record_remove(&mut self) {
        self.size_guess = (self.size_guess - self.average_item_size).max(0.0);
        self.error_bar += self.average_item_size;
        self.age += 1;
    }

    /// Reconcile with the result of a full walk
    pub fn set_real(&mut self, size: usize, count: usize) {
        let misestimate = (self.size_guess - size as f64).abs();
        if misestimate > self.max_misestimate {
            self.max_misestimate = misestimate;
        }
        self.size_guess = size as f64;
        self.error_bar = 0.0;
        self.age = 0;
        self.real_size = size;
        self.real_count = count;
        if count > 0 {
            self.average_item_size = size as f64 / count as f64;
        }
    }

    /// The store was emptied; the size is known exactly
    pub fn reset(&mut self) {
        self.size_guess = 0.0;
        self.error_bar = 0.0;
        self.age = 0;
        self.real_size = 0;
        self.real_count = 0;
    }

    /// Worst-case size after adding `incoming` bytes
    pub fn projected(&self, incoming: usize) -> f64 {
        self.size_guess + self.error_bar + incoming as f64
    }
}

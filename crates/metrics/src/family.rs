//! Metric primitives
//!
//! Counters and gauges backed by atomics, plus a labelled counter family
//! keyed by its label values. Families hand out their cells behind a
//! `parking_lot::RwLock`; the read path (existing label set) takes only
//! the shared lock.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use parking_lot::RwLock;

/// A monotonically increasing counter.
#[derive(Debug)]
pub struct Counter {
    name: &'static str,
    value: AtomicU64,
}

impl Counter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            value: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub(crate) fn render(&self, namespace: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {namespace}_{} counter", self.name);
        let _ = writeln!(out, "{namespace}_{} {}", self.name, self.get());
    }
}

/// A gauge holding the latest observed value.
#[derive(Debug)]
pub struct Gauge {
    name: &'static str,
    value: AtomicI64,
}

impl Gauge {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            value: AtomicI64::new(0),
        }
    }

    #[inline]
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub(crate) fn render(&self, namespace: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {namespace}_{} gauge", self.name);
        let _ = writeln!(out, "{namespace}_{} {}", self.name, self.get());
    }
}

/// A counter family with a fixed set of label names.
///
/// Cells are created on first use for a given label-value tuple and live
/// for the process lifetime, matching counter semantics.
#[derive(Debug)]
pub struct CounterVec {
    name: &'static str,
    label_names: &'static [&'static str],
    cells: RwLock<HashMap<Vec<String>, Arc<AtomicU64>>>,
}

impl CounterVec {
    pub fn new(name: &'static str, label_names: &'static [&'static str]) -> Self {
        Self {
            name,
            label_names,
            cells: RwLock::new(HashMap::new()),
        }
    }

    /// Add `delta` to the cell for `label_values`.
    ///
    /// `label_values` must match the family's label names positionally.
    pub fn add(&self, label_values: &[&str], delta: u64) {
        debug_assert_eq!(label_values.len(), self.label_names.len());
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        if let Some(cell) = self.cells.read().get(&key) {
            cell.fetch_add(delta, Ordering::Relaxed);
            return;
        }
        let cell = Arc::clone(self.cells.write().entry(key).or_default());
        cell.fetch_add(delta, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc(&self, label_values: &[&str]) {
        self.add(label_values, 1);
    }

    /// Current value of one cell; zero if the label set was never used.
    pub fn get(&self, label_values: &[&str]) -> u64 {
        let key: Vec<String> = label_values.iter().map(|v| v.to_string()).collect();
        self.cells
            .read()
            .get(&key)
            .map(|cell| cell.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub(crate) fn render(&self, namespace: &str, out: &mut String) {
        let cells = self.cells.read();
        let _ = writeln!(out, "# TYPE {namespace}_{} counter", self.name);
        let mut entries: Vec<_> = cells.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (values, cell) in entries {
            let _ = write!(out, "{namespace}_{}{{", self.name);
            for (i, (label, value)) in self.label_names.iter().zip(values).enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{label}=\"{}\"", escape_label_value(value));
            }
            let _ = writeln!(out, "}} {}", cell.load(Ordering::Relaxed));
        }
    }
}

/// Escape a label value per the text exposition format.
fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
#[path = "family_test.rs"]
mod tests;

//! # Holographic Store
//!
//! A key/value store of f64 patterns with fragment bookkeeping: a pattern
//! can be split into `n` fragments stored under `<base>_COUNT` and
//! `<base>_<i>`, and later reconstructed by summation. Fragment sub-keys
//! stay consistent on every store/fragment/reconstruct.

use std::collections::HashMap;

/// Key/value pattern store with fragment support.
#[derive(Debug, Default)]
pub struct HolographicStore {
    values: HashMap<String, f64>,
    fragment_counter: u64,
}

impl HolographicStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn store(&mut self, key: &str, value: f64) {
        self.values.insert(key.to_string(), value);
    }

    /// Direct lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Threshold lookup: the value if its magnitude reaches `threshold`,
    /// otherwise `None`.
    #[must_use]
    pub fn retrieve(&self, key: &str, threshold: f64) -> Option<f64> {
        self.get(key).filter(|v| v.abs() >= threshold)
    }

    /// Splits `value` into `n` equal fragments under `out_base`.
    ///
    /// Writes `<out_base>_COUNT = n` and `<out_base>_<i> = value / n` for
    /// every `i` in `0..n`. Stale fragments above the new count are
    /// removed so reconstruction never mixes generations. `n == 0` clears
    /// the fragment set.
    pub fn fragment(&mut self, value: f64, n: u64, out_base: &str) {
        let old_count = self.get(&count_key(out_base)).unwrap_or(0.0) as u64;
        for i in n..old_count {
            self.values.remove(&fragment_key(out_base, i));
        }
        self.store(&count_key(out_base), n as f64);
        if n == 0 {
            return;
        }
        let share = value / n as f64;
        for i in 0..n {
            self.store(&fragment_key(out_base, i), share);
        }
        self.fragment_counter += 1;
    }

    /// Sums the stored fragments of `base`. `None` when `base` was never
    /// fragmented.
    #[must_use]
    pub fn reconstruct(&self, base: &str) -> Option<f64> {
        let count = self.get(&count_key(base))? as u64;
        let mut total = 0.0;
        for i in 0..count {
            total += self.get(&fragment_key(base, i)).unwrap_or(0.0);
        }
        Some(total)
    }

    /// Number of fragment operations performed.
    #[must_use]
    pub fn fragment_operations(&self) -> u64 {
        self.fragment_counter
    }

    /// Stored key count, fragments included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drops every stored value.
    pub fn clear(&mut self) {
        self.values.clear();
        self.fragment_counter = 0;
    }
}

fn count_key(base: &str) -> String {
    format!("{base}_COUNT")
}

fn fragment_key(base: &str, index: u64) -> String {
    format!("{base}_{index}")
}

// =============================================================================
// TESTS
// =============================================================================

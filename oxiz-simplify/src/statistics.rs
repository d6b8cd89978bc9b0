//! Named counters reported by passes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered map of counter name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    entries: BTreeMap<String, u64>,
}

impl Statistics {
    /// No counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the counter `name` (creating it at zero).
    pub fn update(&mut self, name: &str, value: u64) {
        let slot = self.entries.entry(name.to_string()).or_insert(0);
        *slot = slot.saturating_add(value);
    }

    /// Current value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.entries.get(name).copied()
    }

    /// Iterate in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of counters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No counters?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every counter.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "\n ")?;
            }
            write!(f, ":{name} {value}")?;
        }
        write!(f, ")")
    }
}

//! Model reconstruction trail.

use super::{Model, ModelEvaluator, Value};
use crate::ast::{TermId, TermManager};
use crate::proof::Dependency;

/// One reconstruction step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailEntry {
    /// Remove a pass-introduced symbol from the final model.
    Hide(TermId),
    /// Bind an eliminated symbol to the value of `def`.
    Define {
        /// The eliminated constant.
        sym: TermId,
        /// Its definition over symbols still present.
        def: TermId,
        /// Dependency of the definition.
        dep: Dependency,
    },
}

/// Ordered log of hide and define records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelTrail {
    entries: Vec<TrailEntry>,
}

impl ModelTrail {
    /// Empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `sym` must not appear in the final model.
    pub fn hide(&mut self, sym: TermId) {
        self.entries.push(TrailEntry::Hide(sym));
    }

    /// Record `sym := def`.
    pub fn push(&mut self, sym: TermId, def: TermId, dep: Dependency) {
        self.entries.push(TrailEntry::Define { sym, def, dep });
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No record?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop records past `len` (scope pop).
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Records in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[TrailEntry] {
        &self.entries
    }

    /// Is `sym` hidden by some record?
    #[must_use]
    pub fn is_hidden(&self, sym: TermId) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, TrailEntry::Hide(s) if *s == sym))
    }

    /// Extend `model` with the eliminated symbols and drop the hidden ones.
    ///
    /// Definitions are replayed newest first, so a definition may refer to
    /// symbols that a later pass eliminated in turn. Hidden symbols are removed
    /// only after every definition has been evaluated.
    pub fn apply(&self, tm: &TermManager, model: &mut Model) {
        let mut hidden = Vec::new();
        for entry in self.entries.iter().rev() {
            match entry {
                TrailEntry::Hide(sym) => hidden.push(*sym),
                TrailEntry::Define { sym, def, .. } => {
                    let value = ModelEvaluator::eval(tm, model, *def)
                        .unwrap_or_else(|| Value::default_for(tm, tm.sort_of(*sym)));
                    model.assign(*sym, value);
                }
            }
        }
        for sym in hidden {
            model.remove(sym);
        }
    }
}

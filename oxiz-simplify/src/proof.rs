//! Justifications attached to formulas: unsat-core dependencies and proofs.

use crate::ast::{TermId, TermKind, TermManager};
use smallvec::SmallVec;
use std::sync::Arc;

/// Set of input assertion tags a formula depends on.
///
/// Tags are kept sorted and unique so that equal sets compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Dependency {
    tags: SmallVec<[u32; 2]>,
}

impl Dependency {
    /// No dependency.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single assertion tag.
    #[must_use]
    pub fn leaf(tag: u32) -> Self {
        let mut tags = SmallVec::new();
        tags.push(tag);
        Self { tags }
    }

    /// Build from arbitrary tags.
    pub fn from_tags(tags: impl IntoIterator<Item = u32>) -> Self {
        let mut tags: SmallVec<[u32; 2]> = tags.into_iter().collect();
        tags.sort_unstable();
        tags.dedup();
        Self { tags }
    }

    /// Union of two dependencies.
    #[must_use]
    pub fn join(&self, other: &Dependency) -> Dependency {
        if other.tags.is_empty() {
            return self.clone();
        }
        if self.tags.is_empty() {
            return other.clone();
        }
        Self::from_tags(self.tags.iter().chain(other.tags.iter()).copied())
    }

    /// Is the set empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Sorted tags.
    #[must_use]
    pub fn tags(&self) -> &[u32] {
        &self.tags
    }

    /// Membership.
    #[must_use]
    pub fn contains(&self, tag: u32) -> bool {
        self.tags.binary_search(&tag).is_ok()
    }
}

/// Proof object certifying a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proof {
    /// An input assertion.
    Asserted(TermId),
    /// `from = to` by rewriting.
    Rewrite {
        /// Left-hand side.
        from: TermId,
        /// Right-hand side.
        to: TermId,
    },
    /// From a proof of `a` and a proof of `a = b`, conclude `b`.
    ModusPonens(Arc<Proof>, Arc<Proof>),
    /// A definition introduced by a pass.
    Definition(TermId),
}

impl Proof {
    /// Rewrite step, shared.
    #[must_use]
    pub fn rewrite(from: TermId, to: TermId) -> Arc<Proof> {
        Arc::new(Proof::Rewrite { from, to })
    }

    /// Chain two optional proofs; a missing side yields the other.
    #[must_use]
    pub fn mp(p: Option<Arc<Proof>>, q: Option<Arc<Proof>>) -> Option<Arc<Proof>> {
        match (p, q) {
            (Some(p), Some(q)) => Some(Arc::new(Proof::ModusPonens(p, q))),
            (Some(p), None) => Some(p),
            (None, q) => q,
        }
    }

    /// Formula this proof establishes, or `None` if a modus-ponens step does not line up.
    pub fn conclusion(&self, tm: &mut TermManager) -> Option<TermId> {
        match self {
            Proof::Asserted(f) | Proof::Definition(f) => Some(*f),
            Proof::Rewrite { from, to } => Some(tm.mk_eq(*from, *to)),
            Proof::ModusPonens(p, q) => {
                let a = p.conclusion(tm)?;
                let eq = q.conclusion(tm)?;
                match tm.kind(eq) {
                    TermKind::Eq(lhs, rhs) if *lhs == a => Some(*rhs),
                    _ => None,
                }
            }
        }
    }

    /// Is every modus-ponens step well formed?
    pub fn check(&self, tm: &mut TermManager) -> bool {
        self.conclusion(tm).is_some()
    }
}

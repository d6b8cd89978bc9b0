//! DAG walks over the term graph.

use super::{Args, TermId, TermKind, TermManager};
use rustc_hash::FxHashSet;
use smallvec::smallvec;

impl TermManager {
    /// Number of distinct subterms of `root` (shared nodes counted once).
    #[must_use]
    pub fn num_exprs(&self, root: TermId) -> usize {
        let mut visited = FxHashSet::default();
        let mut todo = vec![root];
        while let Some(id) = todo.pop() {
            if visited.insert(id) {
                todo.extend(self.children(id));
            }
        }
        visited.len()
    }

    /// Uninterpreted constants occurring in `root`, in first-visit order.
    ///
    /// Quantifier-bound names are reported as well; callers that care filter
    /// by sort or name.
    #[must_use]
    pub fn collect_constants(&self, root: TermId) -> Vec<TermId> {
        let mut visited = FxHashSet::default();
        let mut out = Vec::new();
        let mut todo = vec![root];
        while let Some(id) = todo.pop() {
            if !visited.insert(id) {
                continue;
            }
            if matches!(self.kind(id), TermKind::Var(_)) {
                out.push(id);
            }
            // reverse so the leftmost child is visited first
            todo.extend(self.children(id).into_iter().rev());
        }
        out
    }

    /// Does `needle` occur in `root`?
    #[must_use]
    pub fn occurs(&self, needle: TermId, root: TermId) -> bool {
        let mut visited = FxHashSet::default();
        let mut todo = vec![root];
        while let Some(id) = todo.pop() {
            if id == needle {
                return true;
            }
            if visited.insert(id) {
                todo.extend(self.children(id));
            }
        }
        false
    }

    /// Operands of a Boolean connective, `None` for atoms.
    ///
    /// Connectives are `not`, `and`, `or`, `=>`, `xor`, `=` over Booleans and
    /// Boolean-sorted `ite`.
    #[must_use]
    pub fn bool_operands(&self, id: TermId) -> Option<Args> {
        let args = match self.kind(id) {
            TermKind::Not(a) => smallvec![*a],
            TermKind::And(args) | TermKind::Or(args) => args.clone(),
            TermKind::Implies(a, b) | TermKind::Xor(a, b) => smallvec![*a, *b],
            TermKind::Eq(a, b) if self.is_bool(*a) => smallvec![*a, *b],
            TermKind::Ite(c, t, e) if self.is_bool(id) => smallvec![*c, *t, *e],
            _ => return None,
        };
        Some(args)
    }
}

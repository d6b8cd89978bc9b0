//! Dependent expression sets: the formulas every pass reads and rewrites.
//!
//! An entry is a formula together with its proof and the input assertions it
//! depends on. Passes only see the [`DependentExprState`] interface: they
//! enumerate live indices, replace entries in place, append new ones and log
//! model reconstruction steps.

use crate::ast::{TermId, TermManager};
use crate::model::ModelTrail;
use crate::proof::{Dependency, Proof};
use std::ops::Range;
use std::sync::Arc;

/// A formula with its justification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentExpr {
    /// The formula.
    pub fml: TermId,
    /// Proof of `fml`, present in proof mode.
    pub proof: Option<Arc<Proof>>,
    /// Input assertions `fml` depends on.
    pub dep: Dependency,
}

impl DependentExpr {
    /// Entry without proof.
    #[must_use]
    pub fn new(fml: TermId, dep: Dependency) -> Self {
        Self {
            fml,
            proof: None,
            dep,
        }
    }

    /// Entry with an optional proof.
    #[must_use]
    pub fn with_proof(fml: TermId, proof: Option<Arc<Proof>>, dep: Dependency) -> Self {
        Self { fml, proof, dep }
    }
}

/// The view of a formula set that simplification passes work against.
pub trait DependentExprState {
    /// Indices of the entries a pass should process: everything from the
    /// queue head on, or nothing once the set is inconsistent.
    fn indices(&self) -> Range<usize>;

    /// Entry `i`.
    fn get(&self, i: usize) -> &DependentExpr;

    /// Replace entry `i`.
    fn update(&mut self, i: usize, d: DependentExpr);

    /// Append an entry.
    fn add(&mut self, d: DependentExpr);

    /// Model reconstruction trail.
    fn model_trail(&self) -> &ModelTrail;

    /// Mutable model reconstruction trail.
    fn model_trail_mut(&mut self) -> &mut ModelTrail;

    /// Are proofs being produced?
    fn proofs_enabled(&self) -> bool;

    /// Has some entry become `false`?
    fn inconsistent(&self) -> bool;
}

#[derive(Debug, Clone)]
struct Scope {
    num_entries: usize,
    trail_len: usize,
    qhead: usize,
    inconsistent: bool,
    overwritten: Vec<(usize, DependentExpr)>,
}

/// Vector-backed [`DependentExprState`] with push/pop scopes.
#[derive(Debug, Clone)]
pub struct DependentExprSet {
    entries: Vec<DependentExpr>,
    trail: ModelTrail,
    qhead: usize,
    proofs: bool,
    inconsistent: bool,
    false_term: TermId,
    scopes: Vec<Scope>,
}

impl DependentExprSet {
    /// Empty set over the terms of `tm`.
    #[must_use]
    pub fn new(tm: &TermManager, proofs: bool) -> Self {
        Self {
            entries: Vec::new(),
            trail: ModelTrail::new(),
            qhead: 0,
            proofs,
            inconsistent: false,
            false_term: tm.mk_false(),
            scopes: Vec::new(),
        }
    }

    /// Assert an input formula tagged with `dep`.
    pub fn assert_expr(&mut self, fml: TermId, dep: Dependency) {
        let proof = self.proofs.then(|| Arc::new(Proof::Asserted(fml)));
        self.add(DependentExpr::with_proof(fml, proof, dep));
    }

    /// Number of entries, processed or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entry?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first unprocessed entry.
    #[must_use]
    pub fn qhead(&self) -> usize {
        self.qhead
    }

    /// Mark every current entry as processed.
    pub fn advance_qhead(&mut self) {
        self.qhead = self.entries.len();
    }

    /// Has some entry become `false`?
    #[must_use]
    pub fn is_inconsistent(&self) -> bool {
        self.inconsistent
    }

    /// Current formulas in order.
    pub fn formulas(&self) -> impl Iterator<Item = TermId> + '_ {
        self.entries.iter().map(|e| e.fml)
    }

    /// Conjunction of all current formulas.
    pub fn conjunction(&self, tm: &mut TermManager) -> TermId {
        let fmls: Vec<TermId> = self.formulas().collect();
        tm.mk_and(fmls)
    }

    /// Open a scope.
    pub fn push(&mut self) {
        self.scopes.push(Scope {
            num_entries: self.entries.len(),
            trail_len: self.trail.len(),
            qhead: self.qhead,
            inconsistent: self.inconsistent,
            overwritten: Vec::new(),
        });
    }

    /// Close `n` scopes, restoring entries, trail and queue head.
    pub fn pop(&mut self, n: usize) {
        for _ in 0..n {
            let Some(scope) = self.scopes.pop() else {
                return;
            };
            for (i, old) in scope.overwritten.into_iter().rev() {
                self.entries[i] = old;
            }
            self.entries.truncate(scope.num_entries);
            self.trail.truncate(scope.trail_len);
            self.qhead = scope.qhead;
            self.inconsistent = scope.inconsistent;
        }
    }

    /// Number of open scopes.
    #[must_use]
    pub fn scope_level(&self) -> usize {
        self.scopes.len()
    }

    /// Render entries as `index: formula` lines.
    #[must_use]
    pub fn display(&self, tm: &TermManager) -> String {
        let mut out = String::new();
        for (i, e) in self.entries.iter().enumerate() {
            out.push_str(&format!("{i}: {}\n", tm.display(e.fml)));
        }
        out
    }
}

impl DependentExprState for DependentExprSet {
    fn indices(&self) -> Range<usize> {
        if self.inconsistent {
            return 0..0;
        }
        self.qhead..self.entries.len()
    }

    fn get(&self, i: usize) -> &DependentExpr {
        &self.entries[i]
    }

    fn update(&mut self, i: usize, d: DependentExpr) {
        if self.entries[i] == d {
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            if i < scope.num_entries {
                scope.overwritten.push((i, self.entries[i].clone()));
            }
        }
        if d.fml == self.false_term {
            self.inconsistent = true;
        }
        self.entries[i] = d;
    }

    fn add(&mut self, d: DependentExpr) {
        if d.fml == self.false_term {
            self.inconsistent = true;
        }
        self.entries.push(d);
    }

    fn model_trail(&self) -> &ModelTrail {
        &self.trail
    }

    fn model_trail_mut(&mut self) -> &mut ModelTrail {
        &mut self.trail
    }

    fn proofs_enabled(&self) -> bool {
        self.proofs
    }

    fn inconsistent(&self) -> bool {
        self.inconsistent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TermManager, TermId, TermId) {
        let mut tm = TermManager::new();
        let bool_sort = tm.sorts.bool_sort;
        let p = tm.mk_var("p", bool_sort);
        let q = tm.mk_var("q", bool_sort);
        (tm, p, q)
    }

    #[test]
    fn test_indices_follow_qhead() {
        let (tm, p, q) = setup();
        let mut set = DependentExprSet::new(&tm, false);
        set.assert_expr(p, Dependency::leaf(0));
        set.advance_qhead();
        set.assert_expr(q, Dependency::leaf(1));
        assert_eq!(set.indices(), 1..2);
        assert_eq!(set.get(1).fml, q);
    }

    #[test]
    fn test_false_makes_inconsistent() {
        let (tm, p, _) = setup();
        let mut set = DependentExprSet::new(&tm, false);
        set.assert_expr(p, Dependency::leaf(0));
        set.update(0, DependentExpr::new(tm.mk_false(), Dependency::leaf(0)));
        assert!(set.is_inconsistent());
        assert!(set.indices().is_empty());
    }

    #[test]
    fn test_push_pop_restores() {
        let (mut tm, p, q) = setup();
        let mut set = DependentExprSet::new(&tm, false);
        set.assert_expr(p, Dependency::leaf(0));
        set.push();
        set.update(0, DependentExpr::new(q, Dependency::leaf(0)));
        set.assert_expr(q, Dependency::leaf(1));
        set.model_trail_mut().hide(q);
        set.advance_qhead();
        set.pop(1);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).fml, p);
        assert!(set.model_trail().is_empty());
        assert_eq!(set.qhead(), 0);
        assert_eq!(set.conjunction(&mut tm), p);
    }

    #[test]
    fn test_assert_records_proof_in_proof_mode() {
        let (tm, p, _) = setup();
        let mut set = DependentExprSet::new(&tm, true);
        set.assert_expr(p, Dependency::empty());
        assert_eq!(set.get(0).proof.as_deref(), Some(&Proof::Asserted(p)));
    }
}

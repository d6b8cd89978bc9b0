//! Simplification passes over a dependent expression set.
//!
//! A pass is configured from [`Params`], run against a
//! [`DependentExprState`], and reports counters through [`Statistics`].
//! Passes never fail: when a formula cannot be processed within its budget it
//! is left as it was and the abort is counted.

pub mod blast_term_ite;
pub mod bv1_blast;
pub mod ctx_solver_simplify;
pub mod fpa2bv;

pub use blast_term_ite::{BlastTermIte, blast_term_ite};
pub use bv1_blast::Bv1Blast;
pub use ctx_solver_simplify::CtxSolverSimplify;
pub use fpa2bv::Fpa2Bv;

use crate::ast::TermManager;
use crate::dependent::{DependentExpr, DependentExprState};
use crate::error::{OxizError, Result};
use crate::params::{ParamDescrs, Params};
use crate::proof::Proof;
use crate::rewriter::RewriteOutput;
use crate::statistics::Statistics;
use std::fmt;
use std::str::FromStr;

/// A named, configurable simplification pass.
pub trait Simplifier {
    /// Registry name of the pass.
    fn name(&self) -> &'static str;

    /// Read options. Unknown options are ignored.
    fn configure(&mut self, _params: &Params) {}

    /// Declare the options `configure` understands.
    fn collect_param_descrs(&self, _descrs: &mut ParamDescrs) {}

    /// Simplify the live entries of `state` in place.
    fn run(&mut self, tm: &mut TermManager, state: &mut dyn DependentExprState);

    /// Add this pass's counters to `stats`.
    fn collect_statistics(&self, _stats: &mut Statistics) {}

    /// Zero the counters.
    fn reset_statistics(&mut self) {}
}

/// Replace entry `i` with the result of a successful rewrite, chaining proofs.
///
/// Returns whether the formula changed.
pub(crate) fn apply_rewrite(
    state: &mut dyn DependentExprState,
    i: usize,
    old: &DependentExpr,
    out: RewriteOutput,
) -> bool {
    if out.term == old.fml {
        return false;
    }
    let proof = Proof::mp(old.proof.clone(), out.proof);
    state.update(i, DependentExpr::with_proof(out.term, proof, old.dep.clone()));
    true
}

/// Passes run one after another on the same state.
#[derive(Default)]
pub struct SimplifierSequence {
    passes: Vec<Box<dyn Simplifier>>,
}

impl SimplifierSequence {
    /// Empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass.
    pub fn push(&mut self, pass: Box<dyn Simplifier>) -> &mut Self {
        self.passes.push(pass);
        self
    }

    /// Build from registry names, configuring every pass with `params`.
    pub fn from_names(names: &[&str], params: &Params) -> Result<Self> {
        let mut seq = Self::new();
        for name in names {
            let kind: SimplifierKind = name.parse()?;
            seq.push(kind.create(params));
        }
        Ok(seq)
    }

    /// Number of passes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// No pass?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Simplifier for SimplifierSequence {
    fn name(&self) -> &'static str {
        "sequence"
    }

    fn configure(&mut self, params: &Params) {
        for pass in &mut self.passes {
            pass.configure(params);
        }
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        for pass in &self.passes {
            pass.collect_param_descrs(descrs);
        }
    }

    fn run(&mut self, tm: &mut TermManager, state: &mut dyn DependentExprState) {
        for pass in &mut self.passes {
            if state.inconsistent() || !tm.inc() {
                break;
            }
            pass.run(tm, state);
        }
    }

    fn collect_statistics(&self, stats: &mut Statistics) {
        for pass in &self.passes {
            pass.collect_statistics(stats);
        }
    }

    fn reset_statistics(&mut self) {
        for pass in &mut self.passes {
            pass.reset_statistics();
        }
    }
}

/// Registry of the passes in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimplifierKind {
    /// Blast bit-vectors into 1-bit slices.
    Bv1Blast,
    /// Hoist non-Boolean if-then-else terms.
    BlastTermIte,
    /// Lower floating point to bit-vectors.
    Fpa2Bv,
    /// Solver-guided contextual simplification.
    CtxSolverSimplify,
}

impl SimplifierKind {
    /// Every registered pass.
    pub const ALL: [SimplifierKind; 4] = [
        SimplifierKind::Bv1Blast,
        SimplifierKind::BlastTermIte,
        SimplifierKind::Fpa2Bv,
        SimplifierKind::CtxSolverSimplify,
    ];

    /// Registry name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            SimplifierKind::Bv1Blast => "bv1-blast",
            SimplifierKind::BlastTermIte => "blast-term-ite",
            SimplifierKind::Fpa2Bv => "fpa2bv",
            SimplifierKind::CtxSolverSimplify => "ctx-solver-simplify",
        }
    }

    /// One-line description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            SimplifierKind::Bv1Blast => {
                "reduce bit-vector equality, ite, concat, extract and xor to 1-bit slices"
            }
            SimplifierKind::BlastTermIte => "hoist non-Boolean if-then-else out of applications",
            SimplifierKind::Fpa2Bv => "lower floating-point constants and predicates to bit-vectors",
            SimplifierKind::CtxSolverSimplify => {
                "replace subformulas forced by their context using an embedded solver"
            }
        }
    }

    /// Fresh, configured pass.
    #[must_use]
    pub fn create(self, params: &Params) -> Box<dyn Simplifier> {
        let mut pass: Box<dyn Simplifier> = match self {
            SimplifierKind::Bv1Blast => Box::new(Bv1Blast::new()),
            SimplifierKind::BlastTermIte => Box::new(BlastTermIte::new()),
            SimplifierKind::Fpa2Bv => Box::new(Fpa2Bv::new()),
            SimplifierKind::CtxSolverSimplify => Box::new(CtxSolverSimplify::new()),
        };
        pass.configure(params);
        pass
    }
}

impl fmt::Display for SimplifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimplifierKind {
    type Err = OxizError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| OxizError::UnknownSimplifier(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependent::DependentExprSet;
    use crate::proof::Dependency;

    #[test]
    fn test_registry_names_roundtrip() {
        for kind in SimplifierKind::ALL {
            assert_eq!(kind.name().parse::<SimplifierKind>(), Ok(kind));
            assert_eq!(kind.create(&Params::new()).name(), kind.name());
            assert!(!kind.description().is_empty());
        }
        assert!(matches!(
            "bv2-blast".parse::<SimplifierKind>(),
            Err(OxizError::UnknownSimplifier(_))
        ));
    }

    #[test]
    fn test_sequence_collects_descrs() {
        let seq = SimplifierSequence::from_names(
            &["blast-term-ite", "bv1-blast"],
            &Params::new(),
        )
        .expect("registered names");
        assert_eq!(seq.len(), 2);
        let mut descrs = ParamDescrs::new();
        seq.collect_param_descrs(&mut descrs);
        assert!(descrs.get("max_inflation").is_some());
        assert!(descrs.get("max_steps").is_some());
    }

    #[test]
    fn test_sequence_runs_in_order() {
        let mut tm = TermManager::new();
        let bool_sort = tm.sorts.bool_sort;
        let bv2 = tm.sorts.bitvec(2);
        let c = tm.mk_var("c", bool_sort);
        let x = tm.mk_var("x", bv2);
        let y = tm.mk_var("y", bv2);
        let ite = tm.mk_ite(c, x, y);
        let z = tm.mk_var("z", bv2);
        let f = tm.mk_bv_add(ite, z);
        let w = tm.mk_var("w", bv2);
        let fml = tm.mk_eq(f, w);

        let mut state = DependentExprSet::new(&tm, false);
        state.assert_expr(fml, Dependency::leaf(0));
        let mut seq = SimplifierSequence::from_names(
            &["blast-term-ite", "bv1-blast"],
            &Params::new(),
        )
        .expect("registered names");
        seq.run(&mut tm, &mut state);

        let mut stats = Statistics::new();
        seq.collect_statistics(&mut stats);
        // once out of bvadd, once out of the equality
        assert_eq!(stats.get("blast-term-ite-hoisted"), Some(2));
        assert!(stats.get("bv1-blast-new-bits").is_some_and(|n| n >= 8));
        seq.reset_statistics();
        let mut stats = Statistics::new();
        seq.collect_statistics(&mut stats);
        assert_eq!(stats.get("blast-term-ite-hoisted"), Some(0));
    }
}

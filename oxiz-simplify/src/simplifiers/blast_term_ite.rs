//! Hoisting of non-Boolean if-then-else terms.
//!
//! ```text
//! (f ... (ite c t e) ...)   ->   (ite c (f ... t ...) (f ... e ...))
//! (f ... (ite c t t) ...)   ->   (f ... t ...)
//! ```
//!
//! Only the first non-Boolean `ite` argument of an application is hoisted per
//! step; the result is rewritten again so the remaining arguments follow.
//! Every hoist duplicates the application once, so the pass can blow a
//! formula up exponentially. With `max_inflation` set, hoisting at a node is
//! refused once the duplications made for the current formula exceed
//! `max_inflation` times the formula's original size.

use crate::ast::{Args, TermId, TermManager};
use crate::dependent::DependentExprState;
use crate::params::{MAX_INFLATION, ParamDescrs, Params};
use crate::rewriter::{Budget, ReduceResult, Rewriter, RewriterConfig};
use crate::simplifiers::{Simplifier, apply_rewrite};
use crate::statistics::Statistics;
use tracing::{debug, trace};

/// Counters of the term-ite blaster.
#[derive(Debug, Clone, Default)]
pub struct BlastTermIteStats {
    /// Rewrite steps.
    pub steps: u64,
    /// Applications duplicated by hoisting.
    pub hoisted: u64,
    /// Formulas left unchanged because a budget ran out.
    pub aborted: u64,
}

/// Reduction rule of the term-ite blaster.
#[derive(Debug, Clone)]
pub struct BlastTermIteConfig {
    budget: Budget,
    max_inflation: u64,
    init_size: u64,
    num_fresh: u64,
}

impl Default for BlastTermIteConfig {
    fn default() -> Self {
        Self {
            budget: Budget::unlimited(),
            max_inflation: u64::MAX,
            init_size: 0,
            num_fresh: 0,
        }
    }
}

impl BlastTermIteConfig {
    fn inflation_limited(&self) -> bool {
        self.max_inflation < u64::MAX
    }

    /// Start counting duplications for a formula of `size` subterms.
    fn start_formula(&mut self, size: u64) {
        if self.inflation_limited() {
            self.init_size = size;
            self.num_fresh = 0;
        }
    }

    fn over_inflation(&self) -> bool {
        self.inflation_limited()
            && self.init_size > 0
            && self.max_inflation.saturating_mul(self.init_size) < self.num_fresh
    }
}

impl RewriterConfig for BlastTermIteConfig {
    fn reduce_app(
        &mut self,
        tm: &mut TermManager,
        term: TermId,
        args: &[TermId],
    ) -> ReduceResult {
        if tm.is_ite(term).is_some() || self.over_inflation() {
            return ReduceResult::Failed;
        }
        for (i, &arg) in args.iter().enumerate() {
            let Some((c, t, e)) = tm.is_ite(arg) else {
                continue;
            };
            if tm.is_bool(arg) {
                continue;
            }
            let mut new_args: Args = args.iter().copied().collect();
            if tm.are_equal(t, e) {
                new_args[i] = t;
                let r = tm.update_children(term, &new_args);
                return ReduceResult::Rewrite(r, 1);
            }
            new_args[i] = t;
            let then_app = tm.update_children(term, &new_args);
            new_args[i] = e;
            let else_app = tm.update_children(term, &new_args);
            self.num_fresh = self.num_fresh.saturating_add(1);
            let r = tm.mk_ite(c, then_app, else_app);
            return ReduceResult::Rewrite(r, 3);
        }
        ReduceResult::Failed
    }

    fn max_steps_exceeded(&self, steps: u64) -> bool {
        steps >= self.budget.max_steps
    }

    fn max_memory(&self) -> u64 {
        self.budget.max_memory
    }
}

/// Hoist term-level ites out of `fml`, giving up silently on budget exhaustion.
pub fn blast_term_ite(tm: &mut TermManager, fml: TermId, max_inflation: u64) -> TermId {
    let cfg = BlastTermIteConfig {
        max_inflation,
        ..BlastTermIteConfig::default()
    };
    let mut rw = Rewriter::new(cfg);
    let size = tm.num_exprs(fml) as u64;
    rw.cfg_mut().start_formula(size);
    rw.rewrite(tm, fml).map_or(fml, |out| out.term)
}

/// The term-ite blasting pass.
#[derive(Debug)]
pub struct BlastTermIte {
    rw: Rewriter<BlastTermIteConfig>,
    stats: BlastTermIteStats,
}

impl Default for BlastTermIte {
    fn default() -> Self {
        Self::new()
    }
}

impl BlastTermIte {
    /// Pass without limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rw: Rewriter::new(BlastTermIteConfig::default()),
            stats: BlastTermIteStats::default(),
        }
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> &BlastTermIteStats {
        &self.stats
    }
}

impl Simplifier for BlastTermIte {
    fn name(&self) -> &'static str {
        "blast-term-ite"
    }

    fn configure(&mut self, params: &Params) {
        let cfg = self.rw.cfg_mut();
        cfg.budget = Budget::from_params(params);
        cfg.max_inflation = params.get_uint(MAX_INFLATION, u64::MAX);
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        Budget::collect_param_descrs(descrs);
        descrs.insert_max_inflation();
    }

    fn run(&mut self, tm: &mut TermManager, state: &mut dyn DependentExprState) {
        self.rw.set_proofs(state.proofs_enabled());
        let steps_before = self.rw.total_steps();
        for i in state.indices() {
            let d = state.get(i).clone();
            let size = tm.num_exprs(d.fml) as u64;
            self.rw.cfg_mut().start_formula(size);
            let fresh_before = self.rw.cfg().num_fresh;
            match self.rw.rewrite(tm, d.fml) {
                Ok(out) => {
                    self.stats.hoisted += self.rw.cfg().num_fresh - fresh_before;
                    apply_rewrite(state, i, &d, out);
                }
                Err(err) => {
                    trace!(index = i, %err, "blast-term-ite left formula unchanged");
                    self.stats.aborted += 1;
                }
            }
        }
        let steps = self.rw.total_steps() - steps_before;
        self.stats.steps += steps;
        debug!(
            pass = "blast-term-ite",
            steps,
            hoisted = self.stats.hoisted,
            "simplifier finished"
        );
    }

    fn collect_statistics(&self, stats: &mut Statistics) {
        stats.update("blast-term-ite-steps", self.stats.steps);
        stats.update("blast-term-ite-hoisted", self.stats.hoisted);
        stats.update("blast-term-ite-aborted", self.stats.aborted);
    }

    fn reset_statistics(&mut self) {
        self.stats = BlastTermIteStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependent::DependentExprSet;
    use crate::model::{Model, ModelEvaluator, Value};
    use crate::params::MAX_STEPS;
    use crate::proof::Dependency;
    use num_bigint::BigInt;

    fn run_pass(
        tm: &mut TermManager,
        fml: TermId,
        params: &Params,
    ) -> (TermId, BlastTermIteStats) {
        let mut state = DependentExprSet::new(tm, false);
        state.assert_expr(fml, Dependency::leaf(0));
        let mut pass = BlastTermIte::new();
        pass.configure(params);
        pass.run(tm, &mut state);
        (state.get(0).fml, pass.stats().clone())
    }

    #[test]
    fn test_equal_branches_substituted() {
        let mut tm = TermManager::new();
        let int_sort = tm.sorts.int_sort;
        let bool_sort = tm.sorts.bool_sort;
        let c = tm.mk_var("c", bool_sort);
        let t = tm.mk_var("t", int_sort);
        let ite = tm.mk_ite(c, t, t);
        let f = tm.mk_apply("f", [ite], int_sort);
        let zero = tm.mk_int(0);
        let fml = tm.mk_le(f, zero);
        let (out, stats) = run_pass(&mut tm, fml, &Params::new());
        let ft = tm.mk_apply("f", [t], int_sort);
        let expected = tm.mk_le(ft, zero);
        assert_eq!(out, expected);
        assert_eq!(stats.hoisted, 0);
    }

    #[test]
    fn test_hoists_two_arguments() {
        let mut tm = TermManager::new();
        let int_sort = tm.sorts.int_sort;
        let bool_sort = tm.sorts.bool_sort;
        let c = tm.mk_var("c", bool_sort);
        let d = tm.mk_var("d", bool_sort);
        let [a, b, x, y] = ["a", "b", "x", "y"].map(|n| tm.mk_var(n, int_sort));
        let i1 = tm.mk_ite(c, a, b);
        let i2 = tm.mk_ite(d, x, y);
        let lt = tm.mk_lt(i1, i2);
        let (out, stats) = run_pass(&mut tm, lt, &Params::new());

        let ax = tm.mk_lt(a, x);
        let ay = tm.mk_lt(a, y);
        let bx = tm.mk_lt(b, x);
        let by = tm.mk_lt(b, y);
        let left = tm.mk_ite(d, ax, ay);
        let right = tm.mk_ite(d, bx, by);
        let expected = tm.mk_ite(c, left, right);
        assert_eq!(out, expected);
        assert_eq!(stats.hoisted, 3);
    }

    #[test]
    fn test_boolean_ite_untouched() {
        let mut tm = TermManager::new();
        let bool_sort = tm.sorts.bool_sort;
        let [c, p, q, r] = ["c", "p", "q", "r"].map(|n| tm.mk_var(n, bool_sort));
        let ite = tm.mk_ite(c, p, q);
        let fml = tm.mk_and([ite, r]);
        let (out, stats) = run_pass(&mut tm, fml, &Params::new());
        assert_eq!(out, fml);
        assert_eq!(stats.hoisted, 0);
    }

    #[test]
    fn test_zero_step_budget_keeps_formula() {
        let mut tm = TermManager::new();
        let int_sort = tm.sorts.int_sort;
        let bool_sort = tm.sorts.bool_sort;
        let c = tm.mk_var("c", bool_sort);
        let a = tm.mk_var("a", int_sort);
        let b = tm.mk_var("b", int_sort);
        let ite = tm.mk_ite(c, a, b);
        let fml = tm.mk_le(ite, a);
        let mut params = Params::new();
        params.set_uint(MAX_STEPS, 0);
        let (out, stats) = run_pass(&mut tm, fml, &params);
        assert_eq!(out, fml);
        assert_eq!(stats.aborted, 1);
    }

    /// `(= (+ (ite c1 a1 b1) ... (ite c4 a4 b4)) z)`, 19 distinct subterms.
    fn sum_of_ites(tm: &mut TermManager) -> (TermId, Vec<TermId>, Vec<TermId>) {
        let int_sort = tm.sorts.int_sort;
        let bool_sort = tm.sorts.bool_sort;
        let mut conds = Vec::new();
        let mut leaves = Vec::new();
        let mut ites = Vec::new();
        for i in 0..4 {
            let c = tm.mk_var(&format!("c{i}"), bool_sort);
            let a = tm.mk_var(&format!("a{i}"), int_sort);
            let b = tm.mk_var(&format!("b{i}"), int_sort);
            ites.push(tm.mk_ite(c, a, b));
            conds.push(c);
            leaves.extend([a, b]);
        }
        let sum = tm.mk_add(ites);
        let z = tm.mk_var("z", int_sort);
        leaves.push(z);
        (tm.mk_eq(sum, z), conds, leaves)
    }

    fn equivalent(tm: &TermManager, f: TermId, g: TermId, conds: &[TermId], leaves: &[TermId]) {
        for mask in 0..(1u32 << conds.len()) {
            let mut model = Model::new();
            for (k, &c) in conds.iter().enumerate() {
                model.assign(c, Value::Bool(mask >> k & 1 == 1));
            }
            for (k, &l) in leaves.iter().enumerate() {
                model.assign(l, Value::Int(BigInt::from(k as i64 * 3 - 7)));
            }
            assert_eq!(
                ModelEvaluator::eval_bool(tm, &model, f),
                ModelEvaluator::eval_bool(tm, &model, g)
            );
        }
    }

    #[test]
    fn test_growth_guard() {
        let mut tm = TermManager::new();
        let (fml, conds, leaves) = sum_of_ites(&mut tm);
        assert_eq!(tm.num_exprs(fml), 19);

        let (full, stats) = run_pass(&mut tm, fml, &Params::new());
        // 15 hoists out of the sum, 15 out of the equality
        assert_eq!(stats.hoisted, 30);
        equivalent(&tm, fml, full, &conds, &leaves);

        let mut params = Params::new();
        params.set_uint(MAX_INFLATION, 1);
        let (limited, stats) = run_pass(&mut tm, fml, &params);
        assert_eq!(stats.hoisted, 20);
        assert_ne!(limited, full);
        equivalent(&tm, fml, limited, &conds, &leaves);
    }

    #[test]
    fn test_free_function() {
        let mut tm = TermManager::new();
        let (fml, conds, leaves) = sum_of_ites(&mut tm);
        let out = blast_term_ite(&mut tm, fml, 0);
        // zero inflation allows the first hoist only
        assert_ne!(out, fml);
        equivalent(&tm, fml, out, &conds, &leaves);
    }
}

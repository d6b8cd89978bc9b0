//! Contextual simplification with an embedded solver.
//!
//! For a formula `F` a fresh Boolean witness `w0` is introduced and
//! `(not (= F w0))` asserted, so `w0` stands for "a value of `F` that differs
//! from `F`". Descending into a Boolean connective `p` with witness `wp`,
//! child `i` is replaced by a fresh witness `wi` and `(= p[wi] wp)` asserted
//! in a new scope. The assertions then say: changing the subterm at this
//! position to `wi` changes the value of `F`. If that is impossible with
//! `wi = true` the subterm can be replaced by `true`; if impossible with
//! `wi = false`, by `false`.
//!
//! Siblings are visited left to right and each later sibling sees the
//! earlier ones already simplified. Shared subterms are visited once per
//! occurrence. A single pass does not iterate to a fixpoint.

use crate::ast::simplified::mk_simplified_app;
use crate::ast::{Args, TermId, TermKind, TermManager};
use crate::dependent::DependentExprState;
use crate::params::{MAX_STEPS, ParamDescrs, Params};
use crate::rewriter::RewriteOutput;
use crate::sat::{ContextSolver, PropSolver, SatResult, ScopedSolver};
use crate::simplifiers::{Simplifier, apply_rewrite};
use crate::statistics::Statistics;
use tracing::{debug, trace};

const WITNESS_PREFIX: &str = "ctx";

/// Counters of the context simplifier.
#[derive(Debug, Clone, Default)]
pub struct CtxSolverSimplifyStats {
    /// Solver queries.
    pub steps: u64,
    /// Subterms replaced by a constant.
    pub forced: u64,
}

/// One position on the descent path.
#[derive(Debug)]
struct Frame {
    term: TermId,
    witness: TermId,
    /// Operands, simplified up to `next`.
    args: Args,
    next: usize,
    expanded: bool,
}

impl Frame {
    fn new(term: TermId, witness: TermId) -> Self {
        Self {
            term,
            witness,
            args: Args::new(),
            next: 0,
            expanded: false,
        }
    }

    /// Index of the next operand worth visiting, if any.
    ///
    /// Stops early once a simplified operand decides the connective, and
    /// skips the branch of an `ite` ruled out by a decided condition.
    fn next_child(&mut self, tm: &TermManager) -> Option<usize> {
        let done = self.args[..self.next].iter();
        match tm.kind(self.term) {
            TermKind::And(_) if done.clone().any(|&a| tm.is_false(a)) => return None,
            TermKind::Or(_) if done.clone().any(|&a| tm.is_true(a)) => return None,
            TermKind::Implies(..) if self.next == 1 && tm.is_false(self.args[0]) => return None,
            TermKind::Ite(..) if self.next == 1 && tm.is_true(self.args[0]) => {
                return (!tm.is_value(self.args[1])).then_some(1);
            }
            TermKind::Ite(..) if self.next == 1 && tm.is_false(self.args[0]) => {
                self.next = 2;
            }
            TermKind::Ite(..) if self.next == 2 && tm.is_true(self.args[0]) => return None,
            _ => {}
        }
        while self.next < self.args.len() && tm.is_value(self.args[self.next]) {
            self.next += 1;
        }
        (self.next < self.args.len()).then_some(self.next)
    }
}

/// Is the position guarded by `witness` forced? Two scoped queries.
fn forced_value<S: ContextSolver + ?Sized>(
    tm: &TermManager,
    solver: &mut S,
    witness: TermId,
    not_witness: TermId,
    queries: &mut u64,
) -> Option<bool> {
    let answer = {
        let mut scope = ScopedSolver::new(&mut *solver);
        scope.assert_expr(tm, witness);
        *queries += 1;
        scope.check(tm)
    };
    if answer == SatResult::Unsat {
        return Some(true);
    }
    let answer = {
        let mut scope = ScopedSolver::new(&mut *solver);
        scope.assert_expr(tm, not_witness);
        *queries += 1;
        scope.check(tm)
    };
    (answer == SatResult::Unsat).then_some(false)
}

/// The context simplifier over a [`ContextSolver`].
#[derive(Debug)]
pub struct CtxSolverSimplify<S: ContextSolver = PropSolver> {
    solver: S,
    max_steps: u64,
    stats: CtxSolverSimplifyStats,
}

impl Default for CtxSolverSimplify<PropSolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl CtxSolverSimplify<PropSolver> {
    /// Pass over the bundled propositional solver.
    #[must_use]
    pub fn new() -> Self {
        Self::with_solver(PropSolver::new())
    }
}

impl<S: ContextSolver> CtxSolverSimplify<S> {
    /// Pass over `solver`.
    pub fn with_solver(solver: S) -> Self {
        Self {
            solver,
            max_steps: u64::MAX,
            stats: CtxSolverSimplifyStats::default(),
        }
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> &CtxSolverSimplifyStats {
        &self.stats
    }

    /// The embedded solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Simplify `fml` in its own context; `None` when cancelled.
    ///
    /// Each call may issue up to `max_steps` solver queries. Once they are
    /// spent the remaining positions are kept as they are.
    pub fn simplify(&mut self, tm: &mut TermManager, fml: TermId) -> Option<TermId> {
        let bool_sort = tm.sorts.bool_sort;
        let mut solver = ScopedSolver::new(&mut self.solver);
        let stats = &mut self.stats;
        let max_steps = self.max_steps;
        let mut queries = 0;

        let root = tm.mk_fresh_const(WITNESS_PREFIX, bool_sort);
        let differs = tm.mk_eq(fml, root);
        let differs = tm.mk_not(differs);
        solver.assert_expr(tm, differs);

        let mut stack = vec![Frame::new(fml, root)];
        loop {
            if !tm.inc() {
                trace!("ctx-solver-simplify cancelled");
                return None;
            }
            let Some(top) = stack.last_mut() else {
                return None;
            };

            let mut result = None;
            if !top.expanded {
                top.expanded = true;
                let t = top.term;
                if tm.is_value(t) {
                    result = Some(t);
                } else {
                    let not_w = tm.mk_not(top.witness);
                    let forced = if queries < max_steps {
                        let before = queries;
                        let forced =
                            forced_value(tm, &mut *solver, top.witness, not_w, &mut queries);
                        stats.steps += queries - before;
                        forced
                    } else {
                        None
                    };
                    if let Some(b) = forced {
                        stats.forced += 1;
                        result = Some(tm.mk_bool(b));
                    } else if let Some(ops) = tm.bool_operands(t) {
                        top.args = ops;
                    } else {
                        result = Some(t);
                    }
                }
            }

            if result.is_none() {
                let top = stack.last_mut()?;
                match top.next_child(tm) {
                    Some(i) => {
                        let child = top.args[i];
                        let w = tm.mk_fresh_const(WITNESS_PREFIX, bool_sort);
                        let mut abstracted = top.args.clone();
                        abstracted[i] = w;
                        let parent = tm.update_children(top.term, &abstracted);
                        let link = tm.mk_eq(parent, top.witness);
                        solver.push();
                        solver.assert_expr(tm, link);
                        stack.push(Frame::new(child, w));
                        continue;
                    }
                    None => {
                        let (term, args) = (top.term, top.args.clone());
                        result = Some(mk_simplified_app(tm, term, &args));
                    }
                }
            }

            let Some(value) = result else {
                continue;
            };
            stack.pop();
            let Some(parent) = stack.last_mut() else {
                return Some(value);
            };
            parent.args[parent.next] = value;
            parent.next += 1;
            solver.pop(1);
        }
    }
}

impl<S: ContextSolver> Simplifier for CtxSolverSimplify<S> {
    fn name(&self) -> &'static str {
        "ctx-solver-simplify"
    }

    fn configure(&mut self, params: &Params) {
        self.max_steps = params.get_uint(MAX_STEPS, u64::MAX);
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        descrs.insert_max_steps();
    }

    fn run(&mut self, tm: &mut TermManager, state: &mut dyn DependentExprState) {
        if state.proofs_enabled() {
            return;
        }
        let steps_before = self.stats.steps;
        let forced_before = self.stats.forced;
        for i in state.indices() {
            let d = state.get(i).clone();
            let Some(term) = self.simplify(tm, d.fml) else {
                break;
            };
            apply_rewrite(state, i, &d, RewriteOutput { term, proof: None });
        }
        debug!(
            pass = "ctx-solver-simplify",
            steps = self.stats.steps - steps_before,
            forced = self.stats.forced - forced_before,
            "simplifier finished"
        );
    }

    fn collect_statistics(&self, stats: &mut Statistics) {
        stats.update("ctx-solver-simplify-steps", self.stats.steps);
        stats.update("ctx-solver-simplify-forced", self.stats.forced);
    }

    fn reset_statistics(&mut self) {
        self.stats = CtxSolverSimplifyStats::default();
    }
}

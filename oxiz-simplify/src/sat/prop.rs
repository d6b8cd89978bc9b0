//! A small propositional solver over Boolean term structure.
//!
//! Formulas are Tseitin-encoded: every Boolean connective gets a defining
//! variable, and every other Boolean term (an equation between integers, a
//! bit-vector comparison, a quantifier) is an opaque atom. Search is plain
//! DPLL with unit propagation, chronological backtracking and a decision
//! budget. Treating atoms as opaque loses theory reasoning, so `Unsat` is
//! exact while `Sat` only says the Boolean skeleton is satisfiable.

use super::{ContextSolver, Lit, SatResult, Var};
use crate::ast::{TermId, TermKind, TermManager};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

type Clause = SmallVec<[Lit; 4]>;

/// Variable fixed to true at the base level.
const TRUE_VAR: Var = 0;

/// Default number of decisions per check.
pub const DEFAULT_MAX_DECISIONS: u64 = 100_000;

/// Search counters.
#[derive(Debug, Clone, Default)]
pub struct PropSolverStats {
    /// Calls to `check`.
    pub checks: u64,
    /// Branching decisions.
    pub decisions: u64,
    /// Conflicts.
    pub conflicts: u64,
}

#[derive(Debug, Clone, Copy)]
struct ScopeMark {
    clauses: usize,
    encoded: usize,
    num_vars: u32,
}

#[derive(Debug, Clone, Copy)]
struct Decision {
    trail_len: usize,
    lit: Lit,
    flipped: bool,
}

/// Incremental DPLL solver.
#[derive(Debug, Clone)]
pub struct PropSolver {
    lits: FxHashMap<TermId, Lit>,
    /// Terms with an entry in `lits`, in encoding order.
    encoded: Vec<TermId>,
    clauses: Vec<Clause>,
    num_vars: u32,
    scopes: Vec<ScopeMark>,
    model: Vec<Option<bool>>,
    max_decisions: u64,
    stats: PropSolverStats,
}

impl Default for PropSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PropSolver {
    /// Empty solver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lits: FxHashMap::default(),
            encoded: Vec::new(),
            clauses: vec![Clause::from_elem(Lit::positive(TRUE_VAR), 1)],
            num_vars: 1,
            scopes: Vec::new(),
            model: Vec::new(),
            max_decisions: DEFAULT_MAX_DECISIONS,
            stats: PropSolverStats::default(),
        }
    }

    /// Solver answering `Unknown` after `max_decisions` branching decisions.
    #[must_use]
    pub fn with_decision_limit(max_decisions: u64) -> Self {
        Self {
            max_decisions,
            ..Self::new()
        }
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> &PropSolverStats {
        &self.stats
    }

    /// Number of propositional variables.
    #[must_use]
    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    fn new_var(&mut self) -> Var {
        let v = self.num_vars;
        self.num_vars += 1;
        v
    }

    fn add_clause(&mut self, lits: &[Lit]) {
        self.clauses.push(lits.iter().copied().collect());
    }

    fn true_lit() -> Lit {
        Lit::positive(TRUE_VAR)
    }

    /// Literal of `root`, encoding whatever is not encoded yet.
    fn encode(&mut self, tm: &TermManager, root: TermId) -> Lit {
        let mut todo = vec![(root, false)];
        while let Some((t, expanded)) = todo.pop() {
            if self.lits.contains_key(&t) {
                continue;
            }
            let operands = tm.bool_operands(t);
            if !expanded {
                if let Some(ops) = &operands {
                    todo.push((t, true));
                    todo.extend(
                        ops.iter()
                            .filter(|&&a| !self.lits.contains_key(&a))
                            .map(|&a| (a, false)),
                    );
                    continue;
                }
            }
            let lit = self.define(tm, t, operands.as_deref().unwrap_or(&[]));
            self.lits.insert(t, lit);
            self.encoded.push(t);
        }
        self.lits[&root]
    }

    /// Tseitin definition of `t` whose operands are already encoded.
    fn define(&mut self, tm: &TermManager, t: TermId, ops: &[TermId]) -> Lit {
        let ls: SmallVec<[Lit; 4]> = ops.iter().map(|a| self.lits[a]).collect();
        match tm.kind(t) {
            TermKind::True => return Self::true_lit(),
            TermKind::False => return !Self::true_lit(),
            TermKind::Not(_) => return !ls[0],
            _ => {}
        }
        if ls.is_empty() {
            return Lit::positive(self.new_var());
        }
        let v = Lit::positive(self.new_var());
        match tm.kind(t) {
            TermKind::And(_) => {
                for &l in &ls {
                    self.add_clause(&[!v, l]);
                }
                let mut big: Clause = ls.iter().map(|&l| !l).collect();
                big.push(v);
                self.clauses.push(big);
            }
            TermKind::Or(_) => {
                for &l in &ls {
                    self.add_clause(&[v, !l]);
                }
                let mut big: Clause = ls.clone();
                big.push(!v);
                self.clauses.push(big);
            }
            TermKind::Implies(..) => {
                let (a, b) = (ls[0], ls[1]);
                self.add_clause(&[v, a]);
                self.add_clause(&[v, !b]);
                self.add_clause(&[!v, !a, b]);
            }
            TermKind::Xor(..) => {
                let (a, b) = (ls[0], ls[1]);
                self.add_clause(&[!v, a, b]);
                self.add_clause(&[!v, !a, !b]);
                self.add_clause(&[v, !a, b]);
                self.add_clause(&[v, a, !b]);
            }
            TermKind::Eq(..) => {
                let (a, b) = (ls[0], ls[1]);
                self.add_clause(&[!v, !a, b]);
                self.add_clause(&[!v, a, !b]);
                self.add_clause(&[v, a, b]);
                self.add_clause(&[v, !a, !b]);
            }
            TermKind::Ite(..) => {
                let (c, a, b) = (ls[0], ls[1], ls[2]);
                self.add_clause(&[!v, !c, a]);
                self.add_clause(&[!v, c, b]);
                self.add_clause(&[v, !c, !a]);
                self.add_clause(&[v, c, !b]);
            }
            _ => {}
        }
        v
    }

    fn lit_value(assign: &[Option<bool>], lit: Lit) -> Option<bool> {
        assign[lit.var() as usize].map(|b| lit.eval(b))
    }

    fn set(assign: &mut [Option<bool>], trail: &mut Vec<Var>, lit: Lit) {
        assign[lit.var() as usize] = Some(!lit.is_negative());
        trail.push(lit.var());
    }

    /// Unit propagation to fixpoint; false on conflict.
    fn propagate(&self, assign: &mut [Option<bool>], trail: &mut Vec<Var>) -> bool {
        loop {
            let mut changed = false;
            for clause in &self.clauses {
                let mut unit = None;
                let mut open = 0;
                let mut satisfied = false;
                for &l in clause {
                    match Self::lit_value(assign, l) {
                        Some(true) => {
                            satisfied = true;
                            break;
                        }
                        Some(false) => {}
                        None => {
                            open += 1;
                            unit = Some(l);
                        }
                    }
                }
                if satisfied {
                    continue;
                }
                match (open, unit) {
                    (0, _) => return false,
                    (1, Some(l)) => {
                        Self::set(assign, trail, l);
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                return true;
            }
        }
    }

    fn search(&mut self, tm: &TermManager) -> SatResult {
        let n = self.num_vars as usize;
        let mut assign: Vec<Option<bool>> = vec![None; n];
        let mut trail: Vec<Var> = Vec::new();
        let mut decisions: Vec<Decision> = Vec::new();
        let mut budget = self.max_decisions;
        loop {
            if self.propagate(&mut assign, &mut trail) {
                let Some(var) = assign.iter().position(Option::is_none) else {
                    self.model = assign;
                    return SatResult::Sat;
                };
                if budget == 0 || !tm.inc() {
                    return SatResult::Unknown;
                }
                budget -= 1;
                self.stats.decisions += 1;
                let lit = Lit::negative(var as Var);
                decisions.push(Decision {
                    trail_len: trail.len(),
                    lit,
                    flipped: false,
                });
                Self::set(&mut assign, &mut trail, lit);
                continue;
            }
            self.stats.conflicts += 1;
            loop {
                let Some(d) = decisions.pop() else {
                    return SatResult::Unsat;
                };
                for v in trail.drain(d.trail_len..) {
                    assign[v as usize] = None;
                }
                if !d.flipped {
                    let lit = !d.lit;
                    decisions.push(Decision {
                        trail_len: d.trail_len,
                        lit,
                        flipped: true,
                    });
                    Self::set(&mut assign, &mut trail, lit);
                    break;
                }
            }
        }
    }
}

impl ContextSolver for PropSolver {
    fn push(&mut self) {
        self.scopes.push(ScopeMark {
            clauses: self.clauses.len(),
            encoded: self.encoded.len(),
            num_vars: self.num_vars,
        });
    }

    fn pop(&mut self, n: usize) {
        for _ in 0..n {
            let Some(mark) = self.scopes.pop() else {
                break;
            };
            self.clauses.truncate(mark.clauses);
            for t in self.encoded.drain(mark.encoded..) {
                self.lits.remove(&t);
            }
            self.num_vars = mark.num_vars;
        }
        self.model.clear();
    }

    fn assert_expr(&mut self, tm: &TermManager, fml: TermId) {
        debug_assert!(tm.is_bool(fml), "assert_expr: formula must be Boolean");
        let lit = self.encode(tm, fml);
        self.add_clause(&[lit]);
        self.model.clear();
    }

    fn check(&mut self, tm: &TermManager) -> SatResult {
        self.stats.checks += 1;
        self.model.clear();
        if !tm.inc() {
            return SatResult::Unknown;
        }
        self.search(tm)
    }

    fn value(&self, t: TermId) -> Option<bool> {
        let lit = self.lits.get(&t)?;
        let v = self.model.get(lit.var() as usize).copied().flatten()?;
        Some(lit.eval(v))
    }

    fn scope_level(&self) -> usize {
        self.scopes.len()
    }
}

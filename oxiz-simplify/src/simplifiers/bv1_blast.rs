//! Bit-vector to 1-bit blasting.
//!
//! Rewrites bit-vector terms built from equality, if-then-else, concatenation,
//! extraction, numerals and xor into terms over 1-bit bit-vectors joined by
//! `concat`. The blasted form of an `n`-bit term is a `concat` of `n` 1-bit
//! terms, most significant bit first.
//!
//! ## Rules
//!
//! ```text
//! x : (_ BitVec n)        ->  (concat x!0 ... x!n-1)         fresh, memoized
//! #b101                   ->  (concat #b1 #b0 #b1)
//! (= s t)                 ->  (and (= s_0 t_0) ... (= s_n-1 t_n-1))
//! (ite c s t)             ->  (concat ... (ite c s_i t_i) ...)   s_i when s_i = t_i
//! ((_ extract h l) t)     ->  (concat t_{n-1-h} ... t_{n-1-l})
//! (bvxor s t)             ->  (concat ... (ite (= s_i t_i) #b0 #b1) ...)
//! anything else, n > 1    ->  (concat ((_ extract n-1 n-1) e) ... ((_ extract 0 0) e))
//! ```
//!
//! Fresh bits are hidden in the model trail and every blasted constant is
//! defined as the concatenation of its bits.

use crate::ast::{Args, TermId, TermKind, TermManager};
use crate::dependent::{DependentExpr, DependentExprState};
use crate::params::{ParamDescrs, Params};
use crate::proof::{Dependency, Proof};
use crate::rewriter::{Budget, ReduceResult, Rewriter, RewriterConfig};
use crate::simplifiers::{Simplifier, apply_rewrite};
use crate::statistics::Statistics;
use num_bigint::BigInt;
use num_integer::Integer;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, trace};

/// Prefix of the fresh 1-bit constants.
const BIT_PREFIX: &str = "bit";

/// Statistics for the bv1 blaster.
#[derive(Debug, Clone, Default)]
pub struct Bv1BlastStats {
    /// Rewrite steps.
    pub steps: u64,
    /// Fresh 1-bit constants kept.
    pub new_bits: u64,
    /// Formulas left unchanged because a budget ran out.
    pub aborted: u64,
}

/// Positions in the fresh-symbol table, used to undo an aborted formula.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    consts: usize,
    bits: usize,
}

/// Reduction rules of the bv1 blaster.
#[derive(Debug, Default)]
pub struct Bv1BlastConfig {
    budget: Budget,
    const2bits: FxHashMap<TermId, Args>,
    /// Blasted constants in insertion order.
    consts: Vec<TermId>,
    /// Fresh bits in creation order.
    newbits: Vec<TermId>,
}

impl Bv1BlastConfig {
    /// Rules with the given budget.
    #[must_use]
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    /// Bits of a blasted constant.
    #[must_use]
    pub fn bits_of(&self, c: TermId) -> Option<&[TermId]> {
        self.const2bits.get(&c).map(SmallVec::as_slice)
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            consts: self.consts.len(),
            bits: self.newbits.len(),
        }
    }

    fn rollback(&mut self, cp: Checkpoint) {
        for c in self.consts.drain(cp.consts..) {
            self.const2bits.remove(&c);
        }
        self.newbits.truncate(cp.bits);
    }

    /// Blasted bit list of an already rewritten argument.
    fn get_bits(tm: &mut TermManager, t: TermId) -> Args {
        if let TermKind::BvConcat(args) = tm.kind(t) {
            if args.iter().all(|&a| tm.bv_width(a) == Some(1)) {
                return args.clone();
            }
        }
        match tm.bv_width(t) {
            Some(n) if n > 1 => (0..n).rev().map(|i| tm.mk_extract(i, i, t)).collect(),
            _ => SmallVec::from_elem(t, 1),
        }
    }

    fn reduce_const(&mut self, tm: &mut TermManager, c: TermId, width: u32) -> TermId {
        if let Some(bits) = self.const2bits.get(&c) {
            let bits = bits.clone();
            return tm.mk_concat(bits);
        }
        let bit_sort = tm.sorts.bitvec(1);
        let bits: Args = (0..width)
            .map(|_| tm.mk_fresh_const(BIT_PREFIX, bit_sort))
            .collect();
        self.newbits.extend(bits.iter().copied());
        self.consts.push(c);
        self.const2bits.insert(c, bits.clone());
        tm.mk_concat(bits)
    }

    fn reduce_num(tm: &mut TermManager, value: &BigInt, width: u32) -> TermId {
        let two = BigInt::from(2);
        let mut v = value.clone();
        let mut bits: Args = Args::new();
        for _ in 0..width {
            let (q, r) = v.div_rem(&two);
            bits.push(tm.mk_bitvec(r, 1));
            v = q;
        }
        bits.reverse();
        tm.mk_concat(bits)
    }

    fn reduce_eq(tm: &mut TermManager, a: TermId, b: TermId) -> TermId {
        let xs = Self::get_bits(tm, a);
        let ys = Self::get_bits(tm, b);
        debug_assert_eq!(xs.len(), ys.len());
        let eqs: Args = xs
            .iter()
            .zip(ys.iter())
            .map(|(&x, &y)| tm.mk_eq(x, y))
            .collect();
        tm.mk_and(eqs)
    }

    fn reduce_ite(tm: &mut TermManager, c: TermId, t: TermId, e: TermId) -> TermId {
        let ts = Self::get_bits(tm, t);
        let es = Self::get_bits(tm, e);
        let bits: Args = ts
            .iter()
            .zip(es.iter())
            .map(|(&x, &y)| if x == y { x } else { tm.mk_ite(c, x, y) })
            .collect();
        tm.mk_concat(bits)
    }

    fn reduce_extract(tm: &mut TermManager, high: u32, low: u32, arg: TermId) -> TermId {
        let bits = Self::get_bits(tm, arg);
        let n = bits.len();
        let (start, end) = (n - 1 - high as usize, n - 1 - low as usize);
        tm.mk_concat(bits[start..=end].iter().copied())
    }

    fn reduce_concat(tm: &mut TermManager, args: &[TermId]) -> TermId {
        let mut bits = Args::new();
        for &a in args {
            bits.extend(Self::get_bits(tm, a));
        }
        tm.mk_concat(bits)
    }

    fn reduce_xor(tm: &mut TermManager, args: &[TermId]) -> TermId {
        let one = tm.mk_bitvec(1, 1);
        let zero = tm.mk_bitvec(0, 1);
        let mut acc = Self::get_bits(tm, args[0]);
        for &a in &args[1..] {
            let next = Self::get_bits(tm, a);
            for (x, &y) in acc.iter_mut().zip(next.iter()) {
                let eq = tm.mk_eq(*x, y);
                *x = tm.mk_ite(eq, zero, one);
            }
        }
        tm.mk_concat(acc)
    }
}

impl RewriterConfig for Bv1BlastConfig {
    fn reduce_app(
        &mut self,
        tm: &mut TermManager,
        term: TermId,
        args: &[TermId],
    ) -> ReduceResult {
        let width = tm.bv_width(term);
        let wide = width.is_some_and(|w| w > 1);
        let result = match tm.kind(term).clone() {
            TermKind::Var(_) if wide => self.reduce_const(tm, term, width.unwrap_or(1)),
            TermKind::BitVecConst { value, width } if width > 1 => {
                Self::reduce_num(tm, &value, width)
            }
            TermKind::Eq(a, _) if tm.bv_width(a).is_some_and(|w| w > 1) => {
                Self::reduce_eq(tm, args[0], args[1])
            }
            TermKind::Ite(..) if wide => Self::reduce_ite(tm, args[0], args[1], args[2]),
            TermKind::BvExtract { high, low, arg } if tm.bv_width(arg).is_some_and(|w| w > 1) => {
                Self::reduce_extract(tm, high, low, args[0])
            }
            TermKind::BvConcat(_) => Self::reduce_concat(tm, args),
            TermKind::BvXor(_) => Self::reduce_xor(tm, args),
            _ if wide => {
                let rebuilt = tm.update_children(term, args);
                let n = width.unwrap_or(1);
                let bits: Args = (0..n).rev().map(|i| tm.mk_extract(i, i, rebuilt)).collect();
                tm.mk_concat(bits)
            }
            _ => return ReduceResult::Failed,
        };
        ReduceResult::Done(result)
    }

    fn max_steps_exceeded(&self, steps: u64) -> bool {
        steps > self.budget.max_steps
    }

    fn max_memory(&self) -> u64 {
        self.budget.max_memory
    }
}

/// The bv1 blasting pass.
///
/// The fresh-symbol table lives as long as the pass object, so running the
/// pass again over new formulas reuses the bits already introduced.
#[derive(Debug)]
pub struct Bv1Blast {
    rw: Rewriter<Bv1BlastConfig>,
    /// Constants already linked to their bits by an added equation.
    linked: FxHashSet<TermId>,
    /// Constants of aborted formulas awaiting a link.
    pending: FxHashSet<TermId>,
    stats: Bv1BlastStats,
}

impl Default for Bv1Blast {
    fn default() -> Self {
        Self::new()
    }
}

impl Bv1Blast {
    /// Pass without limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rw: Rewriter::new(Bv1BlastConfig::new(Budget::unlimited())),
            linked: FxHashSet::default(),
            pending: FxHashSet::default(),
            stats: Bv1BlastStats::default(),
        }
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> &Bv1BlastStats {
        &self.stats
    }

    /// Bits a constant was blasted into, most significant first.
    #[must_use]
    pub fn bits_of(&self, c: TermId) -> Option<&[TermId]> {
        self.rw.cfg().bits_of(c)
    }

    /// Add `c = concat(bits)` for each pending constant that has bits, whether
    /// it was blasted in this run or an earlier one.
    fn link_pending(&mut self, tm: &mut TermManager, state: &mut dyn DependentExprState) {
        let mut ready: Vec<TermId> = self
            .pending
            .iter()
            .copied()
            .filter(|&c| self.rw.cfg().bits_of(c).is_some())
            .collect();
        ready.sort_unstable();
        for c in ready {
            self.pending.remove(&c);
            let Some(bits) = self.rw.cfg().bits_of(c) else {
                continue;
            };
            if !self.linked.insert(c) {
                continue;
            }
            let bits: Args = bits.iter().copied().collect();
            let cat = tm.mk_concat(bits);
            let eq = tm.mk_eq(c, cat);
            let proof = state
                .proofs_enabled()
                .then(|| Arc::new(Proof::Definition(eq)));
            state.add(DependentExpr::with_proof(eq, proof, Dependency::empty()));
        }
    }
}

impl Simplifier for Bv1Blast {
    fn name(&self) -> &'static str {
        "bv1-blast"
    }

    fn configure(&mut self, params: &Params) {
        self.rw.cfg_mut().budget = Budget::from_params(params);
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        Budget::collect_param_descrs(descrs);
    }

    fn run(&mut self, tm: &mut TermManager, state: &mut dyn DependentExprState) {
        self.rw.set_proofs(state.proofs_enabled());
        let start = self.rw.cfg().checkpoint();
        let steps_before = self.rw.total_steps();
        let mut aborted = Vec::new();

        for i in state.indices() {
            let d = state.get(i).clone();
            let cp = self.rw.cfg().checkpoint();
            match self.rw.rewrite(tm, d.fml) {
                Ok(out) => {
                    apply_rewrite(state, i, &d, out);
                }
                Err(err) => {
                    trace!(index = i, %err, "bv1-blast left formula unchanged");
                    self.rw.cfg_mut().rollback(cp);
                    self.stats.aborted += 1;
                    aborted.push(d.fml);
                }
            }
        }

        for fml in aborted {
            let consts = tm.collect_constants(fml);
            self.pending
                .extend(consts.into_iter().filter(|c| !self.linked.contains(c)));
        }
        self.link_pending(tm, state);

        let cfg = self.rw.cfg();
        let new_bits: Vec<TermId> = cfg.newbits[start.bits..].to_vec();
        let new_consts: Vec<(TermId, Args)> = cfg.consts[start.consts..]
            .iter()
            .filter_map(|&c| cfg.const2bits.get(&c).map(|bits| (c, bits.clone())))
            .collect();
        let trail = state.model_trail_mut();
        for &b in &new_bits {
            trail.hide(b);
        }
        for (c, bits) in new_consts {
            let def = tm.mk_concat(bits);
            state.model_trail_mut().push(c, def, Dependency::empty());
        }

        let steps = self.rw.total_steps() - steps_before;
        self.stats.steps += steps;
        self.stats.new_bits += new_bits.len() as u64;
        debug!(
            pass = "bv1-blast",
            steps,
            new_symbols = new_bits.len(),
            "simplifier finished"
        );
    }

    fn collect_statistics(&self, stats: &mut Statistics) {
        stats.update("bv1-blast-steps", self.stats.steps);
        stats.update("bv1-blast-new-bits", self.stats.new_bits);
        stats.update("bv1-blast-aborted", self.stats.aborted);
    }

    fn reset_statistics(&mut self) {
        self.stats = Bv1BlastStats::default();
    }
}

//! Floating-point to bit-vector lowering.
//!
//! Every floating-point constant `x` of format `(eb, sb)` is replaced by
//! `(fp s e m)` over fresh bit-vectors of widths `1`, `eb` and `sb - 1`, and
//! literals by `fp` over numerals. Equality, `ite`, sign manipulation,
//! comparisons and classification predicates are then expressed on the
//! fields directly. Arithmetic is out of reach of this pass: `fp.add`,
//! `fp.mul` and uninterpreted functions returning floats keep their
//! (lowered) arguments and are counted as unsupported.
//!
//! There is one NaN but many NaN bit patterns. Lowered literals use the
//! canonical pattern, and floating-point arguments of uninterpreted functions
//! are mapped to it, so congruence over the fields agrees with congruence
//! over the floats.

use crate::ast::{Args, TermId, TermKind, TermManager};
use crate::dependent::{DependentExpr, DependentExprState};
use crate::model::fp::FpBits;
use crate::params::{ParamDescrs, Params};
use crate::proof::{Dependency, Proof};
use crate::rewriter::{Budget, ReduceResult, Rewriter, RewriterConfig};
use crate::simplifiers::{Simplifier, apply_rewrite};
use crate::statistics::Statistics;
use num_bigint::BigInt;
use num_traits::One;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::{debug, trace};

const SIGN_PREFIX: &str = "fp_sgn";
const EXP_PREFIX: &str = "fp_exp";
const SIG_PREFIX: &str = "fp_sig";

/// Bit fields standing for one floating-point term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FpFields {
    /// 1-bit sign.
    pub sign: TermId,
    /// Biased exponent.
    pub exp: TermId,
    /// Trailing significand.
    pub sig: TermId,
}

/// Counters of the lowering.
#[derive(Debug, Clone, Default)]
pub struct Fpa2BvStats {
    /// Rewrite steps.
    pub steps: u64,
    /// Fresh bit-vector constants kept.
    pub new_bits: u64,
    /// Operator occurrences left in floating point.
    pub unsupported: u64,
    /// Formulas left unchanged because a budget ran out.
    pub aborted: u64,
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    consts: usize,
    bits: usize,
    unsupported: u64,
}

/// Lowering rules.
#[derive(Debug, Default)]
pub struct Fpa2BvConfig {
    budget: Budget,
    const2fields: FxHashMap<TermId, FpFields>,
    consts: Vec<TermId>,
    newbits: Vec<TermId>,
    unsupported: u64,
}

fn literal_bits(kind: &TermKind) -> Option<FpBits> {
    let bits = match kind {
        TermKind::FpLit {
            sign,
            exp,
            sig,
            eb,
            sb,
        } => FpBits {
            sign: *sign,
            exp: exp.clone(),
            sig: sig.clone(),
            eb: *eb,
            sb: *sb,
        },
        TermKind::FpPlusZero { eb, sb } => FpBits::zero(false, *eb, *sb),
        TermKind::FpMinusZero { eb, sb } => FpBits::zero(true, *eb, *sb),
        TermKind::FpPlusInfinity { eb, sb } => FpBits::infinity(false, *eb, *sb),
        TermKind::FpMinusInfinity { eb, sb } => FpBits::infinity(true, *eb, *sb),
        TermKind::FpNaN { eb, sb } => FpBits::nan(*eb, *sb),
        _ => return None,
    };
    Some(bits)
}

impl Fpa2BvConfig {
    /// Rules with the given budget.
    #[must_use]
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    /// Fields a constant was lowered to.
    #[must_use]
    pub fn fields_of(&self, c: TermId) -> Option<FpFields> {
        self.const2fields.get(&c).copied()
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            consts: self.consts.len(),
            bits: self.newbits.len(),
            unsupported: self.unsupported,
        }
    }

    fn rollback(&mut self, cp: Checkpoint) {
        for c in self.consts.drain(cp.consts..) {
            self.const2fields.remove(&c);
        }
        self.newbits.truncate(cp.bits);
        self.unsupported = cp.unsupported;
    }

    fn split(tm: &TermManager, t: TermId) -> Option<FpFields> {
        match tm.kind(t) {
            TermKind::FpFromBits(sign, exp, sig) => Some(FpFields {
                sign: *sign,
                exp: *exp,
                sig: *sig,
            }),
            _ => None,
        }
    }

    fn join(tm: &mut TermManager, f: FpFields) -> TermId {
        tm.mk_fp(f.sign, f.exp, f.sig)
    }

    fn reduce_const(&mut self, tm: &mut TermManager, c: TermId, eb: u32, sb: u32) -> TermId {
        if let Some(f) = self.const2fields.get(&c).copied() {
            return Self::join(tm, f);
        }
        let s_sort = tm.sorts.bitvec(1);
        let e_sort = tm.sorts.bitvec(eb);
        let m_sort = tm.sorts.bitvec(sb - 1);
        let f = FpFields {
            sign: tm.mk_fresh_const(SIGN_PREFIX, s_sort),
            exp: tm.mk_fresh_const(EXP_PREFIX, e_sort),
            sig: tm.mk_fresh_const(SIG_PREFIX, m_sort),
        };
        self.newbits.extend([f.sign, f.exp, f.sig]);
        self.consts.push(c);
        self.const2fields.insert(c, f);
        Self::join(tm, f)
    }

    /// `fp` over numerals; every NaN becomes the canonical one.
    fn reduce_literal(tm: &mut TermManager, bits: &FpBits) -> TermId {
        let canonical;
        let bits = if bits.is_nan() {
            canonical = FpBits::nan(bits.eb, bits.sb);
            &canonical
        } else {
            bits
        };
        let sign = tm.mk_bitvec(u8::from(bits.sign), 1);
        let exp = tm.mk_bitvec(bits.exp.clone(), bits.eb);
        let sig = tm.mk_bitvec(bits.sig.clone(), bits.sb - 1);
        tm.mk_fp(sign, exp, sig)
    }

    fn exp_all_ones(tm: &mut TermManager, f: FpFields) -> TermId {
        let eb = tm.bv_width(f.exp).unwrap_or(1);
        let ones = tm.mk_bitvec((BigInt::one() << eb) - 1, eb);
        tm.mk_eq(f.exp, ones)
    }

    fn is_zero_bv(tm: &mut TermManager, t: TermId) -> TermId {
        let w = tm.bv_width(t).unwrap_or(1);
        let zero = tm.mk_bitvec(0, w);
        tm.mk_eq(t, zero)
    }

    fn sign_set(tm: &mut TermManager, f: FpFields) -> TermId {
        let one = tm.mk_bitvec(1, 1);
        tm.mk_eq(f.sign, one)
    }

    fn is_nan(tm: &mut TermManager, f: FpFields) -> TermId {
        let top = Self::exp_all_ones(tm, f);
        let m_zero = Self::is_zero_bv(tm, f.sig);
        let m_nonzero = tm.mk_not(m_zero);
        tm.mk_and([top, m_nonzero])
    }

    fn is_inf(tm: &mut TermManager, f: FpFields) -> TermId {
        let top = Self::exp_all_ones(tm, f);
        let m_zero = Self::is_zero_bv(tm, f.sig);
        tm.mk_and([top, m_zero])
    }

    fn is_zero(tm: &mut TermManager, f: FpFields) -> TermId {
        let e_zero = Self::is_zero_bv(tm, f.exp);
        let m_zero = Self::is_zero_bv(tm, f.sig);
        tm.mk_and([e_zero, m_zero])
    }

    fn is_subnormal(tm: &mut TermManager, f: FpFields) -> TermId {
        let e_zero = Self::is_zero_bv(tm, f.exp);
        let m_zero = Self::is_zero_bv(tm, f.sig);
        let m_nonzero = tm.mk_not(m_zero);
        tm.mk_and([e_zero, m_nonzero])
    }

    fn is_normal(tm: &mut TermManager, f: FpFields) -> TermId {
        let e_zero = Self::is_zero_bv(tm, f.exp);
        let top = Self::exp_all_ones(tm, f);
        let not_zero = tm.mk_not(e_zero);
        let not_top = tm.mk_not(top);
        tm.mk_and([not_zero, not_top])
    }

    fn is_negative(tm: &mut TermManager, f: FpFields) -> TermId {
        let neg = Self::sign_set(tm, f);
        let nan = Self::is_nan(tm, f);
        let not_nan = tm.mk_not(nan);
        tm.mk_and([neg, not_nan])
    }

    fn is_positive(tm: &mut TermManager, f: FpFields) -> TermId {
        let neg = Self::sign_set(tm, f);
        let pos = tm.mk_not(neg);
        let nan = Self::is_nan(tm, f);
        let not_nan = tm.mk_not(nan);
        tm.mk_and([pos, not_nan])
    }

    /// Fields of `f` with every NaN mapped to the canonical NaN, so that
    /// terms equal in floating point stay equal as bits.
    fn canonical_nan(tm: &mut TermManager, f: FpFields) -> FpFields {
        if [f.sign, f.exp, f.sig].iter().all(|&t| tm.is_value(t)) {
            return f;
        }
        let (Some(eb), Some(m)) = (tm.bv_width(f.exp), tm.bv_width(f.sig)) else {
            return f;
        };
        let nan = FpBits::nan(eb, m + 1);
        let is_nan = Self::is_nan(tm, f);
        let sign = tm.mk_bitvec(u8::from(nan.sign), 1);
        let exp = tm.mk_bitvec(nan.exp, eb);
        let sig = tm.mk_bitvec(nan.sig, m);
        FpFields {
            sign: tm.mk_ite(is_nan, sign, f.sign),
            exp: tm.mk_ite(is_nan, exp, f.exp),
            sig: tm.mk_ite(is_nan, sig, f.sig),
        }
    }

    /// SMT-LIB `=`: identical fields, or both NaN.
    fn smt_eq(tm: &mut TermManager, a: FpFields, b: FpFields) -> TermId {
        let nan_a = Self::is_nan(tm, a);
        let nan_b = Self::is_nan(tm, b);
        let both_nan = tm.mk_and([nan_a, nan_b]);
        let same = Self::same_fields(tm, a, b);
        tm.mk_or([both_nan, same])
    }

    fn same_fields(tm: &mut TermManager, a: FpFields, b: FpFields) -> TermId {
        let s = tm.mk_eq(a.sign, b.sign);
        let e = tm.mk_eq(a.exp, b.exp);
        let m = tm.mk_eq(a.sig, b.sig);
        tm.mk_and([s, e, m])
    }

    fn neither_nan(tm: &mut TermManager, a: FpFields, b: FpFields) -> [TermId; 2] {
        let nan_a = Self::is_nan(tm, a);
        let nan_b = Self::is_nan(tm, b);
        [tm.mk_not(nan_a), tm.mk_not(nan_b)]
    }

    /// IEEE equality: `+0 = -0`, NaN equals nothing.
    fn fp_eq(tm: &mut TermManager, a: FpFields, b: FpFields) -> TermId {
        let [ok_a, ok_b] = Self::neither_nan(tm, a, b);
        let zero_a = Self::is_zero(tm, a);
        let zero_b = Self::is_zero(tm, b);
        let both_zero = tm.mk_and([zero_a, zero_b]);
        let same = Self::same_fields(tm, a, b);
        let eq = tm.mk_or([both_zero, same]);
        tm.mk_and([ok_a, ok_b, eq])
    }

    /// IEEE `<`. Magnitudes compare as unsigned `exp ++ sig`.
    fn fp_lt(tm: &mut TermManager, a: FpFields, b: FpFields) -> TermId {
        let [ok_a, ok_b] = Self::neither_nan(tm, a, b);
        let zero_a = Self::is_zero(tm, a);
        let zero_b = Self::is_zero(tm, b);
        let both_zero = tm.mk_and([zero_a, zero_b]);
        let not_both_zero = tm.mk_not(both_zero);

        let mag_a = tm.mk_concat([a.exp, a.sig]);
        let mag_b = tm.mk_concat([b.exp, b.sig]);
        let less_pos = tm.mk_bv_ult(mag_a, mag_b);
        let less_neg = tm.mk_bv_ult(mag_b, mag_a);
        let neg_a = Self::sign_set(tm, a);
        let neg_b = Self::sign_set(tm, b);
        let pos_a = tm.mk_not(neg_a);
        let pos_b = tm.mk_not(neg_b);

        let mixed = tm.mk_and([neg_a, pos_b]);
        let both_pos = tm.mk_and([pos_a, pos_b, less_pos]);
        let both_neg = tm.mk_and([neg_a, neg_b, less_neg]);
        let ordered = tm.mk_or([mixed, both_pos, both_neg]);
        tm.mk_and([ok_a, ok_b, not_both_zero, ordered])
    }

    fn fp_leq(tm: &mut TermManager, a: FpFields, b: FpFields) -> TermId {
        let lt = Self::fp_lt(tm, a, b);
        let eq = Self::fp_eq(tm, a, b);
        tm.mk_or([lt, eq])
    }

    fn unary(tm: &TermManager, args: &[TermId]) -> Option<FpFields> {
        args.first().and_then(|&a| Self::split(tm, a))
    }

    fn binary(tm: &TermManager, args: &[TermId]) -> Option<(FpFields, FpFields)> {
        match args {
            [a, b] => Some((Self::split(tm, *a)?, Self::split(tm, *b)?)),
            _ => None,
        }
    }
}

impl RewriterConfig for Fpa2BvConfig {
    fn reduce_app(
        &mut self,
        tm: &mut TermManager,
        term: TermId,
        args: &[TermId],
    ) -> ReduceResult {
        let kind = tm.kind(term).clone();
        if let Some(bits) = literal_bits(&kind) {
            return ReduceResult::Done(Self::reduce_literal(tm, &bits));
        }
        let result = match kind {
            TermKind::Var(_) => match tm.fp_format(term) {
                Some((eb, sb)) => self.reduce_const(tm, term, eb, sb),
                None => return ReduceResult::Failed,
            },
            TermKind::Eq(..) => match Self::binary(tm, args) {
                Some((a, b)) => Self::smt_eq(tm, a, b),
                None => return ReduceResult::Failed,
            },
            TermKind::Ite(..) => {
                let (Some(a), Some(b)) = (Self::split(tm, args[1]), Self::split(tm, args[2]))
                else {
                    return ReduceResult::Failed;
                };
                let c = args[0];
                let f = FpFields {
                    sign: tm.mk_ite(c, a.sign, b.sign),
                    exp: tm.mk_ite(c, a.exp, b.exp),
                    sig: tm.mk_ite(c, a.sig, b.sig),
                };
                Self::join(tm, f)
            }
            TermKind::FpNeg(_) => match Self::unary(tm, args) {
                Some(f) => {
                    let sign = tm.mk_bv_not(f.sign);
                    Self::join(tm, FpFields { sign, ..f })
                }
                None => return ReduceResult::Failed,
            },
            TermKind::FpAbs(_) => match Self::unary(tm, args) {
                Some(f) => {
                    let sign = tm.mk_bitvec(0, 1);
                    Self::join(tm, FpFields { sign, ..f })
                }
                None => return ReduceResult::Failed,
            },
            TermKind::FpEq(..)
            | TermKind::FpLt(..)
            | TermKind::FpLeq(..)
            | TermKind::FpGt(..)
            | TermKind::FpGeq(..) => {
                let Some((a, b)) = Self::binary(tm, args) else {
                    return ReduceResult::Failed;
                };
                match kind {
                    TermKind::FpEq(..) => Self::fp_eq(tm, a, b),
                    TermKind::FpLt(..) => Self::fp_lt(tm, a, b),
                    TermKind::FpLeq(..) => Self::fp_leq(tm, a, b),
                    TermKind::FpGt(..) => Self::fp_lt(tm, b, a),
                    _ => Self::fp_leq(tm, b, a),
                }
            }
            TermKind::FpIsNaN(_)
            | TermKind::FpIsInfinite(_)
            | TermKind::FpIsZero(_)
            | TermKind::FpIsNormal(_)
            | TermKind::FpIsSubnormal(_)
            | TermKind::FpIsNegative(_)
            | TermKind::FpIsPositive(_) => {
                let Some(f) = Self::unary(tm, args) else {
                    return ReduceResult::Failed;
                };
                match kind {
                    TermKind::FpIsNaN(_) => Self::is_nan(tm, f),
                    TermKind::FpIsInfinite(_) => Self::is_inf(tm, f),
                    TermKind::FpIsZero(_) => Self::is_zero(tm, f),
                    TermKind::FpIsNormal(_) => Self::is_normal(tm, f),
                    TermKind::FpIsSubnormal(_) => Self::is_subnormal(tm, f),
                    TermKind::FpIsNegative(_) => Self::is_negative(tm, f),
                    _ => Self::is_positive(tm, f),
                }
            }
            TermKind::FpAdd(..) | TermKind::FpMul(..) => {
                self.unsupported += 1;
                return ReduceResult::Failed;
            }
            TermKind::Apply { .. } => {
                if tm.fp_format(term).is_some() {
                    self.unsupported += 1;
                }
                let mut new_args: Args = args.iter().copied().collect();
                let mut changed = false;
                for a in &mut new_args {
                    let Some(f) = Self::split(tm, *a) else {
                        continue;
                    };
                    let canonical = Self::canonical_nan(tm, f);
                    if canonical != f {
                        *a = Self::join(tm, canonical);
                        changed = true;
                    }
                }
                if !changed {
                    return ReduceResult::Failed;
                }
                tm.update_children(term, &new_args)
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

/// The floating-point lowering pass.
#[derive(Debug)]
pub struct Fpa2Bv {
    rw: Rewriter<Fpa2BvConfig>,
    linked: FxHashSet<TermId>,
    /// Constants of aborted formulas awaiting a link.
    pending: FxHashSet<TermId>,
    stats: Fpa2BvStats,
}

impl Default for Fpa2Bv {
    fn default() -> Self {
        Self::new()
    }
}

impl Fpa2Bv {
    /// Pass without limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rw: Rewriter::new(Fpa2BvConfig::new(Budget::unlimited())),
            linked: FxHashSet::default(),
            pending: FxHashSet::default(),
            stats: Fpa2BvStats::default(),
        }
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> &Fpa2BvStats {
        &self.stats
    }

    /// Fields a constant was lowered to.
    #[must_use]
    pub fn fields_of(&self, c: TermId) -> Option<FpFields> {
        self.rw.cfg().fields_of(c)
    }

    fn link_pending(&mut self, tm: &mut TermManager, state: &mut dyn DependentExprState) {
        let mut ready: Vec<TermId> = self
            .pending
            .iter()
            .copied()
            .filter(|&c| self.fields_of(c).is_some())
            .collect();
        ready.sort_unstable();
        for c in ready {
            self.pending.remove(&c);
            let Some(f) = self.fields_of(c) else {
                continue;
            };
            if !self.linked.insert(c) {
                continue;
            }
            let fp = tm.mk_fp(f.sign, f.exp, f.sig);
            let eq = tm.mk_eq(c, fp);
            let proof = state
                .proofs_enabled()
                .then(|| Arc::new(Proof::Definition(eq)));
            state.add(DependentExpr::with_proof(eq, proof, Dependency::empty()));
        }
    }

    /// Fix the fields of `x` to the canonical NaN when `fml` is `fp.isNaN(x)`.
    fn pin_nan(&self, tm: &mut TermManager, state: &mut dyn DependentExprState, d: &DependentExpr) {
        let TermKind::FpIsNaN(x) = *tm.kind(d.fml) else {
            return;
        };
        let (Some(f), Some((eb, sb))) = (self.fields_of(x), tm.fp_format(x)) else {
            return;
        };
        let nan = FpBits::nan(eb, sb);
        let sign = tm.mk_bitvec(u8::from(nan.sign), 1);
        let exp = tm.mk_bitvec(nan.exp, eb);
        let sig = tm.mk_bitvec(nan.sig, sb - 1);
        for (field, value) in [(f.sign, sign), (f.exp, exp), (f.sig, sig)] {
            let eq = tm.mk_eq(field, value);
            state.add(DependentExpr::new(eq, d.dep.clone()));
        }
    }
}

impl Simplifier for Fpa2Bv {
    fn name(&self) -> &'static str {
        "fpa2bv"
    }

    fn configure(&mut self, params: &Params) {
        self.rw.cfg_mut().budget = Budget::from_params(params);
    }

    fn collect_param_descrs(&self, descrs: &mut ParamDescrs) {
        Budget::collect_param_descrs(descrs);
    }

    fn run(&mut self, tm: &mut TermManager, state: &mut dyn DependentExprState) {
        let proofs = state.proofs_enabled();
        self.rw.set_proofs(proofs);
        let start = self.rw.cfg().checkpoint();
        let steps_before = self.rw.total_steps();
        let mut aborted = Vec::new();

        for i in state.indices() {
            let d = state.get(i).clone();
            let cp = self.rw.cfg().checkpoint();
            match self.rw.rewrite(tm, d.fml) {
                Ok(out) => {
                    apply_rewrite(state, i, &d, out);
                    if !proofs {
                        self.pin_nan(tm, state, &d);
                    }
                }
                Err(err) => {
                    trace!(index = i, %err, "fpa2bv left formula unchanged");
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
        let new_consts: Vec<(TermId, FpFields)> = cfg.consts[start.consts..]
            .iter()
            .filter_map(|&c| cfg.fields_of(c).map(|f| (c, f)))
            .collect();
        let unsupported = cfg.unsupported - start.unsupported;
        let trail = state.model_trail_mut();
        for &b in &new_bits {
            trail.hide(b);
        }
        for (c, f) in new_consts {
            let def = tm.mk_fp(f.sign, f.exp, f.sig);
            state.model_trail_mut().push(c, def, Dependency::empty());
        }

        let steps = self.rw.total_steps() - steps_before;
        self.stats.steps += steps;
        self.stats.new_bits += new_bits.len() as u64;
        self.stats.unsupported += unsupported;
        debug!(
            pass = "fpa2bv",
            steps,
            new_symbols = new_bits.len(),
            unsupported,
            "simplifier finished"
        );
    }

    fn collect_statistics(&self, stats: &mut Statistics) {
        stats.update("fpa2bv-steps", self.stats.steps);
        stats.update("fpa2bv-new-bits", self.stats.new_bits);
        stats.update("fpa2bv-unsupported", self.stats.unsupported);
        stats.update("fpa2bv-aborted", self.stats.aborted);
    }

    fn reset_statistics(&mut self) {
        self.stats = Fpa2BvStats::default();
    }
}

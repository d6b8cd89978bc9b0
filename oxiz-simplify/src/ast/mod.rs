//! Hash-consed term graph.
//!
//! Terms live in an arena owned by the [`TermManager`] and are referred to by
//! [`TermId`] handles. Construction goes through a hash-consing table keyed by
//! `(kind, sort)`, so two structurally equal terms always share an id and id
//! equality is term equality.
//!
//! Constructors are deliberately thin: apart from collapsing `and`/`or`/`concat`
//! with zero or one argument they build exactly what they are asked for. Local
//! simplification lives in [`simplified`].

pub mod display;
pub mod simplified;
mod traversal;

pub use display::TermDisplay;

use crate::resource::CancellationFlag;
use crate::sort::{Sort, SortId, SortKind, SortManager};
use lasso::{Rodeo, Spur};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use rustc_hash::FxHashMap;
use smallvec::{SmallVec, smallvec};

/// Argument list of an operator application.
pub type Args = SmallVec<[TermId; 4]>;

/// Handle to a term owned by a [`TermManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub u32);

impl TermId {
    /// Raw index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// IEEE rounding modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    /// Round to nearest, ties to even.
    RNE,
    /// Round to nearest, ties away from zero.
    RNA,
    /// Round toward positive.
    RTP,
    /// Round toward negative.
    RTN,
    /// Round toward zero.
    RTZ,
}

/// Operator and children of a term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// Boolean true.
    True,
    /// Boolean false.
    False,
    /// Uninterpreted constant (also used for bound variables).
    Var(Spur),
    /// Integer numeral.
    IntConst(BigInt),
    /// Bit-vector numeral, `0 <= value < 2^width`.
    BitVecConst {
        /// Unsigned value.
        value: BigInt,
        /// Width in bits.
        width: u32,
    },
    /// Floating-point literal given by its IEEE fields.
    FpLit {
        /// Sign bit.
        sign: bool,
        /// Biased exponent field.
        exp: BigInt,
        /// Trailing significand field.
        sig: BigInt,
        /// Exponent width.
        eb: u32,
        /// Significand width (hidden bit included).
        sb: u32,
    },
    /// `+zero`.
    FpPlusZero {
        /// Exponent width.
        eb: u32,
        /// Significand width.
        sb: u32,
    },
    /// `-zero`.
    FpMinusZero {
        /// Exponent width.
        eb: u32,
        /// Significand width.
        sb: u32,
    },
    /// `+oo`.
    FpPlusInfinity {
        /// Exponent width.
        eb: u32,
        /// Significand width.
        sb: u32,
    },
    /// `-oo`.
    FpMinusInfinity {
        /// Exponent width.
        eb: u32,
        /// Significand width.
        sb: u32,
    },
    /// Not-a-number.
    FpNaN {
        /// Exponent width.
        eb: u32,
        /// Significand width.
        sb: u32,
    },

    /// Negation.
    Not(TermId),
    /// Conjunction.
    And(Args),
    /// Disjunction.
    Or(Args),
    /// Implication.
    Implies(TermId, TermId),
    /// Exclusive or.
    Xor(TermId, TermId),
    /// Equality (iff on Booleans).
    Eq(TermId, TermId),
    /// Pairwise distinctness.
    Distinct(Args),
    /// If-then-else.
    Ite(TermId, TermId, TermId),

    /// Integer sum.
    Add(Args),
    /// Integer product.
    Mul(Args),
    /// `<=` on integers.
    Le(TermId, TermId),
    /// `<` on integers.
    Lt(TermId, TermId),

    /// Concatenation, first argument most significant.
    BvConcat(Args),
    /// Bit range `[high:low]` of `arg`.
    BvExtract {
        /// Highest bit index (inclusive).
        high: u32,
        /// Lowest bit index (inclusive).
        low: u32,
        /// Operand.
        arg: TermId,
    },
    /// Bitwise not.
    BvNot(TermId),
    /// Bitwise and.
    BvAnd(TermId, TermId),
    /// Bitwise or.
    BvOr(TermId, TermId),
    /// Bitwise xor over any number of operands.
    BvXor(Args),
    /// Modular addition.
    BvAdd(TermId, TermId),
    /// Modular multiplication.
    BvMul(TermId, TermId),
    /// Unsigned less-than.
    BvUlt(TermId, TermId),

    /// `(fp sign exp sig)`: a float assembled from its bit fields.
    FpFromBits(TermId, TermId, TermId),
    /// `fp.neg`.
    FpNeg(TermId),
    /// `fp.abs`.
    FpAbs(TermId),
    /// `fp.add`.
    FpAdd(RoundingMode, TermId, TermId),
    /// `fp.mul`.
    FpMul(RoundingMode, TermId, TermId),
    /// `fp.eq` (IEEE equality).
    FpEq(TermId, TermId),
    /// `fp.lt`.
    FpLt(TermId, TermId),
    /// `fp.leq`.
    FpLeq(TermId, TermId),
    /// `fp.gt`.
    FpGt(TermId, TermId),
    /// `fp.geq`.
    FpGeq(TermId, TermId),
    /// `fp.isNaN`.
    FpIsNaN(TermId),
    /// `fp.isInfinite`.
    FpIsInfinite(TermId),
    /// `fp.isZero`.
    FpIsZero(TermId),
    /// `fp.isNormal`.
    FpIsNormal(TermId),
    /// `fp.isSubnormal`.
    FpIsSubnormal(TermId),
    /// `fp.isNegative`.
    FpIsNegative(TermId),
    /// `fp.isPositive`.
    FpIsPositive(TermId),

    /// Application of an uninterpreted function.
    Apply {
        /// Function symbol.
        func: Spur,
        /// Arguments.
        args: Args,
    },
    /// Universal quantifier.
    Forall {
        /// Bound variables.
        vars: SmallVec<[(Spur, SortId); 2]>,
        /// Body.
        body: TermId,
        /// Instantiation patterns.
        patterns: Args,
    },
    /// Existential quantifier.
    Exists {
        /// Bound variables.
        vars: SmallVec<[(Spur, SortId); 2]>,
        /// Body.
        body: TermId,
        /// Instantiation patterns.
        patterns: Args,
    },
}

impl TermKind {
    /// Children in positional order. Quantifiers list the body, then the patterns.
    #[must_use]
    pub fn children(&self) -> Args {
        use TermKind::*;
        match self {
            True
            | False
            | Var(_)
            | IntConst(_)
            | BitVecConst { .. }
            | FpLit { .. }
            | FpPlusZero { .. }
            | FpMinusZero { .. }
            | FpPlusInfinity { .. }
            | FpMinusInfinity { .. }
            | FpNaN { .. } => Args::new(),
            Not(a) | BvNot(a) | FpNeg(a) | FpAbs(a) | FpIsNaN(a) | FpIsInfinite(a)
            | FpIsZero(a) | FpIsNormal(a) | FpIsSubnormal(a) | FpIsNegative(a)
            | FpIsPositive(a) => smallvec![*a],
            BvExtract { arg, .. } => smallvec![*arg],
            Implies(a, b) | Xor(a, b) | Eq(a, b) | Le(a, b) | Lt(a, b) | BvAnd(a, b)
            | BvOr(a, b) | BvAdd(a, b) | BvMul(a, b) | BvUlt(a, b) | FpEq(a, b)
            | FpLt(a, b) | FpLeq(a, b) | FpGt(a, b) | FpGeq(a, b) | FpAdd(_, a, b)
            | FpMul(_, a, b) => smallvec![*a, *b],
            Ite(a, b, c) | FpFromBits(a, b, c) => smallvec![*a, *b, *c],
            And(args) | Or(args) | Distinct(args) | Add(args) | Mul(args) | BvConcat(args)
            | BvXor(args) => args.clone(),
            Apply { args, .. } => args.clone(),
            Forall { body, patterns, .. } | Exists { body, patterns, .. } => {
                let mut out: Args = smallvec![*body];
                out.extend(patterns.iter().copied());
                out
            }
        }
    }

    /// The same operator applied to `new` children (same arity as [`Self::children`]).
    #[must_use]
    pub fn with_children(&self, new: &[TermId]) -> TermKind {
        use TermKind::*;
        let args = || -> Args { new.iter().copied().collect() };
        match self {
            True
            | False
            | Var(_)
            | IntConst(_)
            | BitVecConst { .. }
            | FpLit { .. }
            | FpPlusZero { .. }
            | FpMinusZero { .. }
            | FpPlusInfinity { .. }
            | FpMinusInfinity { .. }
            | FpNaN { .. } => self.clone(),
            Not(_) => Not(new[0]),
            BvNot(_) => BvNot(new[0]),
            FpNeg(_) => FpNeg(new[0]),
            FpAbs(_) => FpAbs(new[0]),
            FpIsNaN(_) => FpIsNaN(new[0]),
            FpIsInfinite(_) => FpIsInfinite(new[0]),
            FpIsZero(_) => FpIsZero(new[0]),
            FpIsNormal(_) => FpIsNormal(new[0]),
            FpIsSubnormal(_) => FpIsSubnormal(new[0]),
            FpIsNegative(_) => FpIsNegative(new[0]),
            FpIsPositive(_) => FpIsPositive(new[0]),
            BvExtract { high, low, .. } => BvExtract {
                high: *high,
                low: *low,
                arg: new[0],
            },
            Implies(..) => Implies(new[0], new[1]),
            Xor(..) => Xor(new[0], new[1]),
            Eq(..) => Eq(new[0], new[1]),
            Le(..) => Le(new[0], new[1]),
            Lt(..) => Lt(new[0], new[1]),
            BvAnd(..) => BvAnd(new[0], new[1]),
            BvOr(..) => BvOr(new[0], new[1]),
            BvAdd(..) => BvAdd(new[0], new[1]),
            BvMul(..) => BvMul(new[0], new[1]),
            BvUlt(..) => BvUlt(new[0], new[1]),
            FpEq(..) => FpEq(new[0], new[1]),
            FpLt(..) => FpLt(new[0], new[1]),
            FpLeq(..) => FpLeq(new[0], new[1]),
            FpGt(..) => FpGt(new[0], new[1]),
            FpGeq(..) => FpGeq(new[0], new[1]),
            FpAdd(rm, ..) => FpAdd(*rm, new[0], new[1]),
            FpMul(rm, ..) => FpMul(*rm, new[0], new[1]),
            Ite(..) => Ite(new[0], new[1], new[2]),
            FpFromBits(..) => FpFromBits(new[0], new[1], new[2]),
            And(_) => And(args()),
            Or(_) => Or(args()),
            Distinct(_) => Distinct(args()),
            Add(_) => Add(args()),
            Mul(_) => Mul(args()),
            BvConcat(_) => BvConcat(args()),
            BvXor(_) => BvXor(args()),
            Apply { func, .. } => Apply {
                func: *func,
                args: args(),
            },
            Forall { vars, .. } => Forall {
                vars: vars.clone(),
                body: new[0],
                patterns: new[1..].iter().copied().collect(),
            },
            Exists { vars, .. } => Exists {
                vars: vars.clone(),
                body: new[0],
                patterns: new[1..].iter().copied().collect(),
            },
        }
    }

    /// Is this a quantifier?
    #[must_use]
    pub fn is_quantifier(&self) -> bool {
        matches!(self, TermKind::Forall { .. } | TermKind::Exists { .. })
    }

    /// Is this an interpreted value (numeral, Boolean constant, FP literal)?
    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            TermKind::True
                | TermKind::False
                | TermKind::IntConst(_)
                | TermKind::BitVecConst { .. }
                | TermKind::FpLit { .. }
                | TermKind::FpPlusZero { .. }
                | TermKind::FpMinusZero { .. }
                | TermKind::FpPlusInfinity { .. }
                | TermKind::FpMinusInfinity { .. }
                | TermKind::FpNaN { .. }
        )
    }
}

/// A node of the term graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// Handle of this term.
    pub id: TermId,
    /// Operator and children.
    pub kind: TermKind,
    /// Result sort.
    pub sort: SortId,
}

/// Owner of all terms and sorts.
#[derive(Debug)]
pub struct TermManager {
    terms: Vec<Term>,
    cache: FxHashMap<(TermKind, SortId), TermId>,
    names: Rodeo,
    fresh_counter: u32,
    true_id: TermId,
    false_id: TermId,
    cancel: CancellationFlag,
    /// Sort table.
    pub sorts: SortManager,
}

impl TermManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        let sorts = SortManager::new();
        let bool_sort = sorts.bool_sort;
        let mut tm = Self {
            terms: Vec::new(),
            cache: FxHashMap::default(),
            names: Rodeo::default(),
            fresh_counter: 0,
            true_id: TermId(0),
            false_id: TermId(0),
            cancel: CancellationFlag::new(),
            sorts,
        };
        tm.true_id = tm.mk_term(TermKind::True, bool_sort);
        tm.false_id = tm.mk_term(TermKind::False, bool_sort);
        tm
    }

    fn mk_term(&mut self, kind: TermKind, sort: SortId) -> TermId {
        let key = (kind, sort);
        if let Some(&id) = self.cache.get(&key) {
            return id;
        }
        let id = TermId(self.terms.len() as u32);
        self.terms.push(Term {
            id,
            kind: key.0.clone(),
            sort,
        });
        self.cache.insert(key, id);
        id
    }

    /// Look up a term.
    #[must_use]
    pub fn get(&self, id: TermId) -> Option<&Term> {
        self.terms.get(id.0 as usize)
    }

    /// Operator of a term owned by this manager.
    #[must_use]
    pub fn kind(&self, id: TermId) -> &TermKind {
        &self.terms[id.0 as usize].kind
    }

    /// Sort of a term owned by this manager.
    #[must_use]
    pub fn sort_of(&self, id: TermId) -> SortId {
        self.terms[id.0 as usize].sort
    }

    fn sort_ref(&self, id: TermId) -> &Sort {
        self.sorts
            .get(self.sort_of(id))
            .expect("term sort registered in this manager")
    }

    /// Number of terms created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Never true: `true` and `false` always exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Intern a symbol name.
    pub fn intern_str(&mut self, name: &str) -> Spur {
        self.names.get_or_intern(name)
    }

    /// Resolve an interned symbol.
    #[must_use]
    pub fn resolve_str(&self, name: Spur) -> &str {
        self.names.resolve(&name)
    }

    /// Name of a constant, if `id` is one.
    #[must_use]
    pub fn var_name(&self, id: TermId) -> Option<&str> {
        match self.kind(id) {
            TermKind::Var(name) => Some(self.resolve_str(*name)),
            _ => None,
        }
    }

    /// The cancellation flag polled by every pass working on this manager.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    /// `false` once cancellation was requested.
    #[must_use]
    pub fn inc(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    // ----- Booleans -------------------------------------------------------

    /// `true`.
    #[must_use]
    pub fn mk_true(&self) -> TermId {
        self.true_id
    }

    /// `false`.
    #[must_use]
    pub fn mk_false(&self) -> TermId {
        self.false_id
    }

    /// Boolean constant.
    #[must_use]
    pub fn mk_bool(&self, value: bool) -> TermId {
        if value { self.true_id } else { self.false_id }
    }

    /// Uninterpreted constant.
    pub fn mk_var(&mut self, name: &str, sort: SortId) -> TermId {
        let name = self.intern_str(name);
        self.mk_term(TermKind::Var(name), sort)
    }

    /// Constant whose name has never been interned before.
    pub fn mk_fresh_const(&mut self, prefix: &str, sort: SortId) -> TermId {
        loop {
            let name = format!("{prefix}!{}", self.fresh_counter);
            self.fresh_counter += 1;
            if !self.names.contains(&name) {
                return self.mk_var(&name, sort);
            }
        }
    }

    /// `(not a)`.
    pub fn mk_not(&mut self, a: TermId) -> TermId {
        let bool_sort = self.sorts.bool_sort;
        self.mk_term(TermKind::Not(a), bool_sort)
    }

    /// Conjunction; no argument gives `true`, one argument gives itself.
    pub fn mk_and(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let args: Args = args.into_iter().collect();
        match args.len() {
            0 => self.true_id,
            1 => args[0],
            _ => {
                let bool_sort = self.sorts.bool_sort;
                self.mk_term(TermKind::And(args), bool_sort)
            }
        }
    }

    /// Disjunction; no argument gives `false`, one argument gives itself.
    pub fn mk_or(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let args: Args = args.into_iter().collect();
        match args.len() {
            0 => self.false_id,
            1 => args[0],
            _ => {
                let bool_sort = self.sorts.bool_sort;
                self.mk_term(TermKind::Or(args), bool_sort)
            }
        }
    }

    /// `(=> a b)`.
    pub fn mk_implies(&mut self, a: TermId, b: TermId) -> TermId {
        let bool_sort = self.sorts.bool_sort;
        self.mk_term(TermKind::Implies(a, b), bool_sort)
    }

    /// `(xor a b)`.
    pub fn mk_xor(&mut self, a: TermId, b: TermId) -> TermId {
        let bool_sort = self.sorts.bool_sort;
        self.mk_term(TermKind::Xor(a, b), bool_sort)
    }

    /// `(= a b)`.
    pub fn mk_eq(&mut self, a: TermId, b: TermId) -> TermId {
        debug_assert_eq!(self.sort_of(a), self.sort_of(b), "mk_eq: sort mismatch");
        let bool_sort = self.sorts.bool_sort;
        self.mk_term(TermKind::Eq(a, b), bool_sort)
    }

    /// `(distinct args...)`.
    pub fn mk_distinct(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let bool_sort = self.sorts.bool_sort;
        let args: Args = args.into_iter().collect();
        self.mk_term(TermKind::Distinct(args), bool_sort)
    }

    /// `(ite c t e)`. Identical branches are kept as written.
    pub fn mk_ite(&mut self, c: TermId, t: TermId, e: TermId) -> TermId {
        debug_assert_eq!(self.sort_of(t), self.sort_of(e), "mk_ite: branch sorts");
        let sort = self.sort_of(t);
        self.mk_term(TermKind::Ite(c, t, e), sort)
    }

    // ----- Integers -------------------------------------------------------

    /// Integer numeral.
    pub fn mk_int(&mut self, value: impl Into<BigInt>) -> TermId {
        let int_sort = self.sorts.int_sort;
        self.mk_term(TermKind::IntConst(value.into()), int_sort)
    }

    /// Integer sum.
    pub fn mk_add(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let int_sort = self.sorts.int_sort;
        let args: Args = args.into_iter().collect();
        self.mk_term(TermKind::Add(args), int_sort)
    }

    /// Integer product.
    pub fn mk_mul(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let int_sort = self.sorts.int_sort;
        let args: Args = args.into_iter().collect();
        self.mk_term(TermKind::Mul(args), int_sort)
    }

    /// `(<= a b)`.
    pub fn mk_le(&mut self, a: TermId, b: TermId) -> TermId {
        let bool_sort = self.sorts.bool_sort;
        self.mk_term(TermKind::Le(a, b), bool_sort)
    }

    /// `(< a b)`.
    pub fn mk_lt(&mut self, a: TermId, b: TermId) -> TermId {
        let bool_sort = self.sorts.bool_sort;
        self.mk_term(TermKind::Lt(a, b), bool_sort)
    }

    // ----- Bit-vectors ----------------------------------------------------

    /// Bit-vector numeral; the value is reduced modulo `2^width`.
    pub fn mk_bitvec(&mut self, value: impl Into<BigInt>, width: u32) -> TermId {
        let modulus = BigInt::one() << width;
        let value = value.into().mod_floor(&modulus);
        let sort = self.sorts.bitvec(width);
        self.mk_term(TermKind::BitVecConst { value, width }, sort)
    }

    /// Concatenation (first argument is most significant). One argument gives itself.
    pub fn mk_concat(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let args: Args = args.into_iter().collect();
        assert!(!args.is_empty(), "mk_concat: no arguments");
        if args.len() == 1 {
            return args[0];
        }
        let width = args
            .iter()
            .map(|&a| self.bv_width(a).expect("mk_concat: bit-vector argument"))
            .sum();
        let sort = self.sorts.bitvec(width);
        self.mk_term(TermKind::BvConcat(args), sort)
    }

    /// `((_ extract high low) arg)`.
    pub fn mk_extract(&mut self, high: u32, low: u32, arg: TermId) -> TermId {
        let width = self.bv_width(arg).expect("mk_extract: bit-vector argument");
        assert!(
            low <= high && high < width,
            "mk_extract: [{high}:{low}] out of range for width {width}"
        );
        let sort = self.sorts.bitvec(high - low + 1);
        self.mk_term(TermKind::BvExtract { high, low, arg }, sort)
    }

    /// Bitwise not.
    pub fn mk_bv_not(&mut self, a: TermId) -> TermId {
        let sort = self.sort_of(a);
        self.mk_term(TermKind::BvNot(a), sort)
    }

    /// Bitwise and.
    pub fn mk_bv_and(&mut self, a: TermId, b: TermId) -> TermId {
        let sort = self.sort_of(a);
        self.mk_term(TermKind::BvAnd(a, b), sort)
    }

    /// Bitwise or.
    pub fn mk_bv_or(&mut self, a: TermId, b: TermId) -> TermId {
        let sort = self.sort_of(a);
        self.mk_term(TermKind::BvOr(a, b), sort)
    }

    /// Bitwise xor; one argument gives itself.
    pub fn mk_bv_xor(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let args: Args = args.into_iter().collect();
        assert!(!args.is_empty(), "mk_bv_xor: no arguments");
        if args.len() == 1 {
            return args[0];
        }
        let sort = self.sort_of(args[0]);
        self.mk_term(TermKind::BvXor(args), sort)
    }

    /// Modular addition.
    pub fn mk_bv_add(&mut self, a: TermId, b: TermId) -> TermId {
        let sort = self.sort_of(a);
        self.mk_term(TermKind::BvAdd(a, b), sort)
    }

    /// Modular multiplication.
    pub fn mk_bv_mul(&mut self, a: TermId, b: TermId) -> TermId {
        let sort = self.sort_of(a);
        self.mk_term(TermKind::BvMul(a, b), sort)
    }

    /// Unsigned less-than.
    pub fn mk_bv_ult(&mut self, a: TermId, b: TermId) -> TermId {
        let bool_sort = self.sorts.bool_sort;
        self.mk_term(TermKind::BvUlt(a, b), bool_sort)
    }

    // ----- Floating point -------------------------------------------------

    /// Floating-point literal from its IEEE fields.
    pub fn mk_fp_lit(
        &mut self,
        sign: bool,
        exp: impl Into<BigInt>,
        sig: impl Into<BigInt>,
        eb: u32,
        sb: u32,
    ) -> TermId {
        let sort = self.sorts.float(eb, sb);
        let kind = TermKind::FpLit {
            sign,
            exp: exp.into(),
            sig: sig.into(),
            eb,
            sb,
        };
        self.mk_term(kind, sort)
    }

    /// NaN of the given format.
    pub fn mk_fp_nan(&mut self, eb: u32, sb: u32) -> TermId {
        let sort = self.sorts.float(eb, sb);
        self.mk_term(TermKind::FpNaN { eb, sb }, sort)
    }

    /// Signed zero.
    pub fn mk_fp_zero(&mut self, negative: bool, eb: u32, sb: u32) -> TermId {
        let sort = self.sorts.float(eb, sb);
        let kind = if negative {
            TermKind::FpMinusZero { eb, sb }
        } else {
            TermKind::FpPlusZero { eb, sb }
        };
        self.mk_term(kind, sort)
    }

    /// Signed infinity.
    pub fn mk_fp_infinity(&mut self, negative: bool, eb: u32, sb: u32) -> TermId {
        let sort = self.sorts.float(eb, sb);
        let kind = if negative {
            TermKind::FpMinusInfinity { eb, sb }
        } else {
            TermKind::FpPlusInfinity { eb, sb }
        };
        self.mk_term(kind, sort)
    }

    /// `(fp sign exp sig)`; the format is read off the field widths.
    pub fn mk_fp(&mut self, sign: TermId, exp: TermId, sig: TermId) -> TermId {
        debug_assert_eq!(self.bv_width(sign), Some(1), "mk_fp: sign must be 1 bit");
        let eb = self.bv_width(exp).expect("mk_fp: exponent is a bit-vector");
        let sb = self.bv_width(sig).expect("mk_fp: significand is a bit-vector") + 1;
        let sort = self.sorts.float(eb, sb);
        self.mk_term(TermKind::FpFromBits(sign, exp, sig), sort)
    }

    /// `fp.neg`.
    pub fn mk_fp_neg(&mut self, a: TermId) -> TermId {
        let sort = self.sort_of(a);
        self.mk_term(TermKind::FpNeg(a), sort)
    }

    /// `fp.abs`.
    pub fn mk_fp_abs(&mut self, a: TermId) -> TermId {
        let sort = self.sort_of(a);
        self.mk_term(TermKind::FpAbs(a), sort)
    }

    /// `fp.add`.
    pub fn mk_fp_add(&mut self, rm: RoundingMode, a: TermId, b: TermId) -> TermId {
        let sort = self.sort_of(a);
        self.mk_term(TermKind::FpAdd(rm, a, b), sort)
    }

    /// `fp.mul`.
    pub fn mk_fp_mul(&mut self, rm: RoundingMode, a: TermId, b: TermId) -> TermId {
        let sort = self.sort_of(a);
        self.mk_term(TermKind::FpMul(rm, a, b), sort)
    }

    fn mk_fp_pred(&mut self, kind: TermKind) -> TermId {
        let bool_sort = self.sorts.bool_sort;
        self.mk_term(kind, bool_sort)
    }

    /// `fp.eq`.
    pub fn mk_fp_eq(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_fp_pred(TermKind::FpEq(a, b))
    }

    /// `fp.lt`.
    pub fn mk_fp_lt(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_fp_pred(TermKind::FpLt(a, b))
    }

    /// `fp.leq`.
    pub fn mk_fp_leq(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_fp_pred(TermKind::FpLeq(a, b))
    }

    /// `fp.gt`.
    pub fn mk_fp_gt(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_fp_pred(TermKind::FpGt(a, b))
    }

    /// `fp.geq`.
    pub fn mk_fp_geq(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_fp_pred(TermKind::FpGeq(a, b))
    }

    /// `fp.isNaN`.
    pub fn mk_fp_is_nan(&mut self, a: TermId) -> TermId {
        self.mk_fp_pred(TermKind::FpIsNaN(a))
    }

    /// `fp.isInfinite`.
    pub fn mk_fp_is_infinite(&mut self, a: TermId) -> TermId {
        self.mk_fp_pred(TermKind::FpIsInfinite(a))
    }

    /// `fp.isZero`.
    pub fn mk_fp_is_zero(&mut self, a: TermId) -> TermId {
        self.mk_fp_pred(TermKind::FpIsZero(a))
    }

    /// `fp.isNormal`.
    pub fn mk_fp_is_normal(&mut self, a: TermId) -> TermId {
        self.mk_fp_pred(TermKind::FpIsNormal(a))
    }

    /// `fp.isSubnormal`.
    pub fn mk_fp_is_subnormal(&mut self, a: TermId) -> TermId {
        self.mk_fp_pred(TermKind::FpIsSubnormal(a))
    }

    /// `fp.isNegative`.
    pub fn mk_fp_is_negative(&mut self, a: TermId) -> TermId {
        self.mk_fp_pred(TermKind::FpIsNegative(a))
    }

    /// `fp.isPositive`.
    pub fn mk_fp_is_positive(&mut self, a: TermId) -> TermId {
        self.mk_fp_pred(TermKind::FpIsPositive(a))
    }

    // ----- Uninterpreted functions and quantifiers ------------------------

    /// Application of the uninterpreted function `func` with result sort `sort`.
    pub fn mk_apply(
        &mut self,
        func: &str,
        args: impl IntoIterator<Item = TermId>,
        sort: SortId,
    ) -> TermId {
        let func = self.intern_str(func);
        let args: Args = args.into_iter().collect();
        self.mk_term(TermKind::Apply { func, args }, sort)
    }

    /// `(forall vars body)`.
    pub fn mk_forall(&mut self, vars: &[(&str, SortId)], body: TermId) -> TermId {
        self.mk_forall_with_patterns(vars, body, &[])
    }

    /// `(forall vars (! body :pattern ...))`.
    pub fn mk_forall_with_patterns(
        &mut self,
        vars: &[(&str, SortId)],
        body: TermId,
        patterns: &[TermId],
    ) -> TermId {
        let vars = vars
            .iter()
            .map(|&(name, sort)| (self.intern_str(name), sort))
            .collect();
        let bool_sort = self.sorts.bool_sort;
        let kind = TermKind::Forall {
            vars,
            body,
            patterns: patterns.iter().copied().collect(),
        };
        self.mk_term(kind, bool_sort)
    }

    /// `(exists vars body)`.
    pub fn mk_exists(&mut self, vars: &[(&str, SortId)], body: TermId) -> TermId {
        let vars = vars
            .iter()
            .map(|&(name, sort)| (self.intern_str(name), sort))
            .collect();
        let bool_sort = self.sorts.bool_sort;
        let kind = TermKind::Exists {
            vars,
            body,
            patterns: Args::new(),
        };
        self.mk_term(kind, bool_sort)
    }

    // ----- Queries --------------------------------------------------------

    /// Is `id` Boolean-sorted?
    #[must_use]
    pub fn is_bool(&self, id: TermId) -> bool {
        self.sort_of(id) == self.sorts.bool_sort
    }

    /// Is `id` the constant `true`?
    #[must_use]
    pub fn is_true(&self, id: TermId) -> bool {
        id == self.true_id
    }

    /// Is `id` the constant `false`?
    #[must_use]
    pub fn is_false(&self, id: TermId) -> bool {
        id == self.false_id
    }

    /// Width of a bit-vector term.
    #[must_use]
    pub fn bv_width(&self, id: TermId) -> Option<u32> {
        self.sort_ref(id).bitvec_width()
    }

    /// Format of a floating-point term.
    #[must_use]
    pub fn fp_format(&self, id: TermId) -> Option<(u32, u32)> {
        self.sort_ref(id).fp_format()
    }

    /// Is `sort` a bit-vector sort?
    #[must_use]
    pub fn is_bv_sort(&self, sort: SortId) -> bool {
        self.sorts
            .get(sort)
            .is_some_and(|s| matches!(s.kind, SortKind::BitVec(_)))
    }

    /// Decompose an if-then-else.
    #[must_use]
    pub fn is_ite(&self, id: TermId) -> Option<(TermId, TermId, TermId)> {
        match self.kind(id) {
            TermKind::Ite(c, t, e) => Some((*c, *t, *e)),
            _ => None,
        }
    }

    /// Is `id` an interpreted value?
    #[must_use]
    pub fn is_value(&self, id: TermId) -> bool {
        self.kind(id).is_value()
    }

    /// Is `id` an uninterpreted constant?
    #[must_use]
    pub fn is_const(&self, id: TermId) -> bool {
        matches!(self.kind(id), TermKind::Var(_))
    }

    /// Children of `id`.
    #[must_use]
    pub fn children(&self, id: TermId) -> Args {
        self.kind(id).children()
    }

    /// Rebuild `id` with new children of the same sorts. Unchanged children return `id`.
    pub fn update_children(&mut self, id: TermId, new: &[TermId]) -> TermId {
        let term = &self.terms[id.0 as usize];
        let old = term.kind.children();
        debug_assert_eq!(old.len(), new.len(), "update_children: arity");
        if old.as_slice() == new {
            return id;
        }
        let kind = term.kind.with_children(new);
        let sort = term.sort;
        self.mk_term(kind, sort)
    }

    /// Shallow equality oracle: identical terms, or two values that are equal.
    ///
    /// Hash-consing makes structurally equal terms identical, so this is a
    /// syntactic check and never calls a decision procedure.
    #[must_use]
    pub fn are_equal(&self, a: TermId, b: TermId) -> bool {
        a == b
    }

    /// Are `a` and `b` distinct values?
    #[must_use]
    pub fn are_distinct(&self, a: TermId, b: TermId) -> bool {
        a != b && self.is_value(a) && self.is_value(b) && self.sort_of(a) == self.sort_of(b)
    }

    /// Numeric value of a bit-vector numeral.
    #[must_use]
    pub fn bv_value(&self, id: TermId) -> Option<(&BigInt, u32)> {
        match self.kind(id) {
            TermKind::BitVecConst { value, width } => Some((value, *width)),
            _ => None,
        }
    }

    /// Is `id` the bit-vector numeral zero?
    #[must_use]
    pub fn is_bv_zero(&self, id: TermId) -> bool {
        self.bv_value(id).is_some_and(|(v, _)| v.is_zero())
    }

    /// Render a term in SMT-LIB syntax.
    #[must_use]
    pub fn display(&self, id: TermId) -> TermDisplay<'_> {
        TermDisplay::new(self, id)
    }
}

impl Default for TermManager {
    fn default() -> Self {
        Self::new()
    }
}

//! Evaluation of quantifier-free terms under a model.

use super::fp::FpBits;
use super::{Model, Value};
use crate::ast::{TermId, TermKind, TermManager};
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use rustc_hash::FxHashMap;

/// Memoizing evaluator over one model.
///
/// Unassigned constants take the default value of their sort, and function
/// applications without an interpretation do the same, so every
/// quantifier-free term has a value.
pub struct ModelEvaluator<'a> {
    tm: &'a TermManager,
    model: &'a Model,
    cache: FxHashMap<TermId, Value>,
}

fn fp_of(v: &Value) -> Option<FpBits> {
    v.as_fp()
}

fn fp_value(bits: FpBits) -> Value {
    Value::Fp {
        sign: bits.sign,
        exp: bits.exp,
        sig: bits.sig,
        eb: bits.eb,
        sb: bits.sb,
    }
}

fn bv(value: BigInt, width: u32) -> Value {
    let modulus = BigInt::one() << width;
    Value::BitVec {
        value: value.mod_floor(&modulus),
        width,
    }
}

impl<'a> ModelEvaluator<'a> {
    /// Evaluator for `model`.
    #[must_use]
    pub fn new(tm: &'a TermManager, model: &'a Model) -> Self {
        Self {
            tm,
            model,
            cache: FxHashMap::default(),
        }
    }

    /// One-shot evaluation.
    #[must_use]
    pub fn eval(tm: &TermManager, model: &Model, term: TermId) -> Option<Value> {
        ModelEvaluator::new(tm, model).evaluate(term)
    }

    /// One-shot Boolean evaluation.
    #[must_use]
    pub fn eval_bool(tm: &TermManager, model: &Model, term: TermId) -> Option<bool> {
        Self::eval(tm, model, term)?.as_bool()
    }

    /// Value of `term`, or `None` if it contains a quantifier or is ill-sorted.
    pub fn evaluate(&mut self, term: TermId) -> Option<Value> {
        let tm = self.tm;
        let mut stack = vec![(term, false)];
        while let Some((id, expanded)) = stack.pop() {
            if self.cache.contains_key(&id) {
                continue;
            }
            let kind = tm.kind(id);
            if kind.is_quantifier() {
                return None;
            }
            if !expanded {
                stack.push((id, true));
                for c in kind.children() {
                    if !self.cache.contains_key(&c) {
                        stack.push((c, false));
                    }
                }
                continue;
            }
            let args: Vec<Value> = kind
                .children()
                .iter()
                .map(|c| self.cache.get(c).cloned())
                .collect::<Option<_>>()?;
            let value = self.apply(id, &args)?;
            self.cache.insert(id, value);
        }
        self.cache.get(&term).cloned()
    }

    fn apply(&self, id: TermId, args: &[Value]) -> Option<Value> {
        use TermKind::*;
        let b = |i: usize| args[i].as_bool();
        let n = |i: usize| args[i].as_int();
        let v = |i: usize| args[i].as_bv().map(|(v, _)| v);
        let width = self.tm.bv_width(id);
        let value = match self.tm.kind(id) {
            True => Value::Bool(true),
            False => Value::Bool(false),
            Var(_) => self
                .model
                .get(id)
                .cloned()
                .unwrap_or_else(|| Value::default_for(self.tm, self.tm.sort_of(id))),
            IntConst(c) => Value::Int(c.clone()),
            BitVecConst { value, width } => bv(value.clone(), *width),
            FpLit {
                sign,
                exp,
                sig,
                eb,
                sb,
            } => Value::Fp {
                sign: *sign,
                exp: exp.clone(),
                sig: sig.clone(),
                eb: *eb,
                sb: *sb,
            },
            FpPlusZero { eb, sb } => fp_value(FpBits::zero(false, *eb, *sb)),
            FpMinusZero { eb, sb } => fp_value(FpBits::zero(true, *eb, *sb)),
            FpPlusInfinity { eb, sb } => fp_value(FpBits::infinity(false, *eb, *sb)),
            FpMinusInfinity { eb, sb } => fp_value(FpBits::infinity(true, *eb, *sb)),
            FpNaN { eb, sb } => fp_value(FpBits::nan(*eb, *sb)),

            Not(_) => Value::Bool(!b(0)?),
            And(_) => Value::Bool(
                args.iter()
                    .map(Value::as_bool)
                    .collect::<Option<Vec<_>>>()?
                    .into_iter()
                    .all(|x| x),
            ),
            Or(_) => Value::Bool(
                args.iter()
                    .map(Value::as_bool)
                    .collect::<Option<Vec<_>>>()?
                    .into_iter()
                    .any(|x| x),
            ),
            Implies(..) => Value::Bool(!b(0)? || b(1)?),
            Xor(..) => Value::Bool(b(0)? != b(1)?),
            Eq(..) => Value::Bool(args[0].smt_eq(&args[1])),
            Distinct(_) => {
                let mut all_distinct = true;
                for i in 0..args.len() {
                    for j in (i + 1)..args.len() {
                        if args[i].smt_eq(&args[j]) {
                            all_distinct = false;
                        }
                    }
                }
                Value::Bool(all_distinct)
            }
            Ite(..) => {
                if b(0)? {
                    args[1].clone()
                } else {
                    args[2].clone()
                }
            }

            Add(_) => {
                let mut sum = BigInt::zero();
                for i in 0..args.len() {
                    sum += n(i)?;
                }
                Value::Int(sum)
            }
            Mul(_) => {
                let mut prod = BigInt::one();
                for i in 0..args.len() {
                    prod *= n(i)?;
                }
                Value::Int(prod)
            }
            Le(..) => Value::Bool(n(0)? <= n(1)?),
            Lt(..) => Value::Bool(n(0)? < n(1)?),

            BvConcat(_) => {
                let mut acc = BigInt::zero();
                let mut total = 0;
                for arg in args {
                    let (value, w) = arg.as_bv()?;
                    acc = (acc << w) | value;
                    total += w;
                }
                bv(acc, total)
            }
            BvExtract { high, low, .. } => {
                let mask = (BigInt::one() << (high - low + 1)) - 1;
                bv((v(0)? >> *low) & mask, high - low + 1)
            }
            BvNot(_) => {
                let w = width?;
                bv(((BigInt::one() << w) - 1) - v(0)?, w)
            }
            BvAnd(..) => bv(v(0)? & v(1)?, width?),
            BvOr(..) => bv(v(0)? | v(1)?, width?),
            BvXor(_) => {
                let mut acc = BigInt::zero();
                for i in 0..args.len() {
                    acc ^= v(i)?;
                }
                bv(acc, width?)
            }
            BvAdd(..) => bv(v(0)? + v(1)?, width?),
            BvMul(..) => bv(v(0)? * v(1)?, width?),
            BvUlt(..) => Value::Bool(v(0)? < v(1)?),

            FpFromBits(..) => {
                let (s, _) = args[0].as_bv()?;
                let (exp, eb) = args[1].as_bv()?;
                let (sig, m) = args[2].as_bv()?;
                Value::Fp {
                    sign: s.is_one(),
                    exp: exp.clone(),
                    sig: sig.clone(),
                    eb,
                    sb: m + 1,
                }
            }
            FpNeg(_) => fp_value(fp_of(&args[0])?.neg()),
            FpAbs(_) => fp_value(fp_of(&args[0])?.abs()),
            FpAdd(rm, ..) => fp_value(fp_of(&args[0])?.add(*rm, &fp_of(&args[1])?)),
            FpMul(rm, ..) => fp_value(fp_of(&args[0])?.mul(*rm, &fp_of(&args[1])?)),
            FpEq(..) => Value::Bool(fp_of(&args[0])?.fp_eq(&fp_of(&args[1])?)),
            FpLt(..) => Value::Bool(fp_of(&args[0])?.fp_lt(&fp_of(&args[1])?)),
            FpLeq(..) => Value::Bool(fp_of(&args[0])?.fp_leq(&fp_of(&args[1])?)),
            FpGt(..) => Value::Bool(fp_of(&args[1])?.fp_lt(&fp_of(&args[0])?)),
            FpGeq(..) => Value::Bool(fp_of(&args[1])?.fp_leq(&fp_of(&args[0])?)),
            FpIsNaN(_) => Value::Bool(fp_of(&args[0])?.is_nan()),
            FpIsInfinite(_) => Value::Bool(fp_of(&args[0])?.is_infinite()),
            FpIsZero(_) => Value::Bool(fp_of(&args[0])?.is_zero()),
            FpIsNormal(_) => Value::Bool(fp_of(&args[0])?.is_normal()),
            FpIsSubnormal(_) => Value::Bool(fp_of(&args[0])?.is_subnormal()),
            FpIsNegative(_) => Value::Bool(fp_of(&args[0])?.is_negative()),
            FpIsPositive(_) => Value::Bool(fp_of(&args[0])?.is_positive()),

            Apply { func, .. } => self
                .model
                .func(*func)
                .and_then(|interp| interp.lookup(args))
                .cloned()
                .unwrap_or_else(|| Value::default_for(self.tm, self.tm.sort_of(id))),
            Forall { .. } | Exists { .. } => return None,
        };
        Some(value)
    }
}

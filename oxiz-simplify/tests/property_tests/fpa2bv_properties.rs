//! Property-based tests for floating-point lowering
//!
//! Tests:
//! - Lowered predicates agree with the original on random (3, 3) floats
//! - The trail rebuilds the original floats from their fields

use num_bigint::BigInt;
use oxiz_simplify::ast::{TermId, TermManager};
use oxiz_simplify::dependent::{DependentExprSet, DependentExprState};
use oxiz_simplify::model::{Model, ModelEvaluator, Value};
use oxiz_simplify::proof::Dependency;
use oxiz_simplify::simplifiers::{Fpa2Bv, Simplifier};
use proptest::prelude::*;

const EB: u32 = 3;
const SB: u32 = 3;

#[derive(Debug, Clone)]
enum FpExpr {
    Var(usize),
    Lit(bool, u8, u8),
    Neg(Box<FpExpr>),
    Abs(Box<FpExpr>),
    Ite(Box<FpExpr>, Box<FpExpr>),
}

#[derive(Debug, Clone, Copy)]
enum Pred {
    IsNan,
    IsInf,
    IsZero,
    IsNormal,
    IsSubnormal,
    IsNegative,
    IsPositive,
    Eq,
    SmtEq,
    Lt,
    Leq,
    Gt,
    Geq,
}

/// Raw fields of a (3, 3) float: sign, exponent in 0..8, significand in 0..4.
fn fp_bits() -> impl Strategy<Value = (bool, u8, u8)> {
    (any::<bool>(), 0u8..8, 0u8..4)
}

fn fp_expr() -> impl Strategy<Value = FpExpr> {
    let leaf = prop_oneof![
        (0..2usize).prop_map(FpExpr::Var),
        fp_bits().prop_map(|(s, e, m)| FpExpr::Lit(s, e, m)),
    ];
    leaf.prop_recursive(3, 12, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|a| FpExpr::Neg(a.into())),
            inner.clone().prop_map(|a| FpExpr::Abs(a.into())),
            (inner.clone(), inner).prop_map(|(a, b)| FpExpr::Ite(a.into(), b.into())),
        ]
    })
}

fn pred() -> impl Strategy<Value = Pred> {
    prop_oneof![
        Just(Pred::IsNan),
        Just(Pred::IsInf),
        Just(Pred::IsZero),
        Just(Pred::IsNormal),
        Just(Pred::IsSubnormal),
        Just(Pred::IsNegative),
        Just(Pred::IsPositive),
        Just(Pred::Eq),
        Just(Pred::SmtEq),
        Just(Pred::Lt),
        Just(Pred::Leq),
        Just(Pred::Gt),
        Just(Pred::Geq),
    ]
}

struct Symbols {
    xs: [TermId; 2],
    c: TermId,
    q: TermId,
}

fn build(tm: &mut TermManager, syms: &Symbols, e: &FpExpr) -> TermId {
    match e {
        FpExpr::Var(i) => syms.xs[*i],
        FpExpr::Lit(s, exp, sig) => tm.mk_fp_lit(*s, *exp, *sig, EB, SB),
        FpExpr::Neg(a) => {
            let a = build(tm, syms, a);
            tm.mk_fp_neg(a)
        }
        FpExpr::Abs(a) => {
            let a = build(tm, syms, a);
            tm.mk_fp_abs(a)
        }
        FpExpr::Ite(a, b) => {
            let (a, b) = (build(tm, syms, a), build(tm, syms, b));
            tm.mk_ite(syms.c, a, b)
        }
    }
}

fn mk_pred(tm: &mut TermManager, p: Pred, a: TermId, b: TermId) -> TermId {
    match p {
        Pred::IsNan => tm.mk_fp_is_nan(a),
        Pred::IsInf => tm.mk_fp_is_infinite(a),
        Pred::IsZero => tm.mk_fp_is_zero(a),
        Pred::IsNormal => tm.mk_fp_is_normal(a),
        Pred::IsSubnormal => tm.mk_fp_is_subnormal(a),
        Pred::IsNegative => tm.mk_fp_is_negative(a),
        Pred::IsPositive => tm.mk_fp_is_positive(a),
        Pred::Eq => tm.mk_fp_eq(a, b),
        Pred::SmtEq => tm.mk_eq(a, b),
        Pred::Lt => tm.mk_fp_lt(a, b),
        Pred::Leq => tm.mk_fp_leq(a, b),
        Pred::Gt => tm.mk_fp_gt(a, b),
        Pred::Geq => tm.mk_fp_geq(a, b),
    }
}

fn symbols(tm: &mut TermManager) -> Symbols {
    let fp = tm.sorts.float(EB, SB);
    let bool_sort = tm.sorts.bool_sort;
    Symbols {
        xs: [tm.mk_var("x0", fp), tm.mk_var("x1", fp)],
        c: tm.mk_var("c", bool_sort),
        q: tm.mk_var("q", bool_sort),
    }
}

fn bv(value: u8, width: u32) -> Value {
    Value::BitVec {
        value: BigInt::from(value),
        width,
    }
}

fn fp(v: (bool, u8, u8)) -> Value {
    Value::Fp {
        sign: v.0,
        exp: BigInt::from(v.1),
        sig: BigInt::from(v.2),
        eb: EB,
        sb: SB,
    }
}

/// Assign `v` to the fields the pass introduced for `x`, if any.
fn bind_fields(model: &mut Model, pass: &Fpa2Bv, x: TermId, v: (bool, u8, u8)) {
    if let Some(f) = pass.fields_of(x) {
        model.assign(f.sign, bv(u8::from(v.0), 1));
        model.assign(f.exp, bv(v.1, EB));
        model.assign(f.sig, bv(v.2, SB - 1));
    }
}

proptest! {
    /// The lowered formula has the same truth value as the original
    #[test]
    fn lowering_preserves_value(
        p in pred(),
        lhs in fp_expr(),
        rhs in fp_expr(),
        vals in proptest::collection::vec(fp_bits(), 2),
        c in any::<bool>(),
    ) {
        let mut tm = TermManager::new();
        let syms = symbols(&mut tm);
        let a = build(&mut tm, &syms, &lhs);
        let b = build(&mut tm, &syms, &rhs);
        let atom = mk_pred(&mut tm, p, a, b);
        // Keeps the entry from being a bare `fp.isNaN` of a constant.
        let fml = tm.mk_or([atom, syms.q]);

        let mut state = DependentExprSet::new(&tm, false);
        state.assert_expr(fml, Dependency::leaf(0));
        let mut pass = Fpa2Bv::new();
        pass.run(&mut tm, &mut state);
        prop_assert_eq!(pass.stats().unsupported, 0);

        let mut original = Model::new();
        let mut lowered = Model::new();
        for (&x, &v) in syms.xs.iter().zip(&vals) {
            original.assign(x, fp(v));
            bind_fields(&mut lowered, &pass, x, v);
        }
        for m in [&mut original, &mut lowered] {
            m.assign(syms.c, Value::Bool(c));
            m.assign(syms.q, Value::Bool(false));
        }
        prop_assert_eq!(
            ModelEvaluator::eval_bool(&tm, &original, fml),
            ModelEvaluator::eval_bool(&tm, &lowered, state.get(0).fml)
        );
    }

    /// Replaying the trail over a model of the fields restores each float
    #[test]
    fn trail_rebuilds_floats(vals in proptest::collection::vec(fp_bits(), 2)) {
        let mut tm = TermManager::new();
        let syms = symbols(&mut tm);
        let fml = tm.mk_fp_lt(syms.xs[0], syms.xs[1]);

        let mut state = DependentExprSet::new(&tm, false);
        state.assert_expr(fml, Dependency::leaf(0));
        let mut pass = Fpa2Bv::new();
        pass.run(&mut tm, &mut state);

        let mut model = Model::new();
        for (&x, &v) in syms.xs.iter().zip(&vals) {
            bind_fields(&mut model, &pass, x, v);
        }
        state.model_trail().apply(&tm, &mut model);
        for (&x, &v) in syms.xs.iter().zip(&vals) {
            let f = pass.fields_of(x);
            prop_assert!(f.is_some());
            prop_assert_eq!(model.get(x), Some(&fp(v)));
            if let Some(f) = f {
                prop_assert!(!model.contains(f.sign));
                prop_assert!(!model.contains(f.exp));
                prop_assert!(!model.contains(f.sig));
            }
        }
    }
}

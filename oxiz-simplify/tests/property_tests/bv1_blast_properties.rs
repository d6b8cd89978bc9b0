//! Property-based tests for 1-bit blasting
//!
//! Tests:
//! - Equivalence of blasted formulas over random 4-bit inputs
//! - Model reconstruction through the trail
//! - Idempotence

use num_bigint::BigInt;
use oxiz_simplify::ast::{TermId, TermManager};
use oxiz_simplify::dependent::{DependentExprSet, DependentExprState};
use oxiz_simplify::model::{Model, ModelEvaluator, Value};
use oxiz_simplify::proof::Dependency;
use oxiz_simplify::simplifiers::{Bv1Blast, Simplifier};
use proptest::prelude::*;

const WIDTH: u32 = 4;
const NUM_VARS: usize = 3;

/// Shape of a random 4-bit term.
#[derive(Debug, Clone)]
enum BvExpr {
    Var(usize),
    Num(u8),
    Xor(Box<BvExpr>, Box<BvExpr>),
    /// `(concat ((_ extract 1 0) a) ((_ extract 3 2) a))`
    Swap(Box<BvExpr>),
    /// `(concat ((_ extract 3 2) a) ((_ extract 1 0) b))`
    Mix(Box<BvExpr>, Box<BvExpr>),
    Ite(usize, Box<BvExpr>, Box<BvExpr>),
    IteEq(Box<BvExpr>, Box<BvExpr>, Box<BvExpr>, Box<BvExpr>),
    Add(Box<BvExpr>, Box<BvExpr>),
}

fn bv_expr() -> impl Strategy<Value = BvExpr> {
    let leaf = prop_oneof![
        (0..NUM_VARS).prop_map(BvExpr::Var),
        (0u8..16).prop_map(BvExpr::Num),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| BvExpr::Xor(a.into(), b.into())),
            inner.clone().prop_map(|a| BvExpr::Swap(a.into())),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| BvExpr::Mix(a.into(), b.into())),
            (0..2usize, inner.clone(), inner.clone())
                .prop_map(|(c, a, b)| BvExpr::Ite(c, a.into(), b.into())),
            (inner.clone(), inner.clone(), inner.clone(), inner.clone()).prop_map(
                |(a, b, t, e)| BvExpr::IteEq(a.into(), b.into(), t.into(), e.into())
            ),
            (inner.clone(), inner).prop_map(|(a, b)| BvExpr::Add(a.into(), b.into())),
        ]
    })
}

struct Symbols {
    xs: Vec<TermId>,
    ps: Vec<TermId>,
}

impl Symbols {
    fn new(tm: &mut TermManager) -> Self {
        let bv = tm.sorts.bitvec(WIDTH);
        let bool_sort = tm.sorts.bool_sort;
        Self {
            xs: (0..NUM_VARS)
                .map(|i| tm.mk_var(&format!("x{i}"), bv))
                .collect(),
            ps: (0..2).map(|i| tm.mk_var(&format!("p{i}"), bool_sort)).collect(),
        }
    }
}

fn build(tm: &mut TermManager, syms: &Symbols, e: &BvExpr) -> TermId {
    match e {
        BvExpr::Var(i) => syms.xs[*i],
        BvExpr::Num(v) => tm.mk_bitvec(*v, WIDTH),
        BvExpr::Xor(a, b) => {
            let (a, b) = (build(tm, syms, a), build(tm, syms, b));
            tm.mk_bv_xor([a, b])
        }
        BvExpr::Swap(a) => {
            let a = build(tm, syms, a);
            let lo = tm.mk_extract(1, 0, a);
            let hi = tm.mk_extract(3, 2, a);
            tm.mk_concat([lo, hi])
        }
        BvExpr::Mix(a, b) => {
            let (a, b) = (build(tm, syms, a), build(tm, syms, b));
            let hi = tm.mk_extract(3, 2, a);
            let lo = tm.mk_extract(1, 0, b);
            tm.mk_concat([hi, lo])
        }
        BvExpr::Ite(c, a, b) => {
            let (a, b) = (build(tm, syms, a), build(tm, syms, b));
            tm.mk_ite(syms.ps[*c], a, b)
        }
        BvExpr::IteEq(a, b, t, e) => {
            let (a, b) = (build(tm, syms, a), build(tm, syms, b));
            let (t, e) = (build(tm, syms, t), build(tm, syms, e));
            let c = tm.mk_eq(a, b);
            tm.mk_ite(c, t, e)
        }
        BvExpr::Add(a, b) => {
            let (a, b) = (build(tm, syms, a), build(tm, syms, b));
            tm.mk_bv_add(a, b)
        }
    }
}

fn original_model(syms: &Symbols, xs: &[u8], ps: &[bool]) -> Model {
    let mut model = Model::new();
    for (&x, &v) in syms.xs.iter().zip(xs) {
        model.assign(
            x,
            Value::BitVec {
                value: BigInt::from(v),
                width: WIDTH,
            },
        );
    }
    for (&p, &b) in syms.ps.iter().zip(ps) {
        model.assign(p, Value::Bool(b));
    }
    model
}

/// The same assignment expressed over the fresh bits.
fn bit_model(pass: &Bv1Blast, syms: &Symbols, xs: &[u8], ps: &[bool]) -> Model {
    let mut model = Model::new();
    for (&x, &v) in syms.xs.iter().zip(xs) {
        let Some(bits) = pass.bits_of(x) else {
            continue;
        };
        let n = bits.len();
        for (k, &b) in bits.iter().enumerate() {
            let bit = (v >> (n - 1 - k)) & 1;
            model.assign(
                b,
                Value::BitVec {
                    value: BigInt::from(bit),
                    width: 1,
                },
            );
        }
    }
    for (&p, &b) in syms.ps.iter().zip(ps) {
        model.assign(p, Value::Bool(b));
    }
    model
}

fn blast(tm: &mut TermManager, fml: TermId) -> (DependentExprSet, Bv1Blast) {
    let mut state = DependentExprSet::new(tm, false);
    state.assert_expr(fml, Dependency::leaf(0));
    let mut pass = Bv1Blast::new();
    pass.run(tm, &mut state);
    (state, pass)
}

proptest! {
    /// Blasting preserves the truth value under every input assignment
    #[test]
    fn blast_preserves_value(
        lhs in bv_expr(),
        rhs in bv_expr(),
        xs in proptest::collection::vec(0u8..16, NUM_VARS),
        ps in proptest::collection::vec(any::<bool>(), 2),
    ) {
        let mut tm = TermManager::new();
        let syms = Symbols::new(&mut tm);
        let l = build(&mut tm, &syms, &lhs);
        let r = build(&mut tm, &syms, &rhs);
        let fml = tm.mk_eq(l, r);
        let (state, pass) = blast(&mut tm, fml);
        prop_assert_eq!(state.len(), 1);

        let before = ModelEvaluator::eval_bool(&tm, &original_model(&syms, &xs, &ps), fml);
        let after = ModelEvaluator::eval_bool(
            &tm,
            &bit_model(&pass, &syms, &xs, &ps),
            state.get(0).fml,
        );
        prop_assert_eq!(before, after);
    }

    /// The trail maps a model of the bits back to the original constants
    #[test]
    fn trail_reconstructs_constants(
        e in bv_expr(),
        xs in proptest::collection::vec(0u8..16, NUM_VARS),
    ) {
        let mut tm = TermManager::new();
        let syms = Symbols::new(&mut tm);
        let t = build(&mut tm, &syms, &e);
        let zero = tm.mk_bitvec(0, WIDTH);
        let fml = tm.mk_eq(t, zero);
        let (state, pass) = blast(&mut tm, fml);

        let ps = [false, false];
        let mut model = bit_model(&pass, &syms, &xs, &ps);
        state.model_trail().apply(&tm, &mut model);
        for (&x, &v) in syms.xs.iter().zip(&xs) {
            if let Some(bits) = pass.bits_of(x) {
                prop_assert!(bits.iter().all(|&b| !model.contains(b)));
                prop_assert_eq!(
                    model.get(x),
                    Some(&Value::BitVec { value: BigInt::from(v), width: WIDTH })
                );
            }
        }
    }

    /// A second run over the blasted formula changes nothing
    #[test]
    fn blast_is_idempotent(lhs in bv_expr(), rhs in bv_expr()) {
        let mut tm = TermManager::new();
        let syms = Symbols::new(&mut tm);
        let l = build(&mut tm, &syms, &lhs);
        let r = build(&mut tm, &syms, &rhs);
        let fml = tm.mk_eq(l, r);
        let (mut state, mut pass) = blast(&mut tm, fml);
        let once = state.get(0).fml;
        let trail_len = state.model_trail().len();
        pass.run(&mut tm, &mut state);
        prop_assert_eq!(state.get(0).fml, once);
        prop_assert_eq!(state.model_trail().len(), trail_len);
    }
}

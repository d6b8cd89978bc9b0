//! Property-based tests for term-ite hoisting
//!
//! Tests:
//! - Equivalence for random integer formulas with and without an inflation bound
//! - The free function agrees with the pass

use num_bigint::BigInt;
use oxiz_simplify::ast::{TermId, TermManager};
use oxiz_simplify::dependent::{DependentExprSet, DependentExprState};
use oxiz_simplify::model::{Model, ModelEvaluator, Value};
use oxiz_simplify::params::{MAX_INFLATION, Params};
use oxiz_simplify::proof::Dependency;
use oxiz_simplify::simplifiers::{BlastTermIte, Simplifier, blast_term_ite};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum IntExpr {
    Var(usize),
    Num(i8),
    Ite(usize, Box<IntExpr>, Box<IntExpr>),
    Add(Box<IntExpr>, Box<IntExpr>),
    Mul(Box<IntExpr>, Box<IntExpr>),
}

fn int_expr() -> impl Strategy<Value = IntExpr> {
    let leaf = prop_oneof![
        (0..3usize).prop_map(IntExpr::Var),
        any::<i8>().prop_map(IntExpr::Num),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            (0..3usize, inner.clone(), inner.clone())
                .prop_map(|(c, a, b)| IntExpr::Ite(c, a.into(), b.into())),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| IntExpr::Add(a.into(), b.into())),
            (inner.clone(), inner).prop_map(|(a, b)| IntExpr::Mul(a.into(), b.into())),
        ]
    })
}

fn build(tm: &mut TermManager, xs: &[TermId], cs: &[TermId], e: &IntExpr) -> TermId {
    match e {
        IntExpr::Var(i) => xs[*i],
        IntExpr::Num(n) => tm.mk_int(*n),
        IntExpr::Ite(c, a, b) => {
            let (a, b) = (build(tm, xs, cs, a), build(tm, xs, cs, b));
            tm.mk_ite(cs[*c], a, b)
        }
        IntExpr::Add(a, b) => {
            let (a, b) = (build(tm, xs, cs, a), build(tm, xs, cs, b));
            tm.mk_add([a, b])
        }
        IntExpr::Mul(a, b) => {
            let (a, b) = (build(tm, xs, cs, a), build(tm, xs, cs, b));
            tm.mk_mul([a, b])
        }
    }
}

struct Input {
    tm: TermManager,
    xs: Vec<TermId>,
    cs: Vec<TermId>,
    fml: TermId,
}

fn input(lhs: &IntExpr, rhs: &IntExpr) -> Input {
    let mut tm = TermManager::new();
    let int_sort = tm.sorts.int_sort;
    let bool_sort = tm.sorts.bool_sort;
    let xs: Vec<TermId> = (0..3).map(|i| tm.mk_var(&format!("x{i}"), int_sort)).collect();
    let cs: Vec<TermId> = (0..3).map(|i| tm.mk_var(&format!("c{i}"), bool_sort)).collect();
    let l = build(&mut tm, &xs, &cs, lhs);
    let r = build(&mut tm, &xs, &cs, rhs);
    let fml = tm.mk_le(l, r);
    Input { tm, xs, cs, fml }
}

fn model(input: &Input, xs: &[i8], cs: &[bool]) -> Model {
    let mut m = Model::new();
    for (&x, &v) in input.xs.iter().zip(xs) {
        m.assign(x, Value::Int(BigInt::from(v)));
    }
    for (&c, &b) in input.cs.iter().zip(cs) {
        m.assign(c, Value::Bool(b));
    }
    m
}

proptest! {
    /// Hoisting preserves the truth value
    #[test]
    fn hoisting_preserves_value(
        lhs in int_expr(),
        rhs in int_expr(),
        inflation in prop_oneof![Just(u64::MAX), 0u64..4],
        xs in proptest::collection::vec(any::<i8>(), 3),
        cs in proptest::collection::vec(any::<bool>(), 3),
    ) {
        let mut input = input(&lhs, &rhs);
        let mut state = DependentExprSet::new(&input.tm, false);
        state.assert_expr(input.fml, Dependency::leaf(0));
        let mut pass = BlastTermIte::new();
        let mut params = Params::new();
        params.set_uint(MAX_INFLATION, inflation);
        pass.configure(&params);
        pass.run(&mut input.tm, &mut state);

        let m = model(&input, &xs, &cs);
        prop_assert_eq!(
            ModelEvaluator::eval_bool(&input.tm, &m, input.fml),
            ModelEvaluator::eval_bool(&input.tm, &m, state.get(0).fml)
        );
    }

    /// The free function agrees with the pass
    #[test]
    fn free_function_preserves_value(
        lhs in int_expr(),
        rhs in int_expr(),
        inflation in prop_oneof![Just(u64::MAX), 0u64..4],
        xs in proptest::collection::vec(any::<i8>(), 3),
        cs in proptest::collection::vec(any::<bool>(), 3),
    ) {
        let mut input = input(&lhs, &rhs);
        let out = blast_term_ite(&mut input.tm, input.fml, inflation);
        let m = model(&input, &xs, &cs);
        prop_assert_eq!(
            ModelEvaluator::eval_bool(&input.tm, &m, input.fml),
            ModelEvaluator::eval_bool(&input.tm, &m, out)
        );
    }
}

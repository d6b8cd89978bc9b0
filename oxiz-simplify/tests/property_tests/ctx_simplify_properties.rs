//! Property-based tests for contextual simplification
//!
//! Tests:
//! - The simplified formula is equivalent to the input on every assignment
//! - Solver scopes are balanced after each call
//! - The propositional solver agrees with brute-force evaluation

use oxiz_simplify::ast::{TermId, TermManager};
use oxiz_simplify::model::{Model, ModelEvaluator, Value};
use oxiz_simplify::sat::{ContextSolver, PropSolver, SatResult};
use oxiz_simplify::simplifiers::CtxSolverSimplify;
use proptest::prelude::*;

const NUM_VARS: usize = 3;

#[derive(Debug, Clone)]
enum BoolExpr {
    Var(usize),
    Const(bool),
    Not(Box<BoolExpr>),
    And(Vec<BoolExpr>),
    Or(Vec<BoolExpr>),
    Implies(Box<BoolExpr>, Box<BoolExpr>),
    Xor(Box<BoolExpr>, Box<BoolExpr>),
    Iff(Box<BoolExpr>, Box<BoolExpr>),
    Ite(Box<BoolExpr>, Box<BoolExpr>, Box<BoolExpr>),
}

fn bool_expr() -> impl Strategy<Value = BoolExpr> {
    let leaf = prop_oneof![
        4 => (0..NUM_VARS).prop_map(BoolExpr::Var),
        1 => any::<bool>().prop_map(BoolExpr::Const),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(|a| BoolExpr::Not(a.into())),
            proptest::collection::vec(inner.clone(), 2..4).prop_map(BoolExpr::And),
            proptest::collection::vec(inner.clone(), 2..4).prop_map(BoolExpr::Or),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| BoolExpr::Implies(a.into(), b.into())),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| BoolExpr::Xor(a.into(), b.into())),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| BoolExpr::Iff(a.into(), b.into())),
            (inner.clone(), inner.clone(), inner)
                .prop_map(|(c, t, e)| BoolExpr::Ite(c.into(), t.into(), e.into())),
        ]
    })
}

fn build(tm: &mut TermManager, vars: &[TermId], e: &BoolExpr) -> TermId {
    match e {
        BoolExpr::Var(i) => vars[*i],
        BoolExpr::Const(b) => tm.mk_bool(*b),
        BoolExpr::Not(a) => {
            let a = build(tm, vars, a);
            tm.mk_not(a)
        }
        BoolExpr::And(args) => {
            let args: Vec<TermId> = args.iter().map(|a| build(tm, vars, a)).collect();
            tm.mk_and(args)
        }
        BoolExpr::Or(args) => {
            let args: Vec<TermId> = args.iter().map(|a| build(tm, vars, a)).collect();
            tm.mk_or(args)
        }
        BoolExpr::Implies(a, b) => {
            let (a, b) = (build(tm, vars, a), build(tm, vars, b));
            tm.mk_implies(a, b)
        }
        BoolExpr::Xor(a, b) => {
            let (a, b) = (build(tm, vars, a), build(tm, vars, b));
            tm.mk_xor(a, b)
        }
        BoolExpr::Iff(a, b) => {
            let (a, b) = (build(tm, vars, a), build(tm, vars, b));
            tm.mk_eq(a, b)
        }
        BoolExpr::Ite(c, t, e) => {
            let (c, t, e) = (build(tm, vars, c), build(tm, vars, t), build(tm, vars, e));
            tm.mk_ite(c, t, e)
        }
    }
}

fn setup(e: &BoolExpr) -> (TermManager, Vec<TermId>, TermId) {
    let mut tm = TermManager::new();
    let bool_sort = tm.sorts.bool_sort;
    let vars: Vec<TermId> = (0..NUM_VARS)
        .map(|i| tm.mk_var(&format!("p{i}"), bool_sort))
        .collect();
    let fml = build(&mut tm, &vars, e);
    (tm, vars, fml)
}

/// Truth value of `fml` under each of the eight assignments.
fn truth_table(tm: &TermManager, vars: &[TermId], fml: TermId) -> Vec<Option<bool>> {
    (0..1u32 << NUM_VARS)
        .map(|bits| {
            let mut m = Model::new();
            for (k, &v) in vars.iter().enumerate() {
                m.assign(v, Value::Bool((bits >> k) & 1 == 1));
            }
            ModelEvaluator::eval_bool(tm, &m, fml)
        })
        .collect()
}

proptest! {
    /// Simplification never changes the Boolean function
    #[test]
    fn simplify_preserves_equivalence(e in bool_expr()) {
        let (mut tm, vars, fml) = setup(&e);
        let mut ctx = CtxSolverSimplify::new();
        let out = ctx.simplify(&mut tm, fml);
        prop_assert!(out.is_some());
        if let Some(out) = out {
            prop_assert_eq!(truth_table(&tm, &vars, fml), truth_table(&tm, &vars, out));
        }
        prop_assert_eq!(ctx.solver().scope_level(), 0);
    }

    /// Tautologies collapse to true and contradictions to false
    #[test]
    fn constant_functions_collapse(e in bool_expr()) {
        let (mut tm, vars, fml) = setup(&e);
        let table = truth_table(&tm, &vars, fml);
        let mut ctx = CtxSolverSimplify::new();
        let out = ctx.simplify(&mut tm, fml);
        if table.iter().all(|v| *v == Some(true)) {
            prop_assert_eq!(out, Some(tm.mk_true()));
        }
        if table.iter().all(|v| *v == Some(false)) {
            prop_assert_eq!(out, Some(tm.mk_false()));
        }
    }

    /// The solver's answer matches exhaustive evaluation
    #[test]
    fn solver_matches_brute_force(e in bool_expr()) {
        let (tm, vars, fml) = setup(&e);
        let satisfiable = truth_table(&tm, &vars, fml).contains(&Some(true));
        let mut solver = PropSolver::new();
        solver.assert_expr(&tm, fml);
        let expected = if satisfiable { SatResult::Sat } else { SatResult::Unsat };
        prop_assert_eq!(solver.check(&tm), expected);
    }
}

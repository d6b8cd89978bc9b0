//! Property-based tests for scoped formula sets
//!
//! Tests:
//! - Popping a scope restores entries, trail and queue head
//! - Inconsistency is undone by pop

use oxiz_simplify::ast::{TermId, TermManager};
use oxiz_simplify::dependent::{DependentExpr, DependentExprSet, DependentExprState};
use oxiz_simplify::proof::Dependency;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Push,
    Pop(usize),
    Assert(usize),
    Update(usize, usize),
    Define(usize),
    AdvanceQhead,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Push),
        2 => (1..3usize).prop_map(Op::Pop),
        4 => (0..5usize).prop_map(Op::Assert),
        3 => (0..8usize, 0..5usize).prop_map(|(i, k)| Op::Update(i, k)),
        1 => (0..5usize).prop_map(Op::Define),
        1 => Just(Op::AdvanceQhead),
    ]
}

/// Everything a scope has to restore.
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    fmls: Vec<TermId>,
    trail_len: usize,
    qhead: usize,
    inconsistent: bool,
}

fn snapshot(state: &DependentExprSet) -> Snapshot {
    Snapshot {
        fmls: state.formulas().collect(),
        trail_len: state.model_trail().len(),
        qhead: state.qhead(),
        inconsistent: state.is_inconsistent(),
    }
}

/// Four Boolean atoms plus `false`.
fn atoms(tm: &mut TermManager) -> Vec<TermId> {
    let bool_sort = tm.sorts.bool_sort;
    let mut out: Vec<TermId> = (0..4)
        .map(|i| tm.mk_var(&format!("a{i}"), bool_sort))
        .collect();
    out.push(tm.mk_false());
    out
}

proptest! {
    /// Each pop returns to the snapshot taken at the matching push
    #[test]
    fn pop_restores_snapshot(ops in proptest::collection::vec(op(), 1..40)) {
        let mut tm = TermManager::new();
        let atoms = atoms(&mut tm);
        let mut state = DependentExprSet::new(&tm, false);
        let mut saved: Vec<Snapshot> = Vec::new();

        for op in ops {
            match op {
                Op::Push => {
                    saved.push(snapshot(&state));
                    state.push();
                }
                Op::Pop(n) => {
                    let n = n.min(saved.len());
                    if n == 0 {
                        continue;
                    }
                    let target = saved[saved.len() - n].clone();
                    saved.truncate(saved.len() - n);
                    state.pop(n);
                    prop_assert_eq!(snapshot(&state), target);
                }
                Op::Assert(k) => {
                    state.assert_expr(atoms[k], Dependency::leaf(k as u32));
                }
                Op::Update(i, k) => {
                    if i < state.len() {
                        state.update(i, DependentExpr::new(atoms[k], Dependency::leaf(k as u32)));
                    }
                }
                Op::Define(k) => {
                    let sym = atoms[k % 4];
                    state.model_trail_mut().push(sym, atoms[4], Dependency::empty());
                }
                Op::AdvanceQhead => state.advance_qhead(),
            }
            prop_assert_eq!(state.scope_level(), saved.len());
        }

        if let Some(first) = saved.first().cloned() {
            let n = saved.len();
            state.pop(n);
            prop_assert_eq!(snapshot(&state), first);
            prop_assert_eq!(state.scope_level(), 0);
        }
    }

    /// A set that became inconsistent stops offering entries to passes
    #[test]
    fn inconsistent_set_offers_nothing(ks in proptest::collection::vec(0..5usize, 1..10)) {
        let mut tm = TermManager::new();
        let atoms = atoms(&mut tm);
        let mut state = DependentExprSet::new(&tm, false);
        for &k in &ks {
            state.assert_expr(atoms[k], Dependency::leaf(k as u32));
        }
        let has_false = ks.contains(&4);
        prop_assert_eq!(state.is_inconsistent(), has_false);
        prop_assert_eq!(state.indices().is_empty(), has_false);
    }
}

//! Constructors that apply local Boolean simplification.
//!
//! The plain `mk_*` constructors on [`TermManager`] never simplify. The
//! functions here fold constants, drop duplicates and detect complementary
//! literals, which is what passes want when they rebuild a node whose children
//! changed.

use super::{Args, TermId, TermKind, TermManager};
use rustc_hash::FxHashSet;

/// `(not a)`, folding constants and double negation.
pub fn mk_not(tm: &mut TermManager, a: TermId) -> TermId {
    if tm.is_true(a) {
        return tm.mk_false();
    }
    if tm.is_false(a) {
        return tm.mk_true();
    }
    if let TermKind::Not(inner) = tm.kind(a) {
        return *inner;
    }
    tm.mk_not(a)
}

fn complement_of(tm: &TermManager, a: TermId) -> Option<TermId> {
    match tm.kind(a) {
        TermKind::Not(inner) => Some(*inner),
        _ => None,
    }
}

/// Shared body of `and`/`or`: `unit` is the neutral constant, `zero` the absorbing one.
fn mk_junction(tm: &mut TermManager, args: &[TermId], is_and: bool) -> TermId {
    let (unit, zero) = if is_and {
        (tm.mk_true(), tm.mk_false())
    } else {
        (tm.mk_false(), tm.mk_true())
    };
    let mut seen = FxHashSet::default();
    let mut out = Args::new();
    for &a in args {
        if a == zero {
            return zero;
        }
        if a == unit || !seen.insert(a) {
            continue;
        }
        out.push(a);
    }
    for &a in &out {
        if complement_of(tm, a).is_some_and(|c| seen.contains(&c)) {
            return zero;
        }
    }
    if is_and { tm.mk_and(out) } else { tm.mk_or(out) }
}

/// Conjunction with constant folding, deduplication and `x ∧ ¬x` detection.
pub fn mk_and(tm: &mut TermManager, args: &[TermId]) -> TermId {
    mk_junction(tm, args, true)
}

/// Disjunction with constant folding, deduplication and `x ∨ ¬x` detection.
pub fn mk_or(tm: &mut TermManager, args: &[TermId]) -> TermId {
    mk_junction(tm, args, false)
}

/// Equality with constant folding.
pub fn mk_eq(tm: &mut TermManager, a: TermId, b: TermId) -> TermId {
    if a == b {
        return tm.mk_true();
    }
    if tm.are_distinct(a, b) {
        return tm.mk_false();
    }
    if tm.is_bool(a) {
        if tm.is_true(a) {
            return b;
        }
        if tm.is_true(b) {
            return a;
        }
        if tm.is_false(a) {
            return mk_not(tm, b);
        }
        if tm.is_false(b) {
            return mk_not(tm, a);
        }
    }
    tm.mk_eq(a, b)
}

/// If-then-else with constant conditions and equal branches folded.
pub fn mk_ite(tm: &mut TermManager, c: TermId, t: TermId, e: TermId) -> TermId {
    if tm.is_true(c) || t == e {
        return t;
    }
    if tm.is_false(c) {
        return e;
    }
    if tm.is_true(t) && tm.is_false(e) {
        return c;
    }
    if tm.is_false(t) && tm.is_true(e) {
        return mk_not(tm, c);
    }
    tm.mk_ite(c, t, e)
}

/// Rebuild `original` with `args` as its children, simplifying Boolean connectives.
///
/// Operators without a local rule are rebuilt unchanged.
pub fn mk_simplified_app(tm: &mut TermManager, original: TermId, args: &[TermId]) -> TermId {
    match tm.kind(original).clone() {
        TermKind::Not(_) => mk_not(tm, args[0]),
        TermKind::And(_) => mk_and(tm, args),
        TermKind::Or(_) => mk_or(tm, args),
        TermKind::Implies(..) => {
            let na = mk_not(tm, args[0]);
            mk_or(tm, &[na, args[1]])
        }
        TermKind::Xor(..) => {
            let (a, b) = (args[0], args[1]);
            if a == b {
                return tm.mk_false();
            }
            if tm.is_false(a) {
                return b;
            }
            if tm.is_false(b) {
                return a;
            }
            if tm.is_true(a) {
                return mk_not(tm, b);
            }
            if tm.is_true(b) {
                return mk_not(tm, a);
            }
            tm.mk_xor(a, b)
        }
        TermKind::Eq(..) => mk_eq(tm, args[0], args[1]),
        TermKind::Ite(..) => mk_ite(tm, args[0], args[1], args[2]),
        _ => tm.update_children(original, args),
    }
}

//! SMT-LIB rendering of terms.

use super::{RoundingMode, TermId, TermKind, TermManager};
use crate::sort::{SortId, SortKind};
use num_bigint::BigInt;
use std::fmt;

/// Display adapter returned by [`TermManager::display`].
pub struct TermDisplay<'a> {
    tm: &'a TermManager,
    id: TermId,
}

impl<'a> TermDisplay<'a> {
    pub(super) fn new(tm: &'a TermManager, id: TermId) -> Self {
        Self { tm, id }
    }
}

fn write_bits(f: &mut fmt::Formatter<'_>, value: &BigInt, width: u32) -> fmt::Result {
    write!(f, "#b{:0>width$}", value.to_str_radix(2), width = width as usize)
}

fn rounding_mode_name(rm: RoundingMode) -> &'static str {
    match rm {
        RoundingMode::RNE => "RNE",
        RoundingMode::RNA => "RNA",
        RoundingMode::RTP => "RTP",
        RoundingMode::RTN => "RTN",
        RoundingMode::RTZ => "RTZ",
    }
}

fn write_sort(f: &mut fmt::Formatter<'_>, tm: &TermManager, sort: SortId) -> fmt::Result {
    match tm.sorts.get(sort).map(|s| &s.kind) {
        Some(SortKind::Bool) => write!(f, "Bool"),
        Some(SortKind::Int) => write!(f, "Int"),
        Some(SortKind::BitVec(w)) => write!(f, "(_ BitVec {w})"),
        Some(SortKind::FloatingPoint { eb, sb }) => write!(f, "(_ FloatingPoint {eb} {sb})"),
        Some(SortKind::Uninterpreted(name)) => write!(f, "{}", tm.resolve_str(*name)),
        None => write!(f, "?sort{}", sort.0),
    }
}

fn write_term(f: &mut fmt::Formatter<'_>, tm: &TermManager, id: TermId) -> fmt::Result {
    use TermKind::*;
    let app = |f: &mut fmt::Formatter<'_>, op: &str, args: &[TermId]| -> fmt::Result {
        write!(f, "({op}")?;
        for &a in args {
            write!(f, " ")?;
            write_term(f, tm, a)?;
        }
        write!(f, ")")
    };
    let Some(term) = tm.get(id) else {
        return write!(f, "?t{}", id.0);
    };
    match &term.kind {
        True => write!(f, "true"),
        False => write!(f, "false"),
        Var(name) => write!(f, "{}", tm.resolve_str(*name)),
        IntConst(n) if n.sign() == num_bigint::Sign::Minus => write!(f, "(- {})", -n),
        IntConst(n) => write!(f, "{n}"),
        BitVecConst { value, width } => write_bits(f, value, *width),
        FpLit {
            sign,
            exp,
            sig,
            eb,
            sb,
        } => {
            write!(f, "(fp #b{} ", u8::from(*sign))?;
            write_bits(f, exp, *eb)?;
            write!(f, " ")?;
            write_bits(f, sig, sb - 1)?;
            write!(f, ")")
        }
        FpPlusZero { eb, sb } => write!(f, "(_ +zero {eb} {sb})"),
        FpMinusZero { eb, sb } => write!(f, "(_ -zero {eb} {sb})"),
        FpPlusInfinity { eb, sb } => write!(f, "(_ +oo {eb} {sb})"),
        FpMinusInfinity { eb, sb } => write!(f, "(_ -oo {eb} {sb})"),
        FpNaN { eb, sb } => write!(f, "(_ NaN {eb} {sb})"),
        Not(a) => app(f, "not", &[*a]),
        And(args) => app(f, "and", args),
        Or(args) => app(f, "or", args),
        Implies(a, b) => app(f, "=>", &[*a, *b]),
        Xor(a, b) => app(f, "xor", &[*a, *b]),
        Eq(a, b) => app(f, "=", &[*a, *b]),
        Distinct(args) => app(f, "distinct", args),
        Ite(c, t, e) => app(f, "ite", &[*c, *t, *e]),
        Add(args) => app(f, "+", args),
        Mul(args) => app(f, "*", args),
        Le(a, b) => app(f, "<=", &[*a, *b]),
        Lt(a, b) => app(f, "<", &[*a, *b]),
        BvConcat(args) => app(f, "concat", args),
        BvExtract { high, low, arg } => app(f, &format!("(_ extract {high} {low})"), &[*arg]),
        BvNot(a) => app(f, "bvnot", &[*a]),
        BvAnd(a, b) => app(f, "bvand", &[*a, *b]),
        BvOr(a, b) => app(f, "bvor", &[*a, *b]),
        BvXor(args) => app(f, "bvxor", args),
        BvAdd(a, b) => app(f, "bvadd", &[*a, *b]),
        BvMul(a, b) => app(f, "bvmul", &[*a, *b]),
        BvUlt(a, b) => app(f, "bvult", &[*a, *b]),
        FpFromBits(s, e, m) => app(f, "fp", &[*s, *e, *m]),
        FpNeg(a) => app(f, "fp.neg", &[*a]),
        FpAbs(a) => app(f, "fp.abs", &[*a]),
        FpAdd(rm, a, b) => {
            write!(f, "(fp.add {} ", rounding_mode_name(*rm))?;
            write_term(f, tm, *a)?;
            write!(f, " ")?;
            write_term(f, tm, *b)?;
            write!(f, ")")
        }
        FpMul(rm, a, b) => {
            write!(f, "(fp.mul {} ", rounding_mode_name(*rm))?;
            write_term(f, tm, *a)?;
            write!(f, " ")?;
            write_term(f, tm, *b)?;
            write!(f, ")")
        }
        FpEq(a, b) => app(f, "fp.eq", &[*a, *b]),
        FpLt(a, b) => app(f, "fp.lt", &[*a, *b]),
        FpLeq(a, b) => app(f, "fp.leq", &[*a, *b]),
        FpGt(a, b) => app(f, "fp.gt", &[*a, *b]),
        FpGeq(a, b) => app(f, "fp.geq", &[*a, *b]),
        FpIsNaN(a) => app(f, "fp.isNaN", &[*a]),
        FpIsInfinite(a) => app(f, "fp.isInfinite", &[*a]),
        FpIsZero(a) => app(f, "fp.isZero", &[*a]),
        FpIsNormal(a) => app(f, "fp.isNormal", &[*a]),
        FpIsSubnormal(a) => app(f, "fp.isSubnormal", &[*a]),
        FpIsNegative(a) => app(f, "fp.isNegative", &[*a]),
        FpIsPositive(a) => app(f, "fp.isPositive", &[*a]),
        Apply { func, args } if args.is_empty() => write!(f, "{}", tm.resolve_str(*func)),
        Apply { func, args } => app(f, tm.resolve_str(*func), args),
        Forall {
            vars,
            body,
            patterns,
        }
        | Exists {
            vars,
            body,
            patterns,
        } => {
            let binder = if matches!(term.kind, Forall { .. }) {
                "forall"
            } else {
                "exists"
            };
            write!(f, "({binder} (")?;
            for (i, (name, sort)) in vars.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "({} ", tm.resolve_str(*name))?;
                write_sort(f, tm, *sort)?;
                write!(f, ")")?;
            }
            write!(f, ") ")?;
            if patterns.is_empty() {
                write_term(f, tm, *body)?;
            } else {
                write!(f, "(! ")?;
                write_term(f, tm, *body)?;
                write!(f, " :pattern (")?;
                for (i, &p) in patterns.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write_term(f, tm, p)?;
                }
                write!(f, "))")?;
            }
            write!(f, ")")
        }
    }
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(f, self.tm, self.id)
    }
}

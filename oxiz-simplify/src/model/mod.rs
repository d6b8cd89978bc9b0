//! Models: assignments of values to uninterpreted symbols.
//!
//! Passes never build models themselves. They record how to reconstruct the
//! values of symbols they eliminated in a [`ModelTrail`], which is replayed
//! over the model a solver returns for the simplified formulas.

pub mod eval;
pub mod fp;
pub mod trail;

pub use eval::ModelEvaluator;
pub use fp::FpBits;
pub use trail::{ModelTrail, TrailEntry};

use crate::ast::{TermId, TermManager};
use crate::sort::{SortId, SortKind};
use lasso::Spur;
use num_bigint::BigInt;
use num_traits::Zero;
use rustc_hash::FxHashMap;
use std::fmt;

/// A concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(BigInt),
    /// Bit-vector, `0 <= value < 2^width`.
    BitVec {
        /// Unsigned value.
        value: BigInt,
        /// Width.
        width: u32,
    },
    /// Floating point given by its IEEE fields.
    Fp {
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
    /// Element of an uninterpreted sort.
    Uninterpreted {
        /// The sort.
        sort: SortId,
        /// Index of the element.
        index: u32,
    },
}

impl Value {
    /// Default inhabitant of `sort`: false, zero, +zero, or the first element.
    #[must_use]
    pub fn default_for(tm: &TermManager, sort: SortId) -> Value {
        match tm.sorts.get(sort).map(|s| &s.kind) {
            Some(SortKind::Bool) | None => Value::Bool(false),
            Some(SortKind::Int) => Value::Int(BigInt::zero()),
            Some(SortKind::BitVec(w)) => Value::BitVec {
                value: BigInt::zero(),
                width: *w,
            },
            Some(SortKind::FloatingPoint { eb, sb }) => Value::Fp {
                sign: false,
                exp: BigInt::zero(),
                sig: BigInt::zero(),
                eb: *eb,
                sb: *sb,
            },
            Some(SortKind::Uninterpreted(_)) => Value::Uninterpreted { sort, index: 0 },
        }
    }

    /// Boolean payload.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Bit-vector payload.
    #[must_use]
    pub fn as_bv(&self) -> Option<(&BigInt, u32)> {
        match self {
            Value::BitVec { value, width } => Some((value, *width)),
            _ => None,
        }
    }

    /// Integer payload.
    #[must_use]
    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }

    /// Floating-point payload as raw fields.
    #[must_use]
    pub fn as_fp(&self) -> Option<FpBits> {
        match self {
            Value::Fp {
                sign,
                exp,
                sig,
                eb,
                sb,
            } => Some(FpBits {
                sign: *sign,
                exp: exp.clone(),
                sig: sig.clone(),
                eb: *eb,
                sb: *sb,
            }),
            _ => None,
        }
    }

    /// SMT-LIB `=`: there is a single NaN, everything else is compared as is.
    #[must_use]
    pub fn smt_eq(&self, other: &Value) -> bool {
        match (self.as_fp(), other.as_fp()) {
            (Some(x), Some(y)) => x.smt_eq(&y),
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::BitVec { value, width } => {
                write!(f, "#b{:0>w$}", value.to_str_radix(2), w = *width as usize)
            }
            Value::Fp {
                sign,
                exp,
                sig,
                eb,
                sb,
            } => write!(
                f,
                "(fp #b{} #b{:0>e$} #b{:0>m$})",
                u8::from(*sign),
                exp.to_str_radix(2),
                sig.to_str_radix(2),
                e = *eb as usize,
                m = (*sb - 1) as usize
            ),
            Value::Uninterpreted { sort, index } => write!(f, "@uc{}!{index}", sort.0),
        }
    }
}

/// Finite interpretation of an uninterpreted function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuncInterp {
    /// Explicit argument tuples.
    pub entries: Vec<(Vec<Value>, Value)>,
    /// Value for every other tuple; the sort default when `None`.
    pub default: Option<Value>,
}

impl FuncInterp {
    /// Value at `args`, if the interpretation fixes it. NaN arguments match
    /// any NaN key.
    #[must_use]
    pub fn lookup(&self, args: &[Value]) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| {
                key.len() == args.len() && key.iter().zip(args).all(|(k, a)| k.smt_eq(a))
            })
            .map(|(_, v)| v)
            .or(self.default.as_ref())
    }
}

/// Assignment of uninterpreted constants and functions.
///
/// Constants are keyed by their term, so two constants with the same name but
/// different sorts are distinct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    consts: FxHashMap<TermId, Value>,
    funcs: FxHashMap<Spur, FuncInterp>,
}

impl Model {
    /// Empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a constant.
    pub fn assign(&mut self, sym: TermId, value: Value) {
        self.consts.insert(sym, value);
    }

    /// Value of a constant.
    #[must_use]
    pub fn get(&self, sym: TermId) -> Option<&Value> {
        self.consts.get(&sym)
    }

    /// Drop a constant.
    pub fn remove(&mut self, sym: TermId) -> Option<Value> {
        self.consts.remove(&sym)
    }

    /// Is the constant bound?
    #[must_use]
    pub fn contains(&self, sym: TermId) -> bool {
        self.consts.contains_key(&sym)
    }

    /// Interpret a function symbol.
    pub fn set_func(&mut self, func: Spur, interp: FuncInterp) {
        self.funcs.insert(func, interp);
    }

    /// Interpretation of a function symbol.
    #[must_use]
    pub fn func(&self, func: Spur) -> Option<&FuncInterp> {
        self.funcs.get(&func)
    }

    /// Bound constants in id order.
    #[must_use]
    pub fn constants(&self) -> Vec<TermId> {
        let mut out: Vec<TermId> = self.consts.keys().copied().collect();
        out.sort_unstable();
        out
    }

    /// Number of bound constants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.consts.len()
    }

    /// No constant bound?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consts.is_empty()
    }

    /// Render as `name -> value` lines.
    #[must_use]
    pub fn display(&self, tm: &TermManager) -> String {
        let mut out = String::new();
        for sym in self.constants() {
            if let Some(v) = self.get(sym) {
                out.push_str(&format!("{} -> {v}\n", tm.display(sym)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let mut tm = TermManager::new();
        let bv4 = tm.sorts.bitvec(4);
        let f16 = tm.sorts.float(5, 11);
        assert_eq!(Value::default_for(&tm, tm.sorts.bool_sort), Value::Bool(false));
        assert_eq!(
            Value::default_for(&tm, bv4),
            Value::BitVec {
                value: BigInt::zero(),
                width: 4
            }
        );
        assert!(matches!(
            Value::default_for(&tm, f16),
            Value::Fp { eb: 5, sb: 11, .. }
        ));
    }

    #[test]
    fn test_model_display() {
        let mut tm = TermManager::new();
        let bv4 = tm.sorts.bitvec(4);
        let x = tm.mk_var("x", bv4);
        let mut model = Model::new();
        model.assign(
            x,
            Value::BitVec {
                value: BigInt::from(5),
                width: 4,
            },
        );
        assert_eq!(model.display(&tm), "x -> #b0101\n");
        model.remove(x);
        assert!(model.is_empty());
    }

    #[test]
    fn test_func_lookup_default() {
        let interp = FuncInterp {
            entries: vec![(vec![Value::Bool(true)], Value::Int(BigInt::from(1)))],
            default: Some(Value::Int(BigInt::from(7))),
        };
        assert_eq!(
            interp.lookup(&[Value::Bool(true)]),
            Some(&Value::Int(BigInt::from(1)))
        );
        assert_eq!(
            interp.lookup(&[Value::Bool(false)]),
            Some(&Value::Int(BigInt::from(7)))
        );
    }

    #[test]
    fn test_func_lookup_nan_payloads() {
        let nan = |sig: u8| Value::Fp {
            sign: false,
            exp: BigInt::from(7),
            sig: BigInt::from(sig),
            eb: 3,
            sb: 3,
        };
        let interp = FuncInterp {
            entries: vec![(vec![nan(1)], Value::Int(BigInt::from(1)))],
            default: Some(Value::Int(BigInt::from(0))),
        };
        assert!(nan(2).smt_eq(&nan(3)));
        assert_eq!(interp.lookup(&[nan(2)]), interp.lookup(&[nan(1)]));
        assert_eq!(interp.lookup(&[nan(3)]), Some(&Value::Int(BigInt::from(1))));
        // +inf is not a NaN
        let inf = Value::Fp {
            sign: false,
            exp: BigInt::from(7),
            sig: BigInt::zero(),
            eb: 3,
            sb: 3,
        };
        assert_eq!(interp.lookup(&[inf]), Some(&Value::Int(BigInt::from(0))));
    }
}

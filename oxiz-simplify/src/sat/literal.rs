//! Propositional variables and literals of the embedded solver.

use std::fmt;
use std::ops::Not;

/// A propositional variable index.
pub type Var = u32;

/// A signed variable: `var << 1 | negated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit(u32);

impl Lit {
    /// Literal of `var` with the given polarity.
    #[must_use]
    pub const fn new(var: Var, negated: bool) -> Self {
        Self((var << 1) | negated as u32)
    }

    /// `var`.
    #[must_use]
    pub const fn positive(var: Var) -> Self {
        Self::new(var, false)
    }

    /// `¬var`.
    #[must_use]
    pub const fn negative(var: Var) -> Self {
        Self::new(var, true)
    }

    /// Underlying variable.
    #[must_use]
    pub const fn var(self) -> Var {
        self.0 >> 1
    }

    /// Is this `¬var`?
    #[must_use]
    pub const fn is_negative(self) -> bool {
        (self.0 & 1) != 0
    }

    /// Truth value of the literal under `value` for its variable.
    #[must_use]
    pub const fn eval(self, value: bool) -> bool {
        value != self.is_negative()
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit(self.0 ^ 1)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-{}", self.var())
        } else {
            write!(f, "{}", self.var())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity() {
        let p = Lit::positive(5);
        let n = Lit::negative(5);
        assert_eq!(p.var(), 5);
        assert_eq!(n.var(), 5);
        assert!(!p.is_negative());
        assert!(n.is_negative());
        assert_eq!(!p, n);
        assert_eq!(!!p, p);
    }

    #[test]
    fn test_eval_and_display() {
        let n = Lit::negative(3);
        assert!(n.eval(false));
        assert!(!n.eval(true));
        assert_eq!(n.to_string(), "-3");
        assert_eq!(Lit::positive(3).to_string(), "3");
    }
}

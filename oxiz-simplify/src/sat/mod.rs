//! Embedded decision procedure used by the context simplifier.
//!
//! [`ContextSolver`] is the incremental interface the simplifier talks to;
//! [`PropSolver`] is the bundled implementation. Every scope a caller opens
//! should go through a [`ScopedSolver`] so an early return cannot leave the
//! assumption stack unbalanced.

pub mod literal;
pub mod prop;

pub use literal::{Lit, Var};
pub use prop::{PropSolver, PropSolverStats};

use crate::ast::{TermId, TermManager};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Three-valued answer of a satisfiability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatResult {
    /// The assertions have a model.
    Sat,
    /// The assertions are contradictory.
    Unsat,
    /// Gave up: budget exhausted or cancelled.
    Unknown,
}

impl fmt::Display for SatResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SatResult::Sat => write!(f, "sat"),
            SatResult::Unsat => write!(f, "unsat"),
            SatResult::Unknown => write!(f, "unknown"),
        }
    }
}

/// Incremental solver with scoped assertions.
pub trait ContextSolver {
    /// Open a scope.
    fn push(&mut self);

    /// Close `n` scopes, dropping their assertions.
    fn pop(&mut self, n: usize);

    /// Assert a Boolean formula in the current scope.
    fn assert_expr(&mut self, tm: &TermManager, fml: TermId);

    /// Check the current assertions.
    fn check(&mut self, tm: &TermManager) -> SatResult;

    /// Value of `t` in the model of the last `Sat` answer.
    fn value(&self, t: TermId) -> Option<bool>;

    /// Number of open scopes.
    fn scope_level(&self) -> usize;
}

/// Guard that opens a scope and closes every scope opened since, on drop.
pub struct ScopedSolver<'a, S: ContextSolver + ?Sized> {
    solver: &'a mut S,
    level: usize,
}

impl<'a, S: ContextSolver + ?Sized> ScopedSolver<'a, S> {
    /// Push a scope on `solver`.
    pub fn new(solver: &'a mut S) -> Self {
        let level = solver.scope_level();
        solver.push();
        Self { solver, level }
    }
}

impl<S: ContextSolver + ?Sized> Deref for ScopedSolver<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.solver
    }
}

impl<S: ContextSolver + ?Sized> DerefMut for ScopedSolver<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.solver
    }
}

impl<S: ContextSolver + ?Sized> Drop for ScopedSolver<'_, S> {
    fn drop(&mut self) {
        let opened = self.solver.scope_level().saturating_sub(self.level);
        if opened > 0 {
            self.solver.pop(opened);
        }
    }
}

//! OxiZ Simplify - Formula Simplification Passes
//!
//! This crate provides preprocessing passes that rewrite a set of formulas
//! into an equisatisfiable set that is easier for a downstream solver:
//! - A generic, budgeted bottom-up [`rewriter`] engine
//! - Bit-vector blasting to 1-bit slices ([`simplifiers::Bv1Blast`])
//! - Hoisting of term-level if-then-else ([`simplifiers::BlastTermIte`])
//! - Floating-point to bit-vector lowering ([`simplifiers::Fpa2Bv`])
//! - Contextual simplification with an embedded solver
//!   ([`simplifiers::CtxSolverSimplify`])
//!
//! Passes work on a [`DependentExprSet`]: formulas tagged with the assertions
//! they depend on, optional proofs, and a model trail that maps models of
//! the simplified set back to the original symbols.
//!
//! # Examples
//!
//! ```
//! use oxiz_simplify::ast::TermManager;
//! use oxiz_simplify::dependent::{DependentExprSet, DependentExprState};
//! use oxiz_simplify::params::Params;
//! use oxiz_simplify::proof::Dependency;
//! use oxiz_simplify::simplifiers::{Simplifier, SimplifierSequence};
//!
//! let mut tm = TermManager::new();
//! let bv4 = tm.sorts.bitvec(4);
//! let x = tm.mk_var("x", bv4);
//! let y = tm.mk_var("y", bv4);
//! let hi = tm.mk_extract(3, 2, x);
//! let lo = tm.mk_extract(1, 0, y);
//! let eq = tm.mk_eq(hi, lo);
//!
//! let mut state = DependentExprSet::new(&tm, false);
//! state.assert_expr(eq, Dependency::leaf(0));
//!
//! let mut passes = SimplifierSequence::from_names(&["bv1-blast"], &Params::new()).unwrap();
//! passes.run(&mut tm, &mut state);
//! assert_ne!(state.get(0).fml, eq);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod dependent;
pub mod error;
pub mod model;
pub mod params;
pub mod proof;
pub mod resource;
pub mod rewriter;
pub mod sat;
pub mod simplifiers;
pub mod sort;
pub mod statistics;

pub use ast::{Term, TermId, TermKind, TermManager};
pub use dependent::{DependentExpr, DependentExprSet, DependentExprState};
pub use error::{OxizError, Result};
pub use model::{Model, ModelEvaluator, ModelTrail, Value};
pub use params::{ParamDescrs, Params};
pub use proof::{Dependency, Proof};
pub use rewriter::{Budget, ReduceResult, Rewriter, RewriterConfig, RewriterError};
pub use simplifiers::{Simplifier, SimplifierKind, SimplifierSequence};
pub use sort::{SortId, SortKind};
pub use statistics::Statistics;

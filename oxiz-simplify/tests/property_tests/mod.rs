//! Property-based tests for oxiz-simplify
//!
//! Every pass is checked against the model evaluator: the simplified formula
//! must take the same truth value as the input under random assignments of
//! the input symbols (translated to the fresh symbols through the pass's
//! symbol table where needed).

mod blast_term_ite_properties;
mod bv1_blast_properties;
mod ctx_simplify_properties;
mod dependent_properties;
mod fpa2bv_properties;

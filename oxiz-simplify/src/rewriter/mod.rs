//! Generic bottom-up rewriting engine.
//!
//! A [`Rewriter`] walks a term children-first and asks its
//! [`RewriterConfig`] to reduce every node once the node's children have been
//! rewritten. The configuration answers with a [`ReduceResult`]:
//!
//! * `Failed`: no rule applies; the node is rebuilt over the new children.
//! * `Done(r)`: `r` is final.
//! * `Rewrite(r, k)`: `r` is rewritten again, `k` levels deep. Children of a
//!   depth-bounded visit are visited with `k - 1`, and a depth of zero returns
//!   the term untouched.
//!
//! Unbounded visits are memoized for the duration of one top-level call.
//! Every visit is a step: the configuration's step predicate, the memory
//! ceiling and the manager's cancellation flag are all checked there, and any
//! of them aborts the whole call with a [`RewriterError`].

use crate::ast::{Args, TermId, TermKind, TermManager};
use crate::params::{MAX_MEMORY, MAX_STEPS, ParamDescrs, Params};
use crate::proof::Proof;
use crate::resource::MemoryUsage;
use rustc_hash::FxHashMap;
use smallvec::smallvec;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Number of steps between two memory checks.
const MEMORY_CHECK_INTERVAL: u64 = 1024;

/// Why a rewrite was abandoned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriterError {
    /// The configuration's step budget ran out.
    #[error("step budget exhausted after {steps} steps")]
    MaxSteps {
        /// Steps taken when the budget check failed.
        steps: u64,
    },
    /// Resident memory went over the configured ceiling.
    #[error("memory budget exhausted: {used} bytes in use, limit {limit}")]
    MaxMemory {
        /// Bytes in use.
        used: u64,
        /// Configured limit.
        limit: u64,
    },
    /// Cancellation was requested on the term manager.
    #[error("rewrite canceled")]
    Canceled,
}

/// Outcome of reducing one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceResult {
    /// No rule applies.
    Failed,
    /// Final result.
    Done(TermId),
    /// Result that needs `k` more levels of rewriting.
    Rewrite(TermId, u32),
}

/// Reduction rules and policies plugged into a [`Rewriter`].
pub trait RewriterConfig {
    /// Reduce `term` whose children have been rewritten to `args`.
    ///
    /// `tm.kind(term)` still has the original children; `args` lines up with
    /// them position by position.
    fn reduce_app(&mut self, tm: &mut TermManager, term: TermId, args: &[TermId]) -> ReduceResult;

    /// Reduce a quantifier whose body (and patterns) were rewritten.
    /// Only called when [`Self::rewrite_quantifiers`] is true.
    fn reduce_quantifier(
        &mut self,
        _tm: &mut TermManager,
        _term: TermId,
        _body: TermId,
        _patterns: &[TermId],
    ) -> Option<TermId> {
        None
    }

    /// Descend into quantifier bodies?
    fn rewrite_quantifiers(&self) -> bool {
        false
    }

    /// Rewrite quantifier patterns along with the body?
    fn rewrite_patterns(&self) -> bool {
        true
    }

    /// Has the step budget run out after `steps` steps?
    fn max_steps_exceeded(&self, _steps: u64) -> bool {
        false
    }

    /// Memory ceiling in bytes; [`u64::MAX`] disables the check.
    fn max_memory(&self) -> u64 {
        u64::MAX
    }
}

/// Step and memory limits shared by the configurations in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    /// Maximum number of steps.
    pub max_steps: u64,
    /// Maximum resident memory in bytes.
    pub max_memory: u64,
}

impl Default for Budget {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl Budget {
    /// No limit at all.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_steps: u64::MAX,
            max_memory: u64::MAX,
        }
    }

    /// Read `max_steps` and `max_memory`.
    #[must_use]
    pub fn from_params(params: &Params) -> Self {
        Self {
            max_steps: params.get_uint(MAX_STEPS, u64::MAX),
            max_memory: params.get_uint(MAX_MEMORY, u64::MAX),
        }
    }

    /// Declare `max_steps` and `max_memory`.
    pub fn collect_param_descrs(descrs: &mut ParamDescrs) {
        descrs.insert_max_steps();
        descrs.insert_max_memory();
    }
}

/// Result of a successful top-level rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutput {
    /// The rewritten term.
    pub term: TermId,
    /// `from = to` proof, in proof mode and only if the term changed.
    pub proof: Option<Arc<Proof>>,
}

#[derive(Debug)]
struct Frame {
    term: TermId,
    /// Remaining depth; `None` for an unbounded (cacheable) visit.
    budget: Option<u32>,
    children: Args,
    next: usize,
    /// Unbounded term whose rewrite this frame finishes.
    cache_as: Option<TermId>,
}

/// Rewriting engine over a configuration.
#[derive(Debug)]
pub struct Rewriter<C> {
    cfg: C,
    cache: FxHashMap<TermId, TermId>,
    steps: u64,
    total_steps: u64,
    proofs: bool,
}

impl<C: RewriterConfig> Rewriter<C> {
    /// Engine without proof production.
    pub fn new(cfg: C) -> Self {
        Self {
            cfg,
            cache: FxHashMap::default(),
            steps: 0,
            total_steps: 0,
            proofs: false,
        }
    }

    /// Turn proof production on or off.
    pub fn set_proofs(&mut self, proofs: bool) {
        self.proofs = proofs;
    }

    /// The configuration.
    pub fn cfg(&self) -> &C {
        &self.cfg
    }

    /// The configuration, mutably.
    pub fn cfg_mut(&mut self) -> &mut C {
        &mut self.cfg
    }

    /// Consume the engine.
    pub fn into_cfg(self) -> C {
        self.cfg
    }

    /// Steps taken by the last call.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Steps taken since construction.
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Drop the memo table.
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    /// Rewrite `t`. On error the memo table is cleared and `t` should be kept.
    pub fn rewrite(
        &mut self,
        tm: &mut TermManager,
        t: TermId,
    ) -> Result<RewriteOutput, RewriterError> {
        self.cache.clear();
        self.steps = 0;
        let outcome = self.main_loop(tm, t);
        self.total_steps = self.total_steps.saturating_add(self.steps);
        match outcome {
            Ok(term) => {
                let proof = (self.proofs && term != t).then(|| Proof::rewrite(t, term));
                Ok(RewriteOutput { term, proof })
            }
            Err(err) => {
                trace!(steps = self.steps, %err, "rewrite aborted");
                self.cache.clear();
                Err(err)
            }
        }
    }

    fn step(&mut self, tm: &TermManager) -> Result<(), RewriterError> {
        self.steps += 1;
        if !tm.inc() {
            return Err(RewriterError::Canceled);
        }
        if self.cfg.max_steps_exceeded(self.steps) {
            return Err(RewriterError::MaxSteps { steps: self.steps });
        }
        let limit = self.cfg.max_memory();
        if limit != u64::MAX && (self.steps == 1 || self.steps % MEMORY_CHECK_INTERVAL == 0) {
            let used = MemoryUsage::allocated_bytes();
            if used > limit {
                return Err(RewriterError::MaxMemory { used, limit });
            }
        }
        Ok(())
    }

    fn finish(
        &mut self,
        frame_term: TermId,
        budget: Option<u32>,
        cache_as: Option<TermId>,
        r: TermId,
        results: &mut Vec<TermId>,
    ) {
        if budget.is_none() {
            self.cache.insert(frame_term, r);
        }
        if let Some(orig) = cache_as {
            self.cache.insert(orig, r);
        }
        results.push(r);
    }

    fn visit(
        &mut self,
        tm: &TermManager,
        t: TermId,
        budget: Option<u32>,
        cache_as: Option<TermId>,
        frames: &mut Vec<Frame>,
        results: &mut Vec<TermId>,
    ) -> Result<(), RewriterError> {
        if budget == Some(0) {
            self.finish(t, budget, cache_as, t, results);
            return Ok(());
        }
        if budget.is_none() {
            if let Some(&r) = self.cache.get(&t) {
                results.push(r);
                return Ok(());
            }
        }
        self.step(tm)?;
        let children = match tm.kind(t) {
            TermKind::Forall { body, .. } | TermKind::Exists { body, .. } => {
                if !self.cfg.rewrite_quantifiers() {
                    self.finish(t, budget, cache_as, t, results);
                    return Ok(());
                }
                if self.cfg.rewrite_patterns() {
                    tm.children(t)
                } else {
                    smallvec![*body]
                }
            }
            _ => tm.children(t),
        };
        frames.push(Frame {
            term: t,
            budget,
            children,
            next: 0,
            cache_as,
        });
        Ok(())
    }

    fn main_loop(&mut self, tm: &mut TermManager, root: TermId) -> Result<TermId, RewriterError> {
        let mut frames: Vec<Frame> = Vec::new();
        let mut results: Vec<TermId> = Vec::new();
        self.visit(tm, root, None, None, &mut frames, &mut results)?;
        loop {
            let Some(frame) = frames.last_mut() else {
                break;
            };
            if frame.next < frame.children.len() {
                let child = frame.children[frame.next];
                frame.next += 1;
                let budget = frame.budget.map(|k| k - 1);
                self.visit(tm, child, budget, None, &mut frames, &mut results)?;
                continue;
            }
            let Some(frame) = frames.pop() else {
                break;
            };
            let split = results.len() - frame.children.len();
            let args: Args = results.drain(split..).collect();
            self.reduce_frame(tm, frame, &args, &mut frames, &mut results)?;
        }
        debug_assert_eq!(results.len(), 1);
        Ok(results.pop().unwrap_or(root))
    }

    fn reduce_frame(
        &mut self,
        tm: &mut TermManager,
        frame: Frame,
        args: &[TermId],
        frames: &mut Vec<Frame>,
        results: &mut Vec<TermId>,
    ) -> Result<(), RewriterError> {
        let t = frame.term;
        let outcome = if tm.kind(t).is_quantifier() {
            let mut new_children: Args = tm.children(t);
            new_children[..args.len()].copy_from_slice(args);
            match self.cfg.reduce_quantifier(tm, t, new_children[0], &new_children[1..]) {
                Some(r) => ReduceResult::Done(r),
                None => ReduceResult::Done(tm.update_children(t, &new_children)),
            }
        } else {
            self.cfg.reduce_app(tm, t, args)
        };
        match outcome {
            ReduceResult::Failed => {
                let r = tm.update_children(t, args);
                self.finish(t, frame.budget, frame.cache_as, r, results);
            }
            ReduceResult::Done(r) => self.finish(t, frame.budget, frame.cache_as, r, results),
            ReduceResult::Rewrite(r, k) => {
                let cache_as = frame.cache_as.or(frame.budget.is_none().then_some(t));
                self.visit(tm, r, Some(k), cache_as, frames, results)?;
            }
        }
        Ok(())
    }
}

//! An online proof checker for CNF clause streams in the DRUP dialect.
//!
//! The checker is invoked synchronously by a single SAT solver instance. The
//! solver pushes the literals of a pending clause one at a time via
//! [`Checker::add_literal`], then issues a verb: [`Checker::add_original`],
//! [`Checker::add_learned`], or [`Checker::delete`]. The checker
//! independently verifies each operation against its own clause database,
//! maintained with a two-watched-literal index and boolean constraint
//! propagation, without trusting the solver.
//!
//! A verification failure is not recoverable: [`CheckerError`] is returned
//! so callers can log and abort, but the checker itself never attempts to
//! continue past one (see [`Checker::run_or_abort`]).
use drup_formula::ExternalLit;

mod at_check;
mod clauses;
mod context;
mod gc;
mod literals;
mod pending;
mod propagate;
mod seq;
mod state;
mod stats;
mod trail;
mod verbs;

pub use gc::GC_INTERVAL;
pub use stats::Stats;

use context::{parts::*, Context};
use partial_ref::IntoPartialRefMut;

/// The three terminal error categories a verb can fail with.
#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    /// Null handle, literal `0`, or literal `ExternalLit::MIN`.
    ///
    /// Rust's ownership model makes a null/dangling handle unrepresentable,
    /// so in practice this variant is only produced by the literal-value
    /// checks; it is kept as its own category to mirror the three-way split
    /// the checker's contract makes.
    #[error("invalid usage in {operation}: {detail}")]
    InvalidUsage {
        operation: &'static str,
        detail: String,
    },
    /// `delete` of a clause not present in the store, or `add-learned` whose
    /// clause is not AT-implied by the current store. The checker's whole
    /// reason for existing.
    #[error("verification failed ({kind}): clause {clause:?}")]
    VerificationFailed {
        kind: VerificationFailureKind,
        clause: Vec<ExternalLit>,
    },
    /// Allocation failure during a table resize or clause creation.
    #[error("resource exhausted ({detail}, size hint {size_hint})")]
    ResourceExhausted { detail: String, size_hint: usize },
    /// Leak check enabled, session consistent, and clauses remained at
    /// teardown. Not one of the three per-verb failure categories above,
    /// since it can only ever fire at `release`.
    #[error("{remained} clause(s) remained at teardown with leak checking enabled")]
    LeakDetected { remained: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationFailureKind {
    /// A learned clause is not implied by unit propagation on the store.
    NotImplied,
    /// A requested deletion has no matching stored clause.
    NotFound,
}

impl std::fmt::Display for VerificationFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationFailureKind::NotImplied => write!(f, "clause not AT-implied"),
            VerificationFailureKind::NotFound => write!(f, "clause not found"),
        }
    }
}

/// A checker instance, owning its entire clause database.
///
/// Single-threaded and synchronous: every verb runs to completion before
/// returning, and there is no cancellation. The caller must fully assemble a
/// clause via [`Checker::add_literal`] before issuing a verb; interleaving
/// two clauses' literals is invalid usage the checker cannot detect (it is
/// a caller-ordering contract, not a checked precondition).
pub struct Checker {
    ctx: Context,
}

impl Default for Checker {
    fn default() -> Checker {
        Checker {
            ctx: Context::default(),
        }
    }
}

impl Checker {
    /// Creates a new checker in the initial empty state.
    pub fn new() -> Checker {
        Checker::default()
    }

    pub fn enable_verbose(&mut self) {
        self.ctx.checker_state.verbose = true;
    }

    pub fn enable_logging(&mut self) {
        self.ctx.checker_state.logging = true;
    }

    pub fn enable_leak_check(&mut self) {
        self.ctx.checker_state.leak_check = true;
    }

    /// Whether the empty clause or a root-level conflict has been derived.
    pub fn is_inconsistent(&self) -> bool {
        self.ctx.checker_state.inconsistent
    }

    pub fn stats(&self) -> &Stats {
        &self.ctx.stats
    }

    /// Number of clause records currently reachable from the watch lists
    /// (unit clauses and the pending scratchpad are not counted).
    pub fn live_clause_count(&self) -> u64 {
        self.ctx.clauses.live_count()
    }

    /// Pushes one literal of the clause currently being assembled.
    ///
    /// Fatal on `e == 0` or `e == ExternalLit::MIN`.
    pub fn add_literal(&mut self, e: ExternalLit) -> Result<(), CheckerError> {
        let mut ctx = (&mut self.ctx).into_partial_ref_mut();
        verbs::add_literal(ctx.borrow(), e)
    }

    /// Adds the pending clause as an original (input) clause.
    pub fn add_original(&mut self) -> Result<(), CheckerError> {
        let mut ctx = (&mut self.ctx).into_partial_ref_mut();
        verbs::add_original(ctx.borrow())
    }

    /// Verifies and adds the pending clause as a learned clause.
    pub fn add_learned(&mut self) -> Result<(), CheckerError> {
        let mut ctx = (&mut self.ctx).into_partial_ref_mut();
        verbs::add_learned(ctx.borrow())
    }

    /// Deletes a stored clause matching the pending clause.
    pub fn delete(&mut self) -> Result<(), CheckerError> {
        let mut ctx = (&mut self.ctx).into_partial_ref_mut();
        verbs::delete(ctx.borrow())
    }

    /// Runs `f`, logging and aborting the process on any [`CheckerError`].
    ///
    /// This is the intended top-level shape for a solver integration: the
    /// checker core returns `Result` so library callers and tests can
    /// inspect failures, but in production a verification failure is
    /// terminal and no error is recoverable inside the core.
    pub fn run_or_abort<T>(result: Result<T, CheckerError>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                log::error!("{}", err);
                std::process::abort();
            }
        }
    }

    /// Tears down the checker, releasing every stored clause.
    ///
    /// Consumes `self` so the handle cannot be used afterward. If leak
    /// checking is enabled, the session is consistent, and any stored
    /// clause's literal set has no root-true literal, this is fatal.
    pub fn release(mut self) -> Result<(), CheckerError> {
        let mut ctx = (&mut self.ctx).into_partial_ref_mut();
        propagate::backtrack(ctx.borrow());

        let remained = teardown_free_all(ctx.borrow());

        if self.ctx.checker_state.verbose {
            log::info!("{}", self.ctx.stats);
            log::info!("clauses remaining at teardown: {}", remained);
        }

        if self.ctx.checker_state.leak_check && !self.ctx.checker_state.inconsistent && remained > 0
        {
            return Err(CheckerError::LeakDetected { remained });
        }

        Ok(())
    }
}

/// Frees every live clause, returning the number whose literal set has no
/// root-true literal (the leak-check "remained" tally).
///
/// Teardown discards the watch-list structure entirely, so unlike
/// [`gc::collect`] there is no need to walk it: the arena already lists
/// every live clause directly.
fn teardown_free_all(mut ctx: partial_ref::partial!(Context, mut ClauseStoreP, LiteralsP)) -> u64 {
    use partial_ref::PartialRef;

    let mut refs = Vec::new();
    for (cref, _clause) in ctx.part(ClauseStoreP).iter_live() {
        refs.push(cref);
    }

    let mut remained = 0u64;
    for cref in refs {
        let satisfied = ctx
            .part(ClauseStoreP)
            .get(cref)
            .lits()
            .iter()
            .any(|&l| ctx.part(LiteralsP).value(l) > 0);
        if !satisfied {
            remained += 1;
        }
        ctx.part_mut(ClauseStoreP).free(cref);
    }
    remained
}

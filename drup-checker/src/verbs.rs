//! Verb handlers: `add-literal`, `add-original`, `add-learned`, `delete`.
use partial_ref::{partial, PartialRef};
use smallvec::SmallVec;

use drup_formula::{ExternalLit, Lit};

use crate::at_check::is_asymmetric_tautology;
use crate::clauses::{self, ClauseRef};
use crate::context::{parts::*, Context};
use crate::gc;
use crate::pending::{clear_marks, normalize, Normalized};
use crate::propagate::{assign, propagate};
use crate::{CheckerError, VerificationFailureKind};

type AllParts = partial!(
    Context,
    mut CheckerStateP,
    mut ClauseStoreP,
    mut GcP,
    mut LiteralsP,
    mut PendingP,
    mut StatsP,
    mut TrailP,
);

/// Imports and pushes an external literal onto the pending scratchpad.
pub fn add_literal(
    mut ctx: partial!(Context, mut LiteralsP, mut PendingP),
    e: ExternalLit,
) -> Result<(), CheckerError> {
    let lit = ctx.part_mut(LiteralsP).import(e)?;
    ctx.part_mut(PendingP).push_literal(lit);
    Ok(())
}

fn log_pending(ctx: partial!(Context, LiteralsP, PendingP), tag: &str) {
    let externals: SmallVec<[ExternalLit; 8]> = ctx
        .part(PendingP)
        .raw()
        .iter()
        .map(|&l| ctx.part(LiteralsP).export(l))
        .collect();
    log::trace!("{}: {:?}", tag, &externals[..]);
}

fn externalize(ctx: partial!(Context, LiteralsP), lits: &[Lit]) -> Vec<ExternalLit> {
    lits.iter().map(|&l| ctx.part(LiteralsP).export(l)).collect()
}

/// Installs a normalized, non-trivial clause: assigns and propagates a unit,
/// latches inconsistency on an empty clause, or links a multi-literal clause
/// into the two-watch index.
///
/// Shared by `add-original` and the post-AT-check install in `add-learned`.
fn install(
    mut ctx: partial!(Context, mut CheckerStateP, mut ClauseStoreP, mut GcP, mut LiteralsP, mut TrailP),
    lits: &[Lit],
) {
    let survivors: SmallVec<[Lit; 8]> = lits
        .iter()
        .copied()
        .filter(|&l| ctx.part(LiteralsP).value(l) >= 0)
        .collect();

    match survivors.len() {
        0 => {
            ctx.part_mut(CheckerStateP).inconsistent = true;
        }
        1 => {
            assign(ctx.borrow(), survivors[0]);
            match propagate(ctx.borrow()) {
                Ok(()) => {
                    ctx.part_mut(TrailP).drain();
                    ctx.part_mut(GcP).note_new_unit();
                }
                Err(_conflict) => {
                    ctx.part_mut(CheckerStateP).inconsistent = true;
                    ctx.part_mut(TrailP).drain();
                }
            }
        }
        _ => {
            let cref: ClauseRef = ctx.part_mut(ClauseStoreP).alloc(&survivors);
            clauses::link(ctx.borrow(), survivors[0], cref);
            clauses::link(ctx.borrow(), survivors[1], cref);
        }
    }
}

fn maybe_collect(
    mut ctx: partial!(Context, mut ClauseStoreP, mut GcP, mut LiteralsP, mut StatsP, CheckerStateP),
) {
    let ready = ctx.part_mut(GcP).tick();
    if ready && !ctx.part(CheckerStateP).inconsistent {
        let verbose = ctx.part(CheckerStateP).verbose;
        gc::collect(ctx.borrow(), verbose);
    }
}

/// Adds the pending clause as an original (input) clause.
pub fn add_original(mut ctx: AllParts) -> Result<(), CheckerError> {
    if ctx.part(CheckerStateP).inconsistent {
        ctx.part_mut(PendingP).clear();
        return Ok(());
    }
    if ctx.part(CheckerStateP).logging {
        log_pending(ctx.borrow(), "original");
    }

    if normalize(ctx.borrow()) == Normalized::Trivial {
        ctx.part_mut(StatsP).originals_added += 1;
        return Ok(());
    }

    let canonical: SmallVec<[Lit; 8]> = ctx.part(PendingP).canonical().iter().copied().collect();
    install(ctx.borrow(), &canonical);
    clear_marks(ctx.borrow(), &canonical);
    ctx.part_mut(PendingP).clear();

    maybe_collect(ctx.borrow());
    ctx.part_mut(StatsP).originals_added += 1;

    Ok(())
}

/// Verifies and adds the pending clause as a learned clause.
pub fn add_learned(mut ctx: AllParts) -> Result<(), CheckerError> {
    if ctx.part(CheckerStateP).inconsistent {
        ctx.part_mut(PendingP).clear();
        return Ok(());
    }
    if ctx.part(CheckerStateP).logging {
        log_pending(ctx.borrow(), "learned");
    }

    if normalize(ctx.borrow()) == Normalized::Trivial {
        ctx.part_mut(StatsP).learned_checked += 1;
        return Ok(());
    }

    let canonical: SmallVec<[Lit; 8]> = ctx.part(PendingP).canonical().iter().copied().collect();

    if !is_asymmetric_tautology(ctx.borrow()) {
        let clause = externalize(ctx.borrow(), &canonical);
        clear_marks(ctx.borrow(), &canonical);
        ctx.part_mut(PendingP).clear();
        return Err(CheckerError::VerificationFailed {
            kind: VerificationFailureKind::NotImplied,
            clause,
        });
    }

    install(ctx.borrow(), &canonical);
    clear_marks(ctx.borrow(), &canonical);
    ctx.part_mut(PendingP).clear();

    maybe_collect(ctx.borrow());
    ctx.part_mut(StatsP).learned_checked += 1;

    Ok(())
}

/// Deletes a stored clause matching the pending clause.
pub fn delete(mut ctx: AllParts) -> Result<(), CheckerError> {
    if ctx.part(CheckerStateP).inconsistent {
        ctx.part_mut(PendingP).clear();
        return Ok(());
    }
    if ctx.part(CheckerStateP).logging {
        log_pending(ctx.borrow(), "delete");
    }

    let raw: SmallVec<[Lit; 8]> = ctx.part(PendingP).raw().iter().copied().collect();

    if normalize(ctx.borrow()) == Normalized::Trivial {
        // no tautology or root-satisfied clause is ever stored as a record,
        // so there is nothing a content-match could possibly find.
        let clause = externalize(ctx.borrow(), &raw);
        return Err(CheckerError::VerificationFailed {
            kind: VerificationFailureKind::NotFound,
            clause,
        });
    }

    let canonical: SmallVec<[Lit; 8]> = ctx.part(PendingP).canonical().iter().copied().collect();
    let found = find_and_remove(ctx.borrow(), &canonical);

    clear_marks(ctx.borrow(), &canonical);
    ctx.part_mut(PendingP).clear();

    if found {
        ctx.part_mut(StatsP).deletions_processed += 1;
        Ok(())
    } else {
        let clause = externalize(ctx.borrow(), &canonical);
        Err(CheckerError::VerificationFailed {
            kind: VerificationFailureKind::NotFound,
            clause,
        })
    }
}

/// Scans the watch lists of `canonical`'s literals for a clause whose
/// literal multiset exactly matches (every literal marked present, same
/// size), unlinks and frees it.
fn find_and_remove(
    mut ctx: partial!(Context, mut ClauseStoreP, mut LiteralsP),
    canonical: &[Lit],
) -> bool {
    for &lit in canonical {
        let mut cursor = ctx.part(LiteralsP).watch_head(lit);

        while let Some(cref) = cursor {
            let pos = ctx
                .part(ClauseStoreP)
                .get(cref)
                .position_of(lit)
                .expect("watch list content");
            let next = ctx.part(ClauseStoreP).get(cref).next[pos];

            let matches = {
                let clause = ctx.part(ClauseStoreP).get(cref);
                clause.size() == canonical.len()
                    && clause.lits().iter().all(|&l| ctx.part(LiteralsP).mark(l))
            };

            if matches {
                let (w0, w1) = ctx.part(ClauseStoreP).get(cref).watched();
                clauses::unlink(ctx.borrow(), w0, cref);
                clauses::unlink(ctx.borrow(), w1, cref);
                ctx.part_mut(ClauseStoreP).free(cref);
                return true;
            }

            cursor = next;
        }
    }
    false
}

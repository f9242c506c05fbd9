//! Asymmetric-tautology (AT) implication check for `add-learned`.
use partial_ref::{partial, PartialRef};

use crate::context::{parts::*, Context};
use crate::propagate::{assign, backtrack, propagate};

/// Checks whether the normalized clause in `ctx.part(PendingP).canonical()`
/// is implied by unit propagation on the current store (AT-implication).
///
/// Always backtracks the temporary trail to empty before returning,
/// regardless of outcome, since this trail is provisional: a confirmed AT
/// clause is installed afterwards by the caller, which may propagate a
/// fresh, permanent unit of its own.
pub fn is_asymmetric_tautology(
    mut ctx: partial!(Context, mut ClauseStoreP, mut LiteralsP, mut TrailP, mut PendingP),
) -> bool {
    debug_assert!(ctx.part(TrailP).is_empty());

    let lits: Vec<_> = ctx.part(PendingP).canonical().to_vec();

    let mut implied = false;

    for lit in lits {
        let value = ctx.part(LiteralsP).value(lit);
        if value > 0 {
            implied = true;
            break;
        }
        if value == 0 {
            assign(ctx.borrow(), !lit);
            if propagate(ctx.borrow()).is_err() {
                implied = true;
                break;
            }
        }
        // value < 0: this literal is already false, skip it
    }

    backtrack(ctx.borrow());
    implied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clauses;
    use partial_ref::IntoPartialRefMut;

    fn lit(n: i64, ctx: &mut Context) -> drup_formula::Lit {
        ctx.literals.import(n).unwrap()
    }

    #[test]
    fn clause_implied_by_existing_unit_chain() {
        // {a, b}; -a forced permanently; learned {b} should be AT-implied.
        let mut target = Context::default();
        let a = lit(1, &mut target);
        let b = lit(2, &mut target);
        let not_a = lit(-1, &mut target);

        let cref = target.clauses.alloc(&[a, b]);
        let mut ctx = target.into_partial_ref_mut();
        clauses::link(ctx.borrow(), a, cref);
        clauses::link(ctx.borrow(), b, cref);

        assign(ctx.borrow(), not_a);
        propagate(ctx.borrow()).unwrap();
        ctx.part_mut(TrailP).drain();

        ctx.part_mut(PendingP).push_literal(b);
        crate::pending::normalize(ctx.borrow());

        assert!(is_asymmetric_tautology(ctx.borrow()));
        assert!(ctx.part(TrailP).is_empty());
    }

    #[test]
    fn clause_not_implied_is_rejected() {
        // {a, b}; learned {c} is unrelated and not implied.
        let mut target = Context::default();
        let a = lit(1, &mut target);
        let b = lit(2, &mut target);
        let c = lit(3, &mut target);

        let cref = target.clauses.alloc(&[a, b]);
        let mut ctx = target.into_partial_ref_mut();
        clauses::link(ctx.borrow(), a, cref);
        clauses::link(ctx.borrow(), b, cref);

        ctx.part_mut(PendingP).push_literal(c);
        crate::pending::normalize(ctx.borrow());

        assert!(!is_asymmetric_tautology(ctx.borrow()));
        assert!(ctx.part(TrailP).is_empty());
    }
}

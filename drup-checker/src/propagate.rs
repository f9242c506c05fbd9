//! Boolean constraint propagation over the two-watch index.
use partial_ref::{partial, PartialRef};

use drup_formula::Lit;

use crate::clauses::{self, ClauseRef};
use crate::context::{parts::*, Context};

/// Propagation found no satisfying replacement and no unassigned literal:
/// the clause currently being walked has no non-false literal left.
#[derive(Debug, Clone, Copy)]
pub struct Conflict;

/// Assigns `lit` true. Requires `value(lit) == 0`.
pub fn assign(mut ctx: partial!(Context, mut LiteralsP, mut TrailP), lit: Lit) {
    let literals = ctx.part_mut(LiteralsP);
    debug_assert_eq!(literals.value(lit), 0, "literal already assigned");
    literals.set_value(lit, 1);
    literals.set_value(!lit, -1);
    ctx.part_mut(TrailP).push(lit);
}

/// Runs BCP until the trail is saturated or a conflict is found.
///
/// On success, every literal implied by the literals already on the trail
/// has also been assigned and appended to the trail; the caller decides
/// whether those assignments become permanent (drain) or must be undone
/// (backtrack).
pub fn propagate(
    mut ctx: partial!(Context, mut ClauseStoreP, mut LiteralsP, mut TrailP),
) -> Result<(), Conflict> {
    loop {
        let lit = match ctx.part_mut(TrailP).next_to_propagate() {
            Some(lit) => lit,
            None => return Ok(()),
        };
        propagate_literal(ctx.borrow(), lit)?;
    }
}

/// Walks the watch list of `!lit` (the literals that just became false) and
/// repairs or reports every clause that watches it.
fn propagate_literal(
    mut ctx: partial!(Context, mut ClauseStoreP, mut LiteralsP, mut TrailP),
    lit: Lit,
) -> Result<(), Conflict> {
    let falsified = !lit;

    let mut prev: Option<ClauseRef> = None;
    let mut cursor = ctx.part(LiteralsP).watch_head(falsified);

    while let Some(cref) = cursor {
        let pos = ctx
            .part(ClauseStoreP)
            .get(cref)
            .position_of(falsified)
            .expect("watch list content");
        let other_pos = 1 - pos;
        let other = ctx.part(ClauseStoreP).get(cref).lit_at(other_pos);
        let next = ctx.part(ClauseStoreP).get(cref).next[pos];

        if ctx.part(LiteralsP).value(other) > 0 {
            // already satisfied through the other watch, nothing to do
            prev = Some(cref);
            cursor = next;
            continue;
        }

        if let Some(replacement_pos) = find_replacement(ctx.borrow(), cref) {
            let new_watch_lit = ctx.part(ClauseStoreP).get(cref).lit_at(replacement_pos);

            ctx.part_mut(ClauseStoreP)
                .get_mut(cref)
                .swap_lits(pos, replacement_pos);

            // detach from falsified's list
            match prev {
                None => ctx.part_mut(LiteralsP).set_watch_head(falsified, next),
                Some(p) => {
                    let ppos = ctx
                        .part(ClauseStoreP)
                        .get(p)
                        .position_of(falsified)
                        .expect("watch list content");
                    ctx.part_mut(ClauseStoreP).get_mut(p).next[ppos] = next;
                }
            }

            clauses::link(ctx.borrow(), new_watch_lit, cref);

            cursor = next;
            continue;
        }

        if ctx.part(LiteralsP).value(other) < 0 {
            return Err(Conflict);
        }

        assign(ctx.borrow(), other);
        prev = Some(cref);
        cursor = next;
    }

    Ok(())
}

/// Searches positions `2..size` of `cref` for a literal with value >= 0
/// (unassigned or true), returning its position if found.
fn find_replacement(
    ctx: partial!(Context, ClauseStoreP, LiteralsP),
    cref: ClauseRef,
) -> Option<usize> {
    let clause = ctx.part(ClauseStoreP).get(cref);
    let literals = ctx.part(LiteralsP);
    (2..clause.size()).find(|&pos| literals.value(clause.lit_at(pos)) >= 0)
}

/// Pops the trail back to empty, resetting `value` for each popped literal.
/// Used only during the AT check's temporary propagation.
pub fn backtrack(mut ctx: partial!(Context, mut LiteralsP, mut TrailP)) {
    while let Some(lit) = ctx.part_mut(TrailP).pop() {
        let literals = ctx.part_mut(LiteralsP);
        literals.set_value(lit, 0);
        literals.set_value(!lit, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partial_ref::IntoPartialRefMut;

    fn lit(n: i64, ctx: &mut Context) -> Lit {
        ctx.literals.import(n).unwrap()
    }

    #[test]
    fn unit_propagation_chains_through_binary_clauses() {
        let mut target = Context::default();
        let a = lit(1, &mut target);
        let b = lit(2, &mut target);
        let not_a = lit(-1, &mut target);

        // clause {-a, b}: once a is assigned, b must follow
        let cref = target.clauses.alloc(&[not_a, b]);
        let mut ctx = target.into_partial_ref_mut();
        clauses::link(ctx.borrow(), not_a, cref);
        clauses::link(ctx.borrow(), b, cref);

        assign(ctx.borrow(), a);
        propagate(ctx.borrow()).unwrap();

        assert_eq!(ctx.part(LiteralsP).value(b), 1);
        assert!(ctx.part(LiteralsP).value(!b) < 0);
    }

    #[test]
    fn conflicting_unit_propagation_reports_conflict() {
        let mut target = Context::default();
        let a = lit(1, &mut target);
        let b = lit(2, &mut target);
        let not_a = lit(-1, &mut target);
        let not_b = lit(-2, &mut target);

        let c1 = target.clauses.alloc(&[not_a, b]);
        let c2 = target.clauses.alloc(&[not_a, not_b]);
        let mut ctx = target.into_partial_ref_mut();
        clauses::link(ctx.borrow(), not_a, c1);
        clauses::link(ctx.borrow(), b, c1);
        clauses::link(ctx.borrow(), not_a, c2);
        clauses::link(ctx.borrow(), not_b, c2);

        assign(ctx.borrow(), a);
        assert!(propagate(ctx.borrow()).is_err());
    }

    #[test]
    fn backtrack_resets_values_and_empties_trail() {
        let mut target = Context::default();
        let a = lit(1, &mut target);
        let mut ctx = target.into_partial_ref_mut();

        assign(ctx.borrow(), a);
        backtrack(ctx.borrow());

        assert_eq!(ctx.part(LiteralsP).value(a), 0);
        assert!(ctx.part(TrailP).is_empty());
    }
}

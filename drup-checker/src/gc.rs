//! Garbage collection of root-satisfied clauses.
//!
//! Runs in three passes over the clause arena: detach every clause's second
//! watch, free clauses whose literal set is root-satisfied while walking the
//! now-singly-referenced position-0 lists, then reconnect surviving clauses'
//! second watches in a clean final pass. Interleaving the reconnect step
//! into the collection walk would make it ambiguous which literal a clause
//! is being reconnected from whenever the walk itself unlinks that clause;
//! the separate final pass avoids the question entirely.
use log::info;
use partial_ref::{partial, PartialRef};

use drup_formula::Lit;

use crate::clauses::ClauseRef;
use crate::context::{parts::*, Context};
use crate::stats::Stats;

/// Base cooldown between collection attempts; scaled by the number of
/// collections already performed.
pub const GC_INTERVAL: u64 = 10_000;

/// Scheduling state for garbage collection.
pub struct GcSchedule {
    /// Countdown until the next collection attempt.
    cooldown: u64,
    /// New unit implications since the last collection.
    new_units: u64,
    /// Number of collections performed so far.
    collections_performed: u64,
}

impl Default for GcSchedule {
    fn default() -> Self {
        GcSchedule {
            cooldown: GC_INTERVAL,
            new_units: 0,
            collections_performed: 0,
        }
    }
}

impl GcSchedule {
    pub fn note_new_unit(&mut self) {
        self.new_units += 1;
    }

    /// Decrements the cooldown and reports whether a collection should run:
    /// the cooldown has elapsed and at least one new unit has appeared.
    pub fn tick(&mut self) -> bool {
        self.cooldown = self.cooldown.saturating_sub(1);
        self.cooldown == 0 && self.new_units > 0
    }

    fn reschedule(&mut self) {
        self.new_units = 0;
        self.collections_performed = self.collections_performed.saturating_add(1);
        self.cooldown = GC_INTERVAL.saturating_mul(self.collections_performed.saturating_add(1));
    }
}

/// Runs one garbage-collection pass, freeing every clause with a root-true
/// literal. Caller must already have checked `GcSchedule::tick()`.
pub fn collect(
    mut ctx: partial!(Context, mut ClauseStoreP, mut GcP, mut LiteralsP, mut StatsP),
    verbose: bool,
) {
    let capacity = ctx.part(LiteralsP).capacity();

    // Phase 1: detach every clause's second watch, leaving each live clause
    // reachable from exactly the watch list of its position-0 literal.
    for code in 0..capacity {
        let lit = Lit::from_code(code);
        detach_second_watch(ctx.borrow(), lit);
    }

    // Phase 2: walk the now-canonical position-0 lists and free clauses
    // that have become root-satisfied.
    let mut collected = 0u64;
    for code in 0..capacity {
        let lit = Lit::from_code(code);
        collected += collect_satisfied(ctx.borrow(), lit);
    }

    // Phase 3: reconnect surviving clauses' second watch.
    for code in 0..capacity {
        let lit = Lit::from_code(code);
        reconnect_second_watch(ctx.borrow(), lit);
    }

    let gc = ctx.part_mut(GcP);
    gc.reschedule();

    let stats = ctx.part_mut(StatsP);
    stats.clauses_collected += collected;
    stats.collections_performed += 1;

    if verbose {
        info!(
            "gc: collected {} satisfied clauses, {} remain",
            collected,
            ctx.part(ClauseStoreP).live_count()
        );
    }
}

/// Removes every clause watching `lit` at position 1 from `lit`'s watch
/// list, leaving position-0 watchers untouched.
fn detach_second_watch(mut ctx: partial!(Context, mut ClauseStoreP, mut LiteralsP), lit: Lit) {
    let mut prev: Option<ClauseRef> = None;
    let mut cursor = ctx.part(LiteralsP).watch_head(lit);

    while let Some(cref) = cursor {
        let pos = ctx
            .part(ClauseStoreP)
            .get(cref)
            .position_of(lit)
            .expect("watch list content");
        let next = ctx.part(ClauseStoreP).get(cref).next[pos];

        if pos == 1 {
            match prev {
                None => ctx.part_mut(LiteralsP).set_watch_head(lit, next),
                Some(p) => {
                    let ppos = ctx
                        .part(ClauseStoreP)
                        .get(p)
                        .position_of(lit)
                        .expect("watch list content");
                    ctx.part_mut(ClauseStoreP).get_mut(p).next[ppos] = next;
                }
            }
            cursor = next;
            // prev unchanged: we removed the current node from this list
        } else {
            prev = Some(cref);
            cursor = next;
        }
    }
}

/// Walks `lit`'s (now position-0-only) watch list and frees every clause
/// containing a root-true literal. Returns the number collected.
fn collect_satisfied(
    mut ctx: partial!(Context, mut ClauseStoreP, mut LiteralsP),
    lit: Lit,
) -> u64 {
    let mut prev: Option<ClauseRef> = None;
    let mut cursor = ctx.part(LiteralsP).watch_head(lit);
    let mut collected = 0u64;

    while let Some(cref) = cursor {
        let next = ctx.part(ClauseStoreP).get(cref).next[0];
        let satisfied = ctx
            .part(ClauseStoreP)
            .get(cref)
            .lits()
            .iter()
            .any(|&l| ctx.part(LiteralsP).value(l) > 0);

        if satisfied {
            match prev {
                None => ctx.part_mut(LiteralsP).set_watch_head(lit, next),
                Some(p) => ctx.part_mut(ClauseStoreP).get_mut(p).next[0] = next,
            }
            ctx.part_mut(ClauseStoreP).free(cref);
            collected += 1;
            cursor = next;
        } else {
            prev = Some(cref);
            cursor = next;
        }
    }

    collected
}

/// For every surviving clause on `lit`'s watch list whose position-0
/// literal is `lit`, links it into the watch list of its position-1
/// literal.
///
/// Reconnecting a clause prepends it onto its position-1 literal's list,
/// which means a clause reconnected while processing an earlier literal
/// can already be sitting at the head of *this* literal's list by the time
/// this function runs for `lit`. Such a clause has `lit` as its position-1
/// literal, not its position-0 one, and must not be reconnected a second
/// time — doing so would link it onto its own list and corrupt the chain.
/// `position_of` tells the two cases apart: position 0 means a genuine,
/// not-yet-reconnected survivor of `lit`'s own list (advance and reconnect
/// via `next[0]`); position 1 means an already-reconnected clause passing
/// through (advance via `next[1]`, which holds the rest of `lit`'s list as
/// it stood at the moment that clause was pushed onto it, and do nothing
/// else).
fn reconnect_second_watch(mut ctx: partial!(Context, mut ClauseStoreP, mut LiteralsP), lit: Lit) {
    let mut cursor = ctx.part(LiteralsP).watch_head(lit);

    while let Some(cref) = cursor {
        let pos = ctx
            .part(ClauseStoreP)
            .get(cref)
            .position_of(lit)
            .expect("watch list content");
        let next = ctx.part(ClauseStoreP).get(cref).next[pos];

        if pos == 0 {
            let second = ctx.part(ClauseStoreP).get(cref).lit_at(1);
            let head = ctx.part(LiteralsP).watch_head(second);
            ctx.part_mut(ClauseStoreP).get_mut(cref).next[1] = head;
            ctx.part_mut(LiteralsP).set_watch_head(second, Some(cref));
        }

        cursor = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clauses;
    use crate::propagate::assign;
    use partial_ref::IntoPartialRefMut;

    #[test]
    fn collects_only_root_satisfied_clauses() {
        let mut target = Context::default();
        let a = target.literals.import(1).unwrap();
        let b = target.literals.import(2).unwrap();
        let c = target.literals.import(3).unwrap();
        let d = target.literals.import(4).unwrap();

        let satisfied = target.clauses.alloc(&[a, b]);
        let unsatisfied = target.clauses.alloc(&[c, d]);

        let mut ctx = target.into_partial_ref_mut();
        clauses::link(ctx.borrow(), a, satisfied);
        clauses::link(ctx.borrow(), b, satisfied);
        clauses::link(ctx.borrow(), c, unsatisfied);
        clauses::link(ctx.borrow(), d, unsatisfied);

        assign(ctx.borrow(), a);
        ctx.part_mut(TrailP).drain();

        assert_eq!(ctx.part(ClauseStoreP).live_count(), 2);
        collect(ctx.borrow(), false);
        assert_eq!(ctx.part(ClauseStoreP).live_count(), 1);

        // the surviving clause is still correctly double-watched, and
        // neither watch list loops back on itself
        assert_eq!(ctx.part(LiteralsP).watch_head(c), Some(unsatisfied));
        assert_eq!(ctx.part(LiteralsP).watch_head(d), Some(unsatisfied));
        let pos_c = ctx.part(ClauseStoreP).get(unsatisfied).position_of(c).unwrap();
        let pos_d = ctx.part(ClauseStoreP).get(unsatisfied).position_of(d).unwrap();
        assert_eq!(ctx.part(ClauseStoreP).get(unsatisfied).next[pos_c], None);
        assert_eq!(ctx.part(ClauseStoreP).get(unsatisfied).next[pos_d], None);
    }

    #[test]
    fn reconnect_handles_a_clause_already_relinked_onto_a_higher_coded_literal() {
        // c's code is lower than d's, so phase 3 reconnects U1 onto d's
        // list while processing c, before phase 3 ever visits d itself.
        // d also has its own native survivor, U3, watching it directly.
        // Walking d's list must see both without looping or skipping one.
        let mut target = Context::default();
        let a = target.literals.import(1).unwrap();
        let b = target.literals.import(2).unwrap();
        let c = target.literals.import(3).unwrap();
        let d = target.literals.import(4).unwrap();
        let f = target.literals.import(5).unwrap();

        let satisfied = target.clauses.alloc(&[a, b]);
        let u1 = target.clauses.alloc(&[c, d]);
        let u3 = target.clauses.alloc(&[d, f]);

        let mut ctx = target.into_partial_ref_mut();
        clauses::link(ctx.borrow(), a, satisfied);
        clauses::link(ctx.borrow(), b, satisfied);
        clauses::link(ctx.borrow(), c, u1);
        clauses::link(ctx.borrow(), d, u1);
        clauses::link(ctx.borrow(), d, u3);
        clauses::link(ctx.borrow(), f, u3);

        assign(ctx.borrow(), a);
        ctx.part_mut(TrailP).drain();

        collect(ctx.borrow(), false);
        assert_eq!(ctx.part(ClauseStoreP).live_count(), 2);

        // both u1 (via its position-1 literal d) and u3 (via its
        // position-0 literal d) must be reachable from d's list, each
        // exactly once, and the chain must terminate.
        let mut seen = vec![];
        let mut cursor = ctx.part(LiteralsP).watch_head(d);
        let mut steps = 0;
        while let Some(cref) = cursor {
            steps += 1;
            assert!(steps <= 2, "watch list failed to terminate");
            seen.push(cref);
            let pos = ctx.part(ClauseStoreP).get(cref).position_of(d).unwrap();
            cursor = ctx.part(ClauseStoreP).get(cref).next[pos];
        }
        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&u1));
        assert!(seen.contains(&u3));

        assert_eq!(ctx.part(LiteralsP).watch_head(c), Some(u1));
        assert_eq!(ctx.part(LiteralsP).watch_head(f), Some(u3));
    }
}

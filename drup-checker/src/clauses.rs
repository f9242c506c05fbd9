//! Clause store and two-watch index: an arena of clause records with a
//! free list, each clause carrying its own watch-list links rather than
//! per-literal watch vectors.
//!
//! Each clause is an owning record reachable only through the watch lists of
//! its two watched literals — there is no separate global clause list. The
//! store is a slab: clauses are allocated at an index (`ClauseRef`) and
//! freed indices are reused via a free list.
use partial_ref::{partial, PartialRef};
use smallvec::SmallVec;

use drup_formula::Lit;

use crate::context::{parts::*, Context};

/// An index into the clause arena.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ClauseRef(u32);

const INLINE_LITS: usize = 4;

/// A stored clause. `size >= 2`; positions 0 and 1 are the watched
/// positions. `next[0]`/`next[1]` thread the clause onto the watch list of
/// whichever literal currently occupies that position.
pub struct Clause {
    lits: SmallVec<[Lit; INLINE_LITS]>,
    pub(crate) next: [Option<ClauseRef>; 2],
}

impl Clause {
    #[inline]
    pub fn size(&self) -> usize {
        self.lits.len()
    }

    #[inline]
    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    #[inline]
    pub fn watched(&self) -> (Lit, Lit) {
        (self.lits[0], self.lits[1])
    }

    /// The watched position (0 or 1) that holds `lit`, or `None` if `lit` is
    /// not one of this clause's two watched literals.
    #[inline]
    pub fn position_of(&self, lit: Lit) -> Option<usize> {
        if self.lits[0] == lit {
            Some(0)
        } else if self.lits[1] == lit {
            Some(1)
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn swap_lits(&mut self, i: usize, j: usize) {
        self.lits.swap(i, j);
    }

    #[inline]
    pub(crate) fn lit_at(&self, pos: usize) -> Lit {
        self.lits[pos]
    }
}

enum Slot {
    Occupied(Clause),
    Free(Option<u32>),
}

/// Owning arena of all live (and freed-but-reusable) clause records.
#[derive(Default)]
pub struct ClauseStore {
    arena: Vec<Slot>,
    free_head: Option<u32>,
    live_count: u64,
}

impl ClauseStore {
    #[inline]
    pub fn live_count(&self) -> u64 {
        self.live_count
    }

    pub fn get(&self, cref: ClauseRef) -> &Clause {
        match &self.arena[cref.0 as usize] {
            Slot::Occupied(clause) => clause,
            Slot::Free(_) => unreachable!("dangling clause reference"),
        }
    }

    pub fn get_mut(&mut self, cref: ClauseRef) -> &mut Clause {
        match &mut self.arena[cref.0 as usize] {
            Slot::Occupied(clause) => clause,
            Slot::Free(_) => unreachable!("dangling clause reference"),
        }
    }

    /// Allocates a new clause record. `lits[0]` and `lits[1]` become the
    /// initial watched literals; the caller links it into their watch lists.
    pub fn alloc(&mut self, lits: &[Lit]) -> ClauseRef {
        debug_assert!(lits.len() >= 2);
        let clause = Clause {
            lits: SmallVec::from_slice(lits),
            next: [None, None],
        };
        self.live_count += 1;
        if let Some(index) = self.free_head {
            self.free_head = match self.arena[index as usize] {
                Slot::Free(next) => next,
                Slot::Occupied(_) => unreachable!(),
            };
            self.arena[index as usize] = Slot::Occupied(clause);
            ClauseRef(index)
        } else {
            let index = self.arena.len() as u32;
            self.arena.push(Slot::Occupied(clause));
            ClauseRef(index)
        }
    }

    /// Releases a clause's slot for reuse. Callers must already have
    /// unlinked it from both watch lists.
    pub fn free(&mut self, cref: ClauseRef) {
        self.arena[cref.0 as usize] = Slot::Free(self.free_head);
        self.free_head = Some(cref.0);
        self.live_count -= 1;
    }

    /// All occupied slots, for teardown and garbage-collection scans.
    pub fn iter_live(&self) -> impl Iterator<Item = (ClauseRef, &Clause)> {
        self.arena.iter().enumerate().filter_map(|(i, slot)| {
            if let Slot::Occupied(clause) = slot {
                Some((ClauseRef(i as u32), clause))
            } else {
                None
            }
        })
    }
}

/// Links `cref` onto the watch list of `lit`, which must already be one of
/// the clause's two watched literals (position determined by content, not
/// by which list we're linking into, since the two links are independent).
pub fn link(mut ctx: partial!(Context, mut ClauseStoreP, mut LiteralsP), lit: Lit, cref: ClauseRef) {
    let (clauses, mut ctx) = ctx.split_part_mut(ClauseStoreP);
    let literals = ctx.part_mut(LiteralsP);
    let pos = clauses
        .get(cref)
        .position_of(lit)
        .expect("lit must be a watched literal of cref");
    let head = literals.watch_head(lit);
    clauses.get_mut(cref).next[pos] = head;
    literals.set_watch_head(lit, Some(cref));
}

/// Unlinks `cref` from the watch list of `lit`. `O(list length)`: walks the
/// list computing the successor link before comparing, so the unlink always
/// uses the just-computed successor rather than one read on a previous
/// iteration.
pub fn unlink(
    mut ctx: partial!(Context, mut ClauseStoreP, mut LiteralsP),
    lit: Lit,
    target: ClauseRef,
) {
    let (clauses, mut ctx) = ctx.split_part_mut(ClauseStoreP);
    let literals = ctx.part_mut(LiteralsP);

    let mut prev: Option<ClauseRef> = None;
    let mut cursor = literals.watch_head(lit);

    while let Some(cref) = cursor {
        let pos = clauses.get(cref).position_of(lit).expect("watch list content");
        let next = clauses.get(cref).next[pos];

        if cref == target {
            match prev {
                None => literals.set_watch_head(lit, next),
                Some(p) => {
                    let ppos = clauses.get(p).position_of(lit).expect("watch list content");
                    clauses.get_mut(p).next[ppos] = next;
                }
            }
            return;
        }

        prev = Some(cref);
        cursor = next;
    }

    unreachable!("clause not found on its own watch list");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literals::Literals;
    use partial_ref::IntoPartialRefMut;

    fn lit(n: i64, literals: &mut Literals) -> Lit {
        literals.import(n).unwrap()
    }

    #[test]
    fn link_then_unlink_empties_watch_list() {
        let mut target = Context::default();
        let a = lit(1, &mut target.literals);
        let b = lit(2, &mut target.literals);
        let cref = target.clauses.alloc(&[a, b]);

        let mut ctx = target.into_partial_ref_mut();
        link(ctx.borrow(), a, cref);
        link(ctx.borrow(), b, cref);

        assert_eq!(ctx.part(LiteralsP).watch_head(a), Some(cref));
        assert_eq!(ctx.part(LiteralsP).watch_head(b), Some(cref));

        unlink(ctx.borrow(), a, cref);
        unlink(ctx.borrow(), b, cref);

        assert_eq!(ctx.part(LiteralsP).watch_head(a), None);
        assert_eq!(ctx.part(LiteralsP).watch_head(b), None);
    }

    #[test]
    fn multiple_clauses_share_a_watch_list() {
        let mut target = Context::default();
        let a = lit(1, &mut target.literals);
        let b = lit(2, &mut target.literals);
        let c = lit(3, &mut target.literals);
        let c1 = target.clauses.alloc(&[a, b]);
        let c2 = target.clauses.alloc(&[a, c]);

        let mut ctx = target.into_partial_ref_mut();
        link(ctx.borrow(), a, c1);
        link(ctx.borrow(), a, c2);

        // both reachable from a's watch list, each exactly once, in some order
        let mut seen = vec![];
        let mut cursor = ctx.part(LiteralsP).watch_head(a);
        while let Some(cref) = cursor {
            seen.push(cref);
            let pos = ctx.part(ClauseStoreP).get(cref).position_of(a).unwrap();
            cursor = ctx.part(ClauseStoreP).get(cref).next[pos];
        }
        seen.sort_by_key(|c| c.0);
        let mut expected = [c1, c2];
        expected.sort_by_key(|c| c.0);
        assert_eq!(seen, expected);
    }
}

//! Pending-clause scratchpad and normalization.
use partial_ref::{partial, PartialRef};

use drup_formula::Lit;

use crate::context::{parts::*, Context};
use crate::seq::Seq;

/// Outcome of normalizing the pending clause.
#[derive(Debug, PartialEq, Eq)]
pub enum Normalized {
    /// The clause is trivially true (tautology or a root-true literal);
    /// marks and the scratchpad have already been cleared.
    Trivial,
    /// The surviving literals are pairwise distinct, none positive at root,
    /// and marked for the duration of the handler in `Pending::canonical`.
    Canonical,
}

/// The pending-clause scratchpad, reused across verbs.
#[derive(Default)]
pub struct Pending {
    /// Literals pushed by `add-literal` for the clause currently being built.
    lits: Seq<Lit>,
    /// Canonical (deduplicated) literals after normalization.
    canonical: Seq<Lit>,
}

impl Pending {
    #[inline]
    pub fn push_literal(&mut self, lit: Lit) {
        self.lits.push(lit);
    }

    #[inline]
    pub fn canonical(&self) -> &[Lit] {
        self.canonical.as_slice()
    }

    #[inline]
    pub fn raw(&self) -> &[Lit] {
        self.lits.as_slice()
    }

    /// Clears the scratchpad, ready for the next clause. Does not touch
    /// marks; callers clear those separately via [`clear_marks`].
    pub fn clear(&mut self) {
        self.lits.clear();
        self.canonical.clear();
    }
}

/// Normalizes the pending clause: drops duplicates, and detects the two
/// trivial cases (tautology, clause already root-satisfied).
///
/// Drops duplicates of already-seen literals, detects tautologies and
/// root-true literals. On `Trivial`, marks and the scratchpad are already
/// cleared and the caller must do nothing further. On `Canonical`, the
/// surviving literals are in `ctx.part(PendingP).canonical()` and remain
/// marked; the caller must call [`clear_marks`] on every exit path.
pub fn normalize(mut ctx: partial!(Context, mut LiteralsP, mut PendingP)) -> Normalized {
    let (pending, mut ctx) = ctx.split_part_mut(PendingP);
    pending.canonical.clear();

    let mut trivial = false;

    for &lit in pending.lits.iter() {
        let literals = ctx.part_mut(LiteralsP);
        if literals.mark(lit) {
            // duplicate of a literal already kept: drop it
            continue;
        }
        if literals.value(lit) > 0 {
            trivial = true;
            break;
        }
        if literals.mark(!lit) {
            trivial = true;
            break;
        }
        literals.set_mark(lit, true);
        pending.canonical.push(lit);
    }

    if trivial {
        clear_marks(ctx.borrow(), pending.canonical.as_slice());
        pending.clear();
        Normalized::Trivial
    } else {
        Normalized::Canonical
    }
}

/// Clears marks for exactly the literals that were marked by [`normalize`].
///
/// Brackets every verb handler's exit paths, matching the scratch-mark
/// discipline the checker relies on: marks must be zero outside a single
/// verb's handler.
pub fn clear_marks(mut ctx: partial!(Context, mut LiteralsP), lits: &[Lit]) {
    let literals = ctx.part_mut(LiteralsP);
    for &lit in lits {
        literals.set_mark(lit, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partial_ref::IntoPartialRefMut;

    #[test]
    fn drops_duplicates() {
        let mut target = Context::default();
        let a = target.literals.import(1).unwrap();
        target.pending.push_literal(a);
        target.pending.push_literal(a);

        let mut ctx = target.into_partial_ref_mut();
        let outcome = normalize(ctx.borrow());
        assert_eq!(outcome, Normalized::Canonical);
        assert_eq!(ctx.part(PendingP).canonical(), &[a]);
    }

    #[test]
    fn detects_tautology() {
        let mut target = Context::default();
        let a = target.literals.import(1).unwrap();
        let not_a = target.literals.import(-1).unwrap();
        target.pending.push_literal(a);
        target.pending.push_literal(not_a);

        let mut ctx = target.into_partial_ref_mut();
        let outcome = normalize(ctx.borrow());
        assert_eq!(outcome, Normalized::Trivial);
        assert!(ctx.part(PendingP).canonical().is_empty());
    }
}

//! Literal/value space: external-literal import/export, per-literal
//! assigned values, scratch marks, and watch-list heads.
//!
//! Keeps the per-literal tables (`value`, `mark`, `watch_head`) wide enough
//! to index any literal ever seen and maps between external and internal
//! literal encodings.
use drup_formula::{ExternalLit, Lit};

use crate::clauses::ClauseRef;
use crate::CheckerError;

/// Tri-state truth value of a literal.
pub type Value = i8;

/// Per-literal tables, grown by doubling whenever a new variable appears.
#[derive(Default)]
pub struct Literals {
    /// `value[l] = -value[!l]` always holds.
    value: Vec<Value>,
    /// Scratch byte, zero outside a single verb's handler.
    mark: Vec<u8>,
    /// Head of the singly-linked watch list for each literal.
    watch_head: Vec<Option<ClauseRef>>,
}

impl Literals {
    /// Number of internal literals the tables currently index (always even).
    pub fn capacity(&self) -> usize {
        self.value.len()
    }

    /// Imports an external literal, growing the tables if needed.
    ///
    /// Rejects `e == 0` and `e == ExternalLit::MIN` as invalid usage.
    pub fn import(&mut self, e: ExternalLit) -> Result<Lit, CheckerError> {
        let lit = Lit::from_external(e).ok_or_else(|| CheckerError::InvalidUsage {
            operation: "add-literal",
            detail: format!("literal {} is not a valid non-zero literal", e),
        })?;
        self.ensure_capacity(lit);
        Ok(lit)
    }

    /// Exports an internal literal back to external (DIMACS) form.
    pub fn export(&self, lit: Lit) -> ExternalLit {
        lit.to_external()
    }

    /// Grows all three tables to the next power of two accommodating `lit`.
    pub fn ensure_capacity(&mut self, lit: Lit) {
        let needed = lit.code() + 1;
        if needed <= self.value.len() {
            return;
        }
        let mut new_cap = self.value.len().max(2);
        while new_cap < needed {
            new_cap *= 2;
        }
        self.value.resize(new_cap, 0);
        self.mark.resize(new_cap, 0);
        self.watch_head.resize(new_cap, None);
    }

    #[inline]
    pub fn value(&self, lit: Lit) -> Value {
        self.value.get(lit.code()).copied().unwrap_or(0)
    }

    #[inline]
    pub fn set_value(&mut self, lit: Lit, v: Value) {
        self.value[lit.code()] = v;
    }

    #[inline]
    pub fn mark(&self, lit: Lit) -> bool {
        self.mark.get(lit.code()).map_or(false, |&m| m != 0)
    }

    #[inline]
    pub fn set_mark(&mut self, lit: Lit, marked: bool) {
        self.mark[lit.code()] = marked as u8;
    }

    #[inline]
    pub fn watch_head(&self, lit: Lit) -> Option<ClauseRef> {
        self.watch_head.get(lit.code()).copied().flatten()
    }

    #[inline]
    pub fn set_watch_head(&mut self, lit: Lit, cref: Option<ClauseRef>) {
        self.watch_head[lit.code()] = cref;
    }

    /// Asserts the value-symmetry invariant, for tests.
    #[cfg(test)]
    pub fn check_symmetry(&self) {
        for code in (0..self.value.len()).step_by(2) {
            assert_eq!(self.value[code], -self.value[code + 1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drup_formula::Var;

    #[test]
    fn grows_by_doubling_and_preserves_content() {
        let mut lits = Literals::default();
        let l0 = lits.import(1).unwrap();
        lits.set_value(l0, 1);
        let before_cap = lits.capacity();

        let big = Lit::from_var(Var::from_index(1000), true);
        lits.ensure_capacity(big);

        assert!(lits.capacity() >= before_cap);
        assert!(lits.capacity().is_power_of_two());
        assert_eq!(lits.value(l0), 1);
    }

    #[test]
    fn rejects_zero_and_min() {
        let mut lits = Literals::default();
        assert!(matches!(
            lits.import(0),
            Err(CheckerError::InvalidUsage { .. })
        ));
        assert!(matches!(
            lits.import(ExternalLit::MIN),
            Err(CheckerError::InvalidUsage { .. })
        ));
    }
}

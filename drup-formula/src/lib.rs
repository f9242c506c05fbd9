//! Literal and variable encoding shared by the DRUP checker.
//!
//! This crate only defines the `Var`/`Lit` types and their external/internal
//! conversions. It has no knowledge of clauses, propagation or the checker's
//! verbs — those live in `drup-checker`.

pub mod lit;

pub use lit::{ExternalLit, Lit, LitIdx, Var};

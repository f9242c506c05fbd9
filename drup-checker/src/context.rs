//! Central checker data structure.
use partial_ref::{part, PartialRefTarget};

use crate::clauses::ClauseStore;
use crate::gc::GcSchedule;
use crate::literals::Literals;
use crate::pending::Pending;
use crate::state::CheckerState;
use crate::stats::Stats;
use crate::trail::Trail;

/// Part declarations for the [`Context`] struct.
pub mod parts {
    use super::*;

    part!(pub CheckerStateP: CheckerState);
    part!(pub ClauseStoreP: ClauseStore);
    part!(pub GcP: GcSchedule);
    part!(pub LiteralsP: Literals);
    part!(pub PendingP: Pending);
    part!(pub StatsP: Stats);
    part!(pub TrailP: Trail);
}

use parts::*;

/// Central checker data structure.
///
/// Most functions operating on multiple fields of the context take partial
/// references provided by the `partial_ref` crate, which documents each
/// function's data dependencies and lets the borrow checker see through the
/// split without threading individual `&mut` fields by hand.
#[derive(PartialRefTarget, Default)]
pub struct Context {
    #[part(CheckerStateP)]
    pub checker_state: CheckerState,
    #[part(ClauseStoreP)]
    pub clauses: ClauseStore,
    #[part(GcP)]
    pub gc: GcSchedule,
    #[part(LiteralsP)]
    pub literals: Literals,
    #[part(PendingP)]
    pub pending: Pending,
    #[part(StatsP)]
    pub stats: Stats,
    #[part(TrailP)]
    pub trail: Trail,
}

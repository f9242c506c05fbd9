//! Checker statistics, reported at teardown when verbose mode is enabled.
use std::fmt;

/// Counters maintained across the lifetime of a checker, reported at
/// teardown when verbose mode is enabled.
#[derive(Default)]
pub struct Stats {
    pub originals_added: u64,
    pub learned_checked: u64,
    pub deletions_processed: u64,
    pub clauses_collected: u64,
    pub collections_performed: u64,
}

impl Stats {
    fn percentage(part: u64, total: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            100.0 * part as f64 / total as f64
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_added = self.originals_added + self.learned_checked;
        writeln!(f, "checker statistics:")?;
        writeln!(
            f,
            "  originals added:      {:>10} ({:5.1}%)",
            self.originals_added,
            Self::percentage(self.originals_added, total_added)
        )?;
        writeln!(
            f,
            "  learned checked:      {:>10} ({:5.1}%)",
            self.learned_checked,
            Self::percentage(self.learned_checked, total_added)
        )?;
        writeln!(f, "  deletions processed:  {:>10}", self.deletions_processed)?;
        writeln!(f, "  clauses collected:    {:>10}", self.clauses_collected)?;
        write!(f, "  collections performed:{:>10}", self.collections_performed)
    }
}

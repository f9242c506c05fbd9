//! Global checker state: the consistency latch and the optional-mode flags.

/// Mode flags and the consistency latch, shared across every verb.
#[derive(Default)]
pub struct CheckerState {
    /// Once set, never cleared. Further verbs are accepted but become
    /// no-ops except for clause-draining.
    pub inconsistent: bool,
    pub verbose: bool,
    pub logging: bool,
    pub leak_check: bool,
}

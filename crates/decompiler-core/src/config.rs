//! Tunables for a decompiler run.

/// Default number of instructions decoded per pass before giving up.
pub const DEFAULT_STEP_LIMIT: usize = 10_000;

/// Default number of recent program counters kept for failure reports.
pub const DEFAULT_TRACE_LENGTH: usize = 10;

/// Default cap on passes run by [`crate::Decompiler::decode_to_fixpoint`].
pub const DEFAULT_MAX_PASSES: usize = 64;

/// Immutable configuration for a decompiler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DecompilerConfig {
    /// Instructions decoded per pass before the pass stops unfinished.
    pub step_limit: usize,
    /// Recent program counters logged when decoding fails.
    pub trace_length: usize,
    /// Upper bound on passes when iterating to a fixpoint.
    pub max_passes: usize,
}

impl Default for DecompilerConfig {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            trace_length: DEFAULT_TRACE_LENGTH,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl DecompilerConfig {
    /// Returns a copy with a different per-pass step limit.
    #[must_use]
    pub const fn with_step_limit(self, step_limit: usize) -> Self {
        Self { step_limit, ..self }
    }
}

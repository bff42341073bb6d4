use crate::fault::FaultClass;

/// Lifecycle of one decode pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Decoding is in progress.
    #[default]
    Running,
    /// No reachable instruction remains in this pass.
    Finished,
    /// A fatal decode failure stopped the pass.
    Failed(FaultClass),
}

impl RunState {
    /// Returns `true` once the pass can make no further progress.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::RunState;
    use crate::fault::FaultClass;

    #[test]
    fn run_state_default_is_running() {
        assert_eq!(RunState::default(), RunState::Running);
        assert!(!RunState::Running.is_terminal());
    }

    #[test]
    fn finished_and_failed_are_terminal() {
        assert!(RunState::Finished.is_terminal());
        assert!(RunState::Failed(FaultClass::Decode).is_terminal());
    }
}

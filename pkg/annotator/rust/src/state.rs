// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fmt;

/// Lifecycle of the process-wide hosting runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeState {
    /// Never booted in this process.
    #[default]
    Vacant,
    /// Booted and accepting engine work.
    Running,
    /// Torn down. Terminal for the lifetime of the process.
    TornDown,
}

impl RuntimeState {
    pub fn is_running(self) -> bool {
        self == RuntimeState::Running
    }

    pub(crate) fn can_transition_to(self, next: RuntimeState) -> bool {
        use RuntimeState::*;
        matches!((self, next), (Vacant, Running) | (Running, TornDown))
    }
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeState::Vacant => write!(f, "vacant"),
            RuntimeState::Running => write!(f, "running"),
            RuntimeState::TornDown => write!(f, "torn down"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_vacant() {
        assert_eq!(RuntimeState::default(), RuntimeState::Vacant);
        assert!(!RuntimeState::default().is_running());
    }

    #[test]
    fn test_allowed_transitions() {
        use RuntimeState::*;
        assert!(Vacant.can_transition_to(Running));
        assert!(Running.can_transition_to(TornDown));
    }

    #[test]
    fn test_torn_down_is_terminal() {
        use RuntimeState::*;
        for next in [Vacant, Running, TornDown] {
            assert!(!TornDown.can_transition_to(next), "torn down -> {next}");
        }
    }

    #[test]
    fn test_no_shortcuts() {
        use RuntimeState::*;
        assert!(!Vacant.can_transition_to(TornDown));
        assert!(!Running.can_transition_to(Running));
        assert!(!Running.can_transition_to(Vacant));
    }

    #[test]
    fn test_display() {
        assert_eq!(RuntimeState::Vacant.to_string(), "vacant");
        assert_eq!(RuntimeState::Running.to_string(), "running");
        assert_eq!(RuntimeState::TornDown.to_string(), "torn down");
    }
}

//! Driver session states and the transition table.

use std::fmt;

/// State of a device driver session.
///
/// A driver starts in [`Initializing`](DriverState::Initializing), spends
/// most of its life in [`Ready`](DriverState::Ready), and cycles through the
/// intermediate states while an operation is in flight. Any internally
/// signaled failure collapses to [`Error`](DriverState::Error); transport
/// loss lands in [`Disconnected`](DriverState::Disconnected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverState {
    /// Session constructed, vendor init commands not yet sent.
    Initializing,
    /// Idle; the only state that accepts new operations.
    Ready,
    /// An operational command is awaiting its prompt.
    ExecutingCommand,
    /// Enter-config commands sent, awaiting the config-mode prompt.
    EnteringConfig,
    /// In configuration mode, deciding what to send next.
    ConfigMode,
    /// Sending queued configuration lines one prompt at a time.
    ApplyingConfig,
    /// Commit command sequence in progress.
    Committing,
    /// Commit failed; abort command sequence in progress.
    AbortingConfig,
    /// Explicit rollback command sequence emitted, awaiting a prompt.
    RollingBack,
    /// Invalid transition or internal failure; recoverable to Ready.
    Error,
    /// Transport gone. Terminal for the session until reset.
    Disconnected,
}

impl DriverState {
    /// All states, for exhaustive table checks.
    pub const ALL: [DriverState; 11] = [
        DriverState::Initializing,
        DriverState::Ready,
        DriverState::ExecutingCommand,
        DriverState::EnteringConfig,
        DriverState::ConfigMode,
        DriverState::ApplyingConfig,
        DriverState::Committing,
        DriverState::AbortingConfig,
        DriverState::RollingBack,
        DriverState::Error,
        DriverState::Disconnected,
    ];

    /// Snake_case name used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            DriverState::Initializing => "initializing",
            DriverState::Ready => "ready",
            DriverState::ExecutingCommand => "executing_command",
            DriverState::EnteringConfig => "entering_config",
            DriverState::ConfigMode => "config_mode",
            DriverState::ApplyingConfig => "applying_config",
            DriverState::Committing => "committing",
            DriverState::AbortingConfig => "aborting_config",
            DriverState::RollingBack => "rolling_back",
            DriverState::Error => "error",
            DriverState::Disconnected => "disconnected",
        }
    }

    /// Whether the session log accumulates in this state.
    ///
    /// Only the multi-step configuration/rollback states record the raw
    /// transcript; single commands and idle states do not.
    pub fn is_config_sequence(self) -> bool {
        matches!(
            self,
            DriverState::EnteringConfig
                | DriverState::ConfigMode
                | DriverState::ApplyingConfig
                | DriverState::Committing
                | DriverState::AbortingConfig
                | DriverState::RollingBack
        )
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check whether a state move is allowed by the transition table.
///
/// Self-transitions are not in the table; the step function stays in a state
/// by simply not transitioning (e.g. `ApplyingConfig` across several queued
/// lines).
pub fn is_valid_transition(from: DriverState, to: DriverState) -> bool {
    use DriverState::*;

    match from {
        Initializing => matches!(to, Ready | Error | Disconnected),
        Ready => matches!(
            to,
            ExecutingCommand | EnteringConfig | RollingBack | Error | Disconnected
        ),
        ExecutingCommand => matches!(to, Ready | Error | Disconnected),
        EnteringConfig => matches!(to, ConfigMode | Error | Disconnected),
        ConfigMode => matches!(
            to,
            ApplyingConfig | AbortingConfig | Committing | Ready | Error | Disconnected
        ),
        ApplyingConfig => matches!(to, Committing | Error | Disconnected),
        Committing => matches!(to, Ready | AbortingConfig | Error | Disconnected),
        AbortingConfig => matches!(to, Ready | Error | Disconnected),
        RollingBack => matches!(to, Ready | Error | Disconnected),
        Error => matches!(to, Ready | Disconnected),
        Disconnected => matches!(to, Initializing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DriverState::*;

    /// The allowed-successor table, written out once more so the predicate
    /// is checked against an independent statement of it.
    fn allowed(from: DriverState) -> Vec<DriverState> {
        match from {
            Initializing => vec![Ready, Error, Disconnected],
            Ready => vec![ExecutingCommand, EnteringConfig, RollingBack, Error, Disconnected],
            ExecutingCommand => vec![Ready, Error, Disconnected],
            EnteringConfig => vec![ConfigMode, Error, Disconnected],
            ConfigMode => vec![
                ApplyingConfig,
                AbortingConfig,
                Committing,
                Ready,
                Error,
                Disconnected,
            ],
            ApplyingConfig => vec![Committing, Error, Disconnected],
            Committing => vec![Ready, AbortingConfig, Error, Disconnected],
            AbortingConfig => vec![Ready, Error, Disconnected],
            RollingBack => vec![Ready, Error, Disconnected],
            Error => vec![Ready, Disconnected],
            Disconnected => vec![Initializing],
        }
    }

    #[test]
    fn test_transition_table_exhaustive() {
        for from in DriverState::ALL {
            let expect = allowed(from);
            for to in DriverState::ALL {
                assert_eq!(
                    is_valid_transition(from, to),
                    expect.contains(&to),
                    "transition {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_no_self_transitions() {
        for state in DriverState::ALL {
            assert!(!is_valid_transition(state, state), "{state} -> {state}");
        }
    }

    #[test]
    fn test_state_names() {
        assert_eq!(Ready.as_str(), "ready");
        assert_eq!(ExecutingCommand.as_str(), "executing_command");
        assert_eq!(EnteringConfig.as_str(), "entering_config");
        assert_eq!(RollingBack.as_str(), "rolling_back");
        assert_eq!(format!("{Disconnected}"), "disconnected");
    }

    #[test]
    fn test_config_sequence_states() {
        let config_states = [
            EnteringConfig,
            ConfigMode,
            ApplyingConfig,
            Committing,
            AbortingConfig,
            RollingBack,
        ];
        for state in DriverState::ALL {
            assert_eq!(
                state.is_config_sequence(),
                config_states.contains(&state),
                "{state}"
            );
        }
    }
}

//! Per-iteration state machine for a clock probe.
//!
//! A probe walks strictly forward:
//! UNCONFIGURED → CONFIGURED → INITIALIZED → WAVEFORM_BUILT →
//! WAVEFORM_CREATED → TRANSMITTING → POLLING → COMPLETED → TORN_DOWN
//!
//! Once the hardware is initialised, any state may jump to TORN_DOWN so
//! that a failing step still releases the hardware.

use crate::error::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// States of a single probe iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeState {
    /// Nothing has been sent to the hardware yet.
    #[default]
    Unconfigured,
    /// Clock source and sample granularity handed to the hardware layer.
    Configured,
    /// Hardware interface initialised; teardown is now owed.
    Initialized,
    /// Probe pulses accepted by the hardware layer.
    WaveformBuilt,
    /// Waveform resource created and identified.
    WaveformCreated,
    /// One-shot transmission accepted.
    Transmitting,
    /// Waiting for the hardware to report completion.
    Polling,
    /// Hardware reported the waveform as finished.
    Completed,
    /// Waveforms cleared and hardware terminated.
    TornDown,
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "UNCONFIGURED"),
            Self::Configured => write!(f, "CONFIGURED"),
            Self::Initialized => write!(f, "INITIALIZED"),
            Self::WaveformBuilt => write!(f, "WAVEFORM_BUILT"),
            Self::WaveformCreated => write!(f, "WAVEFORM_CREATED"),
            Self::Transmitting => write!(f, "TRANSMITTING"),
            Self::Polling => write!(f, "POLLING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::TornDown => write!(f, "TORN_DOWN"),
        }
    }
}

impl ProbeState {
    /// Check if a transition to `target` is valid from the current state.
    #[must_use]
    pub fn can_transition_to(&self, target: ProbeState) -> bool {
        use ProbeState::{
            Completed, Configured, Initialized, Polling, TornDown, Transmitting, Unconfigured,
            WaveformBuilt, WaveformCreated,
        };

        matches!(
            (self, target),
            (Unconfigured, Configured)
                | (Configured, Initialized)
                | (Initialized, WaveformBuilt)
                | (WaveformBuilt, WaveformCreated)
                | (WaveformCreated, Transmitting)
                | (Transmitting, Polling)
                | (Polling, Completed)
        ) || (self.holds_hardware() && target == TornDown)
    }

    /// Returns true while the hardware interface is initialised.
    #[must_use]
    pub fn holds_hardware(&self) -> bool {
        !matches!(
            self,
            Self::Unconfigured | Self::Configured | Self::TornDown
        )
    }
}

/// State tracker for one probe iteration.
#[derive(Debug, Clone, Default)]
pub struct ProbeStateMachine {
    current: ProbeState,
    previous: Option<ProbeState>,
}

impl ProbeStateMachine {
    /// Create a new state machine starting in UNCONFIGURED.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state.
    #[must_use]
    pub fn state(&self) -> ProbeState {
        self.current
    }

    /// Get the previous state (if any transition occurred).
    #[must_use]
    pub fn previous_state(&self) -> Option<ProbeState> {
        self.previous
    }

    /// Attempt a state transition.
    pub fn transition(&mut self, target: ProbeState) -> ProbeResult<()> {
        if self.current.can_transition_to(target) {
            self.previous = Some(self.current);
            self.current = target;
            Ok(())
        } else {
            Err(ProbeError::InvalidStateTransition {
                from: self.current.to_string(),
                to: target.to_string(),
            })
        }
    }
}

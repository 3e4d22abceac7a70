use crate::clock::ClockSource;
use thiserror::Error;

/// Exit status used when the probe itself hits an impossible state.
pub const EXIT_INTERNAL: u8 = 70;

/// Fatal probe failures, one variant per failing step.
///
/// None of these are retried: any of them aborts the whole run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// Hardware interface initialisation failed.
    #[error("hardware initialisation failed for {clock} clock (status {status})")]
    Init {
        /// Clock source being configured.
        clock: ClockSource,
        /// Raw status returned by the hardware layer.
        status: i32,
    },

    /// Starting a new waveform was refused.
    #[error("error at wave add new (status {status})")]
    WaveAddNew {
        /// Raw status returned by the hardware layer.
        status: i32,
    },

    /// The hardware did not accept every pulse of the probe waveform.
    #[error("error at wave add generic: {accepted} of {expected} pulses accepted")]
    WaveAddGeneric {
        /// Pulse count (or negative status) reported by the hardware layer.
        accepted: i32,
        /// Pulses submitted.
        expected: usize,
    },

    /// Waveform creation returned a negative identifier.
    #[error("error at wave create (status {status})")]
    WaveCreate {
        /// Raw status returned by the hardware layer.
        status: i32,
    },

    /// One-shot transmission was not accepted.
    #[error("error at wave transmit (status {status})")]
    WaveSend {
        /// Raw status returned by the hardware layer.
        status: i32,
    },

    /// Transmission still active after the configured poll timeout.
    #[error("{clock} clock waveform still transmitting after {waited_ticks} ticks")]
    PollTimeout {
        /// Clock source being probed.
        clock: ClockSource,
        /// Ticks elapsed since transmission started.
        waited_ticks: u32,
    },

    /// Invalid probe state transition attempted.
    #[error("invalid probe state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Source state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

impl ProbeError {
    /// Process exit status for this failure.
    ///
    /// Initialisation failures encode the source: `(peripheral + 1) * 10`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Init { clock, .. } => match clock {
                ClockSource::Pwm => 10,
                ClockSource::Pcm => 20,
            },
            Self::WaveAddNew { .. } => 1,
            Self::WaveAddGeneric { .. } => 2,
            Self::WaveCreate { .. } => 3,
            Self::WaveSend { .. } => 4,
            Self::PollTimeout { .. } => 5,
            Self::InvalidStateTransition { .. } => EXIT_INTERNAL,
        }
    }
}

/// Convenience type alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

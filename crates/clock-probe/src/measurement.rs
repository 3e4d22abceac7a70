//! Tick arithmetic and the per-source probe result.

use clock_common::{ClockSource, Verdict, VerdictBands};
use serde::Serialize;

/// Two tick samples bracketing one transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Tick sampled right after the transmission was started.
    pub start_tick: u32,
    /// Tick sampled right after the hardware reported completion.
    pub end_tick: u32,
    /// Ticks the waveform should take on a healthy clock.
    pub expected_ticks: u32,
}

impl Measurement {
    /// Elapsed ticks. The counter wraps, so this is a wrapping difference.
    #[must_use]
    pub fn elapsed_ticks(&self) -> u32 {
        self.end_tick.wrapping_sub(self.start_tick)
    }

    /// Observed over expected ticks.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        f64::from(self.elapsed_ticks()) / f64::from(self.expected_ticks)
    }
}

/// Result of probing one clock source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbeReport {
    /// Source probed.
    pub clock: ClockSource,
    /// Observed ticks.
    pub elapsed_ticks: u32,
    /// Nominal ticks.
    pub expected_ticks: u32,
    /// `elapsed_ticks / expected_ticks`.
    pub ratio: f64,
    /// Classification of `ratio`.
    pub verdict: Verdict,
}

impl ProbeReport {
    /// Classify a measurement.
    #[must_use]
    pub fn new(clock: ClockSource, measurement: &Measurement, bands: &VerdictBands) -> Self {
        let ratio = measurement.ratio();
        Self {
            clock,
            elapsed_ticks: measurement.elapsed_ticks(),
            expected_ticks: measurement.expected_ticks,
            ratio,
            verdict: bands.classify(ratio),
        }
    }
}

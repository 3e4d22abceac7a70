//! Classification of a measured timing ratio.
//!
//! The ratio is observed elapsed ticks divided by the programmed duration.
//! A healthy clock lands near 1.0; a clock running at half its nominal
//! rate stretches every delay and lands near 2.0.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a clock probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Ratio within the nominal band.
    Nominal,
    /// Ratio within the half-speed band: every delay is doubled.
    HalfSpeed,
    /// Ratio outside both bands.
    Corrupt,
}

impl Verdict {
    /// Human-readable verdict line, as printed after the measurement.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Nominal => "clock is OK",
            Self::HalfSpeed => "clock is at half speed. all delays are doubled!",
            Self::Corrupt => "clock is corrupt!",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nominal => write!(f, "nominal"),
            Self::HalfSpeed => write!(f, "half_speed"),
            Self::Corrupt => write!(f, "corrupt"),
        }
    }
}

/// Inclusive ratio interval `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Band {
    /// Lower edge (inclusive).
    pub low: f64,
    /// Upper edge (inclusive).
    pub high: f64,
}

impl Band {
    /// Create a band from its two inclusive edges.
    #[must_use]
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Whether `ratio` lies within the band, edges included.
    #[must_use]
    pub fn contains(&self, ratio: f64) -> bool {
        self.low <= ratio && ratio <= self.high
    }
}

impl From<[f64; 2]> for Band {
    fn from([low, high]: [f64; 2]) -> Self {
        Self { low, high }
    }
}

impl From<Band> for [f64; 2] {
    fn from(band: Band) -> Self {
        [band.low, band.high]
    }
}

/// The two acceptance bands used to classify a ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictBands {
    /// Ratios treated as a healthy clock.
    pub nominal: Band,
    /// Ratios treated as a clock running at half rate.
    pub half_speed: Band,
}

impl Default for VerdictBands {
    fn default() -> Self {
        Self {
            nominal: Band::new(0.8, 1.5),
            half_speed: Band::new(1.8, 2.2),
        }
    }
}

impl VerdictBands {
    /// Classify a ratio. The nominal band is checked first.
    #[must_use]
    pub fn classify(&self, ratio: f64) -> Verdict {
        if self.nominal.contains(ratio) {
            Verdict::Nominal
        } else if self.half_speed.contains(ratio) {
            Verdict::HalfSpeed
        } else {
            Verdict::Corrupt
        }
    }
}

/// Classify a ratio against the default bands.
#[must_use]
pub fn classify(ratio: f64) -> Verdict {
    VerdictBands::default().classify(ratio)
}

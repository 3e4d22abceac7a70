//! Clock sources and command-line clock selection.
//!
//! The hardware layer can derive its sampling clock from one of two
//! mutually exclusive peripherals. A run probes one or both of them,
//! always in peripheral order.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Hardware peripheral used to pace the waveform engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockSource {
    /// PWM-derived clock (peripheral 0).
    Pwm,
    /// PCM-derived clock (peripheral 1).
    Pcm,
}

impl ClockSource {
    /// All sources in probe order.
    pub const ALL: [ClockSource; 2] = [ClockSource::Pwm, ClockSource::Pcm];

    /// Peripheral index as understood by the hardware layer.
    #[must_use]
    pub fn peripheral(self) -> u32 {
        match self {
            Self::Pwm => 0,
            Self::Pcm => 1,
        }
    }

    /// Map a normalized selector (0 or nonzero) to a source.
    #[must_use]
    pub fn from_selector(value: i64) -> Self {
        if value == 0 {
            Self::Pwm
        } else {
            Self::Pcm
        }
    }
}

impl fmt::Display for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pwm => write!(f, "PWM"),
            Self::Pcm => write!(f, "PCM"),
        }
    }
}

/// Which clock sources a run should probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockSelection {
    /// Probe PWM then PCM.
    #[default]
    Both,
    /// Probe a single source.
    Only(ClockSource),
}

impl ClockSelection {
    /// Sources to probe, in order.
    #[must_use]
    pub fn sources(self) -> Vec<ClockSource> {
        match self {
            Self::Both => ClockSource::ALL.to_vec(),
            Self::Only(source) => vec![source],
        }
    }
}

impl FromStr for ClockSelection {
    type Err = Infallible;

    /// Parse the positional clock argument.
    ///
    /// `pcm` and `pwm` are matched literally. Anything else is read as an
    /// integer (leading numeric prefix, 0 when absent) and normalized so
    /// that zero means PWM and any other value means PCM.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pcm" => return Ok(Self::Only(ClockSource::Pcm)),
            "pwm" => return Ok(Self::Only(ClockSource::Pwm)),
            _ => {}
        }

        let value = match s.trim().parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                let value = leading_integer(s);
                warn!(
                    argument = s,
                    value, "clock argument is not a number, using its leading integer"
                );
                value
            }
        };

        Ok(Self::Only(ClockSource::from_selector(value)))
    }
}

/// Leading integer of `s`, reduced to its sign bit of information.
///
/// Skips leading whitespace, accepts one optional sign, then reads digits.
/// Returns 0 when there are no digits or all of them are zero, and 1
/// otherwise, so arbitrarily long digit runs cannot overflow.
fn leading_integer(s: &str) -> i64 {
    let rest = s.trim_start();
    let rest = rest
        .strip_prefix('-')
        .or_else(|| rest.strip_prefix('+'))
        .unwrap_or(rest);

    let nonzero = rest
        .chars()
        .take_while(char::is_ascii_digit)
        .any(|c| c != '0');

    i64::from(nonzero)
}

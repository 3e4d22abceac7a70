//! The two-pulse probe waveform.

use clock_common::PROBE_PULSES;
use clock_hal::Pulse;

/// Two idle pulses of equal hold time.
///
/// No GPIO line is switched: only the timing of the waveform engine is
/// being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeWaveform {
    pulses: [Pulse; PROBE_PULSES as usize],
}

impl ProbeWaveform {
    /// Build the waveform with each pulse holding for `delay_micros`.
    #[must_use]
    pub fn new(delay_micros: u32) -> Self {
        Self {
            pulses: [Pulse::idle(delay_micros); PROBE_PULSES as usize],
        }
    }

    /// Pulses in transmission order.
    #[must_use]
    pub fn pulses(&self) -> &[Pulse] {
        &self.pulses
    }

    /// Duration of the whole waveform on a healthy clock, in ticks.
    #[must_use]
    pub fn nominal_ticks(&self) -> u32 {
        self.pulses
            .iter()
            .fold(0u32, |acc, p| acc.saturating_add(p.delay_micros))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_waveform_shape() {
        let wave = ProbeWaveform::new(25_000);
        assert_eq!(wave.pulses().len(), 2);
        for pulse in wave.pulses() {
            assert_eq!(pulse.gpio_on, 0);
            assert_eq!(pulse.gpio_off, 0);
            assert_eq!(pulse.delay_micros, 25_000);
        }
        assert_eq!(wave.nominal_ticks(), 50_000);
    }
}

//! Deterministic simulated waveform hardware.
//!
//! Time is a virtual microsecond counter: [`delay_micros`] advances it and
//! [`current_tick`] reads it, so a probe against this backend finishes
//! instantly and always measures the same ratio. A transmission stays busy
//! for the sum of its pulse delays multiplied by the slow-down factor of
//! the configured clock source.
//!
//! [`delay_micros`]: WaveHardware::delay_micros
//! [`current_tick`]: WaveHardware::current_tick

use crate::{Pulse, WaveHardware};
use clock_common::{ClockSource, SimulatedConfig, VALID_SAMPLE_MICROS};
use tracing::{debug, trace};

/// Raw statuses returned by the simulated layer.
pub mod status {
    /// Generic initialisation failure.
    pub const INIT_FAILED: i32 = -1;
    /// Call requires an initialised interface.
    pub const NOT_INITIALISED: i32 = -31;
    /// Interface is already initialised.
    pub const ALREADY_INITIALISED: i32 = -32;
    /// Unsupported sample granularity.
    pub const BAD_CLOCK_MICROS: i32 = -67;
    /// Unknown waveform id.
    pub const BAD_WAVE_ID: i32 = -66;
    /// Waveform has no pulses.
    pub const EMPTY_WAVEFORM: i32 = -69;
    /// Waveform storage exhausted.
    pub const NO_WAVEFORM_ID: i32 = -70;
}

/// Failure modes that can be injected into [`SimulatedHardware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimFault {
    /// `initialise` fails while this source is configured.
    InitFails(ClockSource),
    /// `wave_add_new` returns a failure status.
    AddNewFails,
    /// `wave_add_generic` accepts one pulse fewer than submitted.
    GenericShortfall,
    /// `wave_create` returns a negative id.
    CreateFails,
    /// `wave_send_once` returns zero.
    SendRejected,
    /// Transmission never reports completion.
    NeverCompletes,
}

/// Call counters kept by the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Successful `initialise` calls.
    pub initialises: u32,
    /// `terminate` calls that released an initialised interface.
    pub terminates: u32,
    /// `wave_clear` calls.
    pub clears: u32,
    /// Accepted transmissions.
    pub sends: u32,
    /// `wave_busy` calls.
    pub polls: u64,
}

#[derive(Debug, Clone, Copy)]
struct Transmission {
    start: u32,
    duration: u32,
}

/// In-process stand-in for the waveform/clock hardware layer.
#[derive(Debug)]
pub struct SimulatedHardware {
    pwm_scale: f64,
    pcm_scale: f64,
    faults: Vec<SimFault>,
    clock: (u32, ClockSource),
    initialised: bool,
    now: u32,
    building: Vec<Pulse>,
    waves: Vec<Vec<Pulse>>,
    transmission: Option<Transmission>,
    stats: SimStats,
    calls: Vec<&'static str>,
}

impl Default for SimulatedHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedHardware {
    /// Create a simulation with healthy clocks and the tick counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pwm_scale: 1.0,
            pcm_scale: 1.0,
            faults: Vec::new(),
            // Hardware default: 5us sampling paced by PCM.
            clock: (5, ClockSource::Pcm),
            initialised: false,
            now: 0,
            building: Vec::new(),
            waves: Vec::new(),
            transmission: None,
            stats: SimStats::default(),
            calls: Vec::new(),
        }
    }

    /// Create a simulation from configuration.
    #[must_use]
    pub fn from_config(config: &SimulatedConfig) -> Self {
        Self::new()
            .with_scale(ClockSource::Pwm, config.pwm_scale)
            .with_scale(ClockSource::Pcm, config.pcm_scale)
    }

    /// Set the slow-down factor of one clock source.
    #[must_use]
    pub fn with_scale(mut self, source: ClockSource, scale: f64) -> Self {
        match source {
            ClockSource::Pwm => self.pwm_scale = scale,
            ClockSource::Pcm => self.pcm_scale = scale,
        }
        self
    }

    /// Start the tick counter at `tick`.
    #[must_use]
    pub fn with_start_tick(mut self, tick: u32) -> Self {
        self.now = tick;
        self
    }

    /// Inject a failure mode.
    #[must_use]
    pub fn with_fault(mut self, fault: SimFault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Call counters.
    #[must_use]
    pub fn stats(&self) -> SimStats {
        self.stats
    }

    /// Whether the interface is currently initialised.
    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Last clock configuration accepted.
    #[must_use]
    pub fn clock(&self) -> (u32, ClockSource) {
        self.clock
    }

    /// Names of the hardware calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }

    /// Number of live waveform resources.
    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    fn has_fault(&self, fault: SimFault) -> bool {
        self.faults.contains(&fault)
    }

    fn scale(&self) -> f64 {
        match self.clock.1 {
            ClockSource::Pwm => self.pwm_scale,
            ClockSource::Pcm => self.pcm_scale,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn scaled_duration(&self, pulses: &[Pulse]) -> u32 {
        let nominal: u64 = pulses.iter().map(|p| u64::from(p.delay_micros)).sum();
        let scaled = (nominal as f64 * self.scale()).round();
        if scaled >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            scaled as u32
        }
    }
}

impl WaveHardware for SimulatedHardware {
    fn configure_clock(&mut self, sample_micros: u32, source: ClockSource) -> i32 {
        self.calls.push("configure_clock");
        if self.initialised {
            return status::ALREADY_INITIALISED;
        }
        if !VALID_SAMPLE_MICROS.contains(&sample_micros) {
            return status::BAD_CLOCK_MICROS;
        }
        self.clock = (sample_micros, source);
        0
    }

    fn initialise(&mut self) -> i32 {
        self.calls.push("initialise");
        if self.initialised {
            return status::ALREADY_INITIALISED;
        }
        if self.has_fault(SimFault::InitFails(self.clock.1)) {
            debug!(clock = %self.clock.1, "simulated initialisation failure");
            return status::INIT_FAILED;
        }
        self.initialised = true;
        self.stats.initialises += 1;
        debug!(sample_micros = self.clock.0, clock = %self.clock.1, "simulated hardware initialised");
        // Version number, like the real layer.
        79
    }

    fn wave_add_new(&mut self) -> i32 {
        self.calls.push("wave_add_new");
        if !self.initialised {
            return status::NOT_INITIALISED;
        }
        if self.has_fault(SimFault::AddNewFails) {
            return status::INIT_FAILED;
        }
        self.building.clear();
        0
    }

    fn wave_add_generic(&mut self, pulses: &[Pulse]) -> i32 {
        self.calls.push("wave_add_generic");
        if !self.initialised {
            return status::NOT_INITIALISED;
        }
        let accepted = if self.has_fault(SimFault::GenericShortfall) {
            pulses.len().saturating_sub(1)
        } else {
            pulses.len()
        };
        self.building.extend_from_slice(&pulses[..accepted]);
        i32::try_from(self.building.len()).unwrap_or(i32::MAX)
    }

    fn wave_create(&mut self) -> i32 {
        self.calls.push("wave_create");
        if !self.initialised {
            return status::NOT_INITIALISED;
        }
        if self.building.is_empty() {
            return status::EMPTY_WAVEFORM;
        }
        if self.has_fault(SimFault::CreateFails) {
            return status::NO_WAVEFORM_ID;
        }
        let id = self.waves.len();
        self.waves.push(std::mem::take(&mut self.building));
        i32::try_from(id).unwrap_or(status::NO_WAVEFORM_ID)
    }

    fn wave_send_once(&mut self, wave_id: u32) -> i32 {
        self.calls.push("wave_send_once");
        if !self.initialised {
            return status::NOT_INITIALISED;
        }
        let Some(pulses) = self.waves.get(wave_id as usize) else {
            return status::BAD_WAVE_ID;
        };
        if self.has_fault(SimFault::SendRejected) {
            return 0;
        }
        let duration = self.scaled_duration(pulses);
        let blocks = i32::try_from(pulses.len()).unwrap_or(i32::MAX);
        self.transmission = Some(Transmission {
            start: self.now,
            duration,
        });
        self.stats.sends += 1;
        trace!(wave_id, duration, start = self.now, "simulated transmission started");
        blocks
    }

    fn wave_busy(&mut self) -> bool {
        self.stats.polls += 1;
        let Some(tx) = self.transmission else {
            return false;
        };
        if self.has_fault(SimFault::NeverCompletes) {
            return true;
        }
        if self.now.wrapping_sub(tx.start) < tx.duration {
            true
        } else {
            self.transmission = None;
            false
        }
    }

    fn current_tick(&mut self) -> u32 {
        self.now
    }

    fn delay_micros(&mut self, micros: u32) {
        self.now = self.now.wrapping_add(micros);
    }

    fn wave_clear(&mut self) -> i32 {
        self.calls.push("wave_clear");
        if !self.initialised {
            return status::NOT_INITIALISED;
        }
        self.stats.clears += 1;
        self.building.clear();
        self.waves.clear();
        self.transmission = None;
        0
    }

    fn terminate(&mut self) {
        self.calls.push("terminate");
        if self.initialised {
            self.stats.terminates += 1;
        }
        self.initialised = false;
        self.building.clear();
        self.waves.clear();
        self.transmission = None;
    }
}

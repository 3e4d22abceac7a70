//! Hardware boundary for the clock probe.
//!
//! This crate provides:
//! - [`WaveHardware`] trait mirroring the waveform/clock layer the probe drives
//! - [`simulated`] module with a deterministic in-process backend
//! - `pigpio` module (feature `pigpio`) binding the pigpio C library
//!
//! Methods return the layer's raw integer statuses. Interpreting them is
//! the prober's job, so every backend reports failures the same way.

pub mod simulated;

#[cfg(all(feature = "pigpio", target_os = "linux"))]
pub mod pigpio;

pub use simulated::*;

#[cfg(all(feature = "pigpio", target_os = "linux"))]
pub use pigpio::PigpioHardware;

use clock_common::ClockSource;
use thiserror::Error;

/// One step of a generic waveform.
///
/// Layout matches the hardware layer's pulse record so a slice can be
/// handed across FFI unchanged.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pulse {
    /// Bit mask of GPIO lines to switch on.
    pub gpio_on: u32,
    /// Bit mask of GPIO lines to switch off.
    pub gpio_off: u32,
    /// Delay before the next pulse, in microseconds.
    pub delay_micros: u32,
}

impl Pulse {
    /// A pulse that touches no lines and only holds for `delay_micros`.
    #[must_use]
    pub const fn idle(delay_micros: u32) -> Self {
        Self {
            gpio_on: 0,
            gpio_off: 0,
            delay_micros,
        }
    }
}

/// Waveform and clock hardware layer.
///
/// The layer is a process-wide singleton: `initialise` may only be called
/// after `configure_clock`, and at most once until `terminate`.
pub trait WaveHardware {
    /// Select the sample granularity and pacing peripheral.
    ///
    /// Must be called before [`initialise`](Self::initialise).
    fn configure_clock(&mut self, sample_micros: u32, source: ClockSource) -> i32;

    /// Initialise the hardware interface. Negative on failure.
    fn initialise(&mut self) -> i32;

    /// Start a new, empty waveform. Zero on success.
    fn wave_add_new(&mut self) -> i32;

    /// Append pulses to the waveform under construction.
    ///
    /// Returns the number of pulses now in the waveform, or a negative status.
    fn wave_add_generic(&mut self, pulses: &[Pulse]) -> i32;

    /// Turn the pending pulses into a waveform resource. Returns its id,
    /// or a negative status.
    fn wave_create(&mut self) -> i32;

    /// Transmit waveform `wave_id` once. Positive on success.
    fn wave_send_once(&mut self, wave_id: u32) -> i32;

    /// Whether a waveform is still being transmitted.
    fn wave_busy(&mut self) -> bool;

    /// Current value of the free-running microsecond tick counter.
    fn current_tick(&mut self) -> u32;

    /// Sleep for `micros` microseconds.
    fn delay_micros(&mut self, micros: u32);

    /// Delete every waveform resource.
    fn wave_clear(&mut self) -> i32;

    /// Release the hardware interface.
    fn terminate(&mut self);
}

impl<H: WaveHardware + ?Sized> WaveHardware for &mut H {
    fn configure_clock(&mut self, sample_micros: u32, source: ClockSource) -> i32 {
        (**self).configure_clock(sample_micros, source)
    }

    fn initialise(&mut self) -> i32 {
        (**self).initialise()
    }

    fn wave_add_new(&mut self) -> i32 {
        (**self).wave_add_new()
    }

    fn wave_add_generic(&mut self, pulses: &[Pulse]) -> i32 {
        (**self).wave_add_generic(pulses)
    }

    fn wave_create(&mut self) -> i32 {
        (**self).wave_create()
    }

    fn wave_send_once(&mut self, wave_id: u32) -> i32 {
        (**self).wave_send_once(wave_id)
    }

    fn wave_busy(&mut self) -> bool {
        (**self).wave_busy()
    }

    fn current_tick(&mut self) -> u32 {
        (**self).current_tick()
    }

    fn delay_micros(&mut self, micros: u32) {
        (**self).delay_micros(micros);
    }

    fn wave_clear(&mut self) -> i32 {
        (**self).wave_clear()
    }

    fn terminate(&mut self) {
        (**self).terminate();
    }
}

impl<H: WaveHardware + ?Sized> WaveHardware for Box<H> {
    fn configure_clock(&mut self, sample_micros: u32, source: ClockSource) -> i32 {
        (**self).configure_clock(sample_micros, source)
    }

    fn initialise(&mut self) -> i32 {
        (**self).initialise()
    }

    fn wave_add_new(&mut self) -> i32 {
        (**self).wave_add_new()
    }

    fn wave_add_generic(&mut self, pulses: &[Pulse]) -> i32 {
        (**self).wave_add_generic(pulses)
    }

    fn wave_create(&mut self) -> i32 {
        (**self).wave_create()
    }

    fn wave_send_once(&mut self, wave_id: u32) -> i32 {
        (**self).wave_send_once(wave_id)
    }

    fn wave_busy(&mut self) -> bool {
        (**self).wave_busy()
    }

    fn current_tick(&mut self) -> u32 {
        (**self).current_tick()
    }

    fn delay_micros(&mut self, micros: u32) {
        (**self).delay_micros(micros);
    }

    fn wave_clear(&mut self) -> i32 {
        (**self).wave_clear()
    }

    fn terminate(&mut self) {
        (**self).terminate();
    }
}

/// Errors acquiring a hardware backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HalError {
    /// Another handle to the process-wide hardware layer is alive.
    #[error("hardware layer already claimed by this process")]
    AlreadyClaimed,

    /// The requested backend was not compiled in.
    #[error("{0} backend not available in this build")]
    Unavailable(&'static str),
}

/// Convenience type alias for backend acquisition.
pub type HalResult<T> = Result<T, HalError>;

//! Scoped ownership of the initialised hardware layer.
//!
//! Opening a [`HardwareSession`] initialises the hardware; the session is
//! then the only way to reach the waveform calls. Dropping it clears every
//! waveform and terminates the interface, so early returns still release
//! the hardware before the next source is probed.

use clock_common::{ClockSource, ProbeError, ProbeResult};
use clock_hal::WaveHardware;
use tracing::{debug, warn};

/// Initialised hardware, released on drop.
#[derive(Debug)]
pub struct HardwareSession<'a, H: WaveHardware> {
    hw: &'a mut H,
    clock: ClockSource,
    released: bool,
}

impl<'a, H: WaveHardware> HardwareSession<'a, H> {
    /// Initialise the hardware for `clock`.
    ///
    /// The clock must already have been configured on `hw`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Init`] if the hardware reports a negative status.
    /// Nothing is held in that case, so no teardown happens.
    pub fn open(hw: &'a mut H, clock: ClockSource) -> ProbeResult<Self> {
        let status = hw.initialise();
        if status < 0 {
            return Err(ProbeError::Init { clock, status });
        }
        debug!(%clock, status, "hardware initialised");
        Ok(Self {
            hw,
            clock,
            released: false,
        })
    }

    /// Clock source this session was opened for.
    #[must_use]
    pub fn clock(&self) -> ClockSource {
        self.clock
    }

    /// Hardware calls available while initialised.
    pub fn hw(&mut self) -> &mut H {
        &mut *self.hw
    }

    /// Clear waveforms and terminate now.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let status = self.hw.wave_clear();
        if status < 0 {
            warn!(clock = %self.clock, status, "wave clear failed during teardown");
        }
        self.hw.terminate();
        debug!(clock = %self.clock, "hardware released");
    }
}

impl<H: WaveHardware> Drop for HardwareSession<'_, H> {
    fn drop(&mut self) {
        self.release();
    }
}

//! pigpio binding (feature `pigpio`, Linux only).
//!
//! pigpio keeps all hardware state in process-wide globals, so only one
//! [`PigpioHardware`] may exist at a time. The claim is taken in
//! [`PigpioHardware::acquire`] and released on drop.
//!
//! Requires `libpigpio` at link time and root privileges at runtime.

use crate::{HalError, HalResult, Pulse, WaveHardware};
use clock_common::ClockSource;
use libc::{c_int, c_uint};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// `PI_WAVE_MODE_ONE_SHOT`.
const WAVE_MODE_ONE_SHOT: c_uint = 0;

/// `PI_CLOCK_PLLD`. Ignored by current pigpio releases but still required.
const CLOCK_SOURCE_PLLD: c_uint = 0;

static CLAIMED: AtomicBool = AtomicBool::new(false);

#[link(name = "pigpio")]
extern "C" {
    fn gpioCfgClock(cfg_micros: c_uint, cfg_peripheral: c_uint, cfg_source: c_uint) -> c_int;
    fn gpioInitialise() -> c_int;
    fn gpioTerminate();
    fn gpioWaveAddNew() -> c_int;
    fn gpioWaveAddGeneric(num_pulses: c_uint, pulses: *mut Pulse) -> c_int;
    fn gpioWaveCreate() -> c_int;
    fn gpioWaveTxSend(wave_id: c_uint, wave_mode: c_uint) -> c_int;
    fn gpioWaveTxBusy() -> c_int;
    fn gpioWaveClear() -> c_int;
    fn gpioTick() -> u32;
    fn gpioDelay(micros: u32) -> u32;
}

/// Handle to the pigpio library.
#[derive(Debug)]
pub struct PigpioHardware {
    initialised: bool,
}

impl PigpioHardware {
    /// Claim the process-wide pigpio handle.
    ///
    /// # Errors
    ///
    /// Returns [`HalError::AlreadyClaimed`] if another handle is alive.
    pub fn acquire() -> HalResult<Self> {
        if CLAIMED.swap(true, Ordering::AcqRel) {
            return Err(HalError::AlreadyClaimed);
        }
        debug!("pigpio handle claimed");
        Ok(Self { initialised: false })
    }
}

impl Drop for PigpioHardware {
    fn drop(&mut self) {
        if self.initialised {
            warn!("pigpio handle dropped while initialised, terminating");
            // SAFETY: pigpio was initialised by this handle and nothing else can use it.
            unsafe { gpioTerminate() };
        }
        CLAIMED.store(false, Ordering::Release);
    }
}

impl WaveHardware for PigpioHardware {
    fn configure_clock(&mut self, sample_micros: u32, source: ClockSource) -> i32 {
        // SAFETY: plain integer arguments; pigpio validates them.
        unsafe { gpioCfgClock(sample_micros, source.peripheral(), CLOCK_SOURCE_PLLD) }
    }

    fn initialise(&mut self) -> i32 {
        // SAFETY: no pointers cross the boundary; exclusivity is held by this handle.
        let status = unsafe { gpioInitialise() };
        if status >= 0 {
            self.initialised = true;
        }
        status
    }

    fn wave_add_new(&mut self) -> i32 {
        // SAFETY: no arguments.
        unsafe { gpioWaveAddNew() }
    }

    fn wave_add_generic(&mut self, pulses: &[Pulse]) -> i32 {
        let Ok(count) = c_uint::try_from(pulses.len()) else {
            return -1;
        };
        // pigpio takes a mutable pointer but only reads the pulses.
        let mut owned = pulses.to_vec();
        // SAFETY: `Pulse` is `repr(C)` with the layout of `gpioPulse_t`, and
        // `owned` holds exactly `count` elements for the duration of the call.
        unsafe { gpioWaveAddGeneric(count, owned.as_mut_ptr()) }
    }

    fn wave_create(&mut self) -> i32 {
        // SAFETY: no arguments.
        unsafe { gpioWaveCreate() }
    }

    fn wave_send_once(&mut self, wave_id: u32) -> i32 {
        // SAFETY: plain integer arguments; pigpio validates the id.
        unsafe { gpioWaveTxSend(wave_id, WAVE_MODE_ONE_SHOT) }
    }

    fn wave_busy(&mut self) -> bool {
        // SAFETY: no arguments.
        unsafe { gpioWaveTxBusy() != 0 }
    }

    fn current_tick(&mut self) -> u32 {
        // SAFETY: no arguments.
        unsafe { gpioTick() }
    }

    fn delay_micros(&mut self, micros: u32) {
        // SAFETY: plain integer argument.
        unsafe {
            gpioDelay(micros);
        }
    }

    fn wave_clear(&mut self) -> i32 {
        // SAFETY: no arguments.
        unsafe { gpioWaveClear() }
    }

    fn terminate(&mut self) {
        if self.initialised {
            // SAFETY: pigpio was initialised by this handle.
            unsafe { gpioTerminate() };
            self.initialised = false;
        }
    }
}

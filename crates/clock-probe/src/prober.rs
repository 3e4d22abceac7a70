//! The clock prober.
//!
//! For each requested source the prober configures the clock, initialises
//! the hardware, transmits the two-pulse waveform once, and times it with
//! the hardware tick counter:
//!
//! 1. Configure clock (granularity, source), then initialise
//! 2. Add the two idle pulses and create the waveform
//! 3. Send it one-shot and sample the tick counter
//! 4. Poll until the hardware reports completion, sample again
//! 5. Clear waveforms and terminate, then classify the ratio
//!
//! Sources are probed strictly one after another; the hardware is never
//! held across iterations.

use crate::measurement::{Measurement, ProbeReport};
use crate::report::{write_header, write_report};
use crate::session::HardwareSession;
use crate::waveform::ProbeWaveform;
use clock_common::{
    ClockSelection, ClockSource, ProbeConfig, ProbeError, ProbeResult, ProbeState,
    ProbeStateMachine,
};
use clock_hal::WaveHardware;
use std::io::{self, Write};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Exit status when the report cannot be written.
pub const EXIT_OUTPUT: u8 = 74;

/// Failure of a multi-source run.
#[derive(Debug, Error)]
pub enum RunError {
    /// A probe step failed.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Writing the report failed.
    #[error("failed to write report")]
    Output(#[from] io::Error),
}

impl RunError {
    /// Process exit status for this failure.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Probe(e) => e.exit_code(),
            Self::Output(_) => EXIT_OUTPUT,
        }
    }
}

/// Measures clock sources on a hardware backend.
#[derive(Debug)]
pub struct Prober<H: WaveHardware> {
    hw: H,
    config: ProbeConfig,
}

impl<H: WaveHardware> Prober<H> {
    /// Create a prober for `hw`.
    pub fn new(hw: H, config: ProbeConfig) -> Self {
        Self { hw, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Borrow the backend.
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Take the backend back.
    pub fn into_inner(self) -> H {
        self.hw
    }

    /// Probe every source in `selection`, in order.
    ///
    /// Writes the header before each probe and the measurement after it.
    /// Stops at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProbeError`], or an I/O error from `out`.
    pub fn run<W: Write>(
        &mut self,
        selection: ClockSelection,
        out: &mut W,
    ) -> Result<Vec<ProbeReport>, RunError> {
        let mut reports = Vec::new();
        self.run_into(selection, out, &mut reports)?;
        Ok(reports)
    }

    /// Same as [`Prober::run`], but appends to `reports` so measurements
    /// taken before a failure stay available to the caller.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProbeError`], or an I/O error from `out`.
    pub fn run_into<W: Write>(
        &mut self,
        selection: ClockSelection,
        out: &mut W,
        reports: &mut Vec<ProbeReport>,
    ) -> Result<(), RunError> {
        for clock in selection.sources() {
            write_header(out, clock)?;
            out.flush()?;
            let report = self.probe(clock)?;
            write_report(out, &report)?;
            reports.push(report);
        }
        Ok(())
    }

    /// Probe one clock source.
    ///
    /// The hardware is released before this returns, whether the probe
    /// succeeded or not.
    ///
    /// # Errors
    ///
    /// Returns the [`ProbeError`] of the first failing step.
    pub fn probe(&mut self, clock: ClockSource) -> ProbeResult<ProbeReport> {
        let config = &self.config;
        let mut state = ProbeStateMachine::new();

        let status = self.hw.configure_clock(config.sample_micros, clock);
        if status < 0 {
            warn!(%clock, status, sample_micros = config.sample_micros, "clock configuration rejected");
        }
        state.transition(ProbeState::Configured)?;

        let mut session = HardwareSession::open(&mut self.hw, clock).inspect_err(|e| {
            error!(%clock, error = %e, "hardware initialisation failed");
        })?;
        state.transition(ProbeState::Initialized)?;

        let wave = ProbeWaveform::new(config.pulse_delay_micros());
        let (start_tick, end_tick) = match transmit_and_wait(&mut session, &wave, config, &mut state)
        {
            Ok(ticks) => ticks,
            Err(e) => {
                error!(%clock, state = %state.state(), error = %e, "probe failed, releasing hardware");
                return Err(e);
            }
        };

        session.close();
        state.transition(ProbeState::TornDown)?;

        let measurement = Measurement {
            start_tick,
            end_tick,
            expected_ticks: wave.nominal_ticks(),
        };
        let report = ProbeReport::new(clock, &measurement, &config.bands);
        info!(
            %clock,
            elapsed = report.elapsed_ticks,
            expected = report.expected_ticks,
            ratio = report.ratio,
            verdict = %report.verdict,
            "clock probed"
        );
        Ok(report)
    }
}

/// Build, send, and time the waveform. Returns the two tick samples.
fn transmit_and_wait<H: WaveHardware>(
    session: &mut HardwareSession<'_, H>,
    wave: &ProbeWaveform,
    config: &ProbeConfig,
    state: &mut ProbeStateMachine,
) -> ProbeResult<(u32, u32)> {
    let clock = session.clock();
    let hw = session.hw();

    let status = hw.wave_add_new();
    if status != 0 {
        return Err(ProbeError::WaveAddNew { status });
    }
    let pulses = wave.pulses();
    let accepted = hw.wave_add_generic(pulses);
    if usize::try_from(accepted).ok() != Some(pulses.len()) {
        return Err(ProbeError::WaveAddGeneric {
            accepted,
            expected: pulses.len(),
        });
    }
    state.transition(ProbeState::WaveformBuilt)?;

    let wave_id = hw.wave_create();
    let Ok(wave_id) = u32::try_from(wave_id) else {
        return Err(ProbeError::WaveCreate { status: wave_id });
    };
    state.transition(ProbeState::WaveformCreated)?;
    debug!(%clock, wave_id, "waveform created");

    let sent = hw.wave_send_once(wave_id);
    let start_tick = hw.current_tick();
    if sent <= 0 {
        return Err(ProbeError::WaveSend { status: sent });
    }
    state.transition(ProbeState::Transmitting)?;
    state.transition(ProbeState::Polling)?;

    let poll_interval = config.poll_interval_micros();
    let timeout = config.poll_timeout_ticks();
    while hw.wave_busy() {
        if let Some(limit) = timeout {
            let waited_ticks = hw.current_tick().wrapping_sub(start_tick);
            if waited_ticks > limit {
                return Err(ProbeError::PollTimeout {
                    clock,
                    waited_ticks,
                });
            }
        }
        hw.delay_micros(poll_interval);
    }
    let end_tick = hw.current_tick();
    state.transition(ProbeState::Completed)?;

    Ok((start_tick, end_tick))
}

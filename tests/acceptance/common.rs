//! Common utilities for acceptance tests.

#![allow(dead_code)] // Not every helper is used by every test module

use clock_common::{ClockSelection, ClockSource, ProbeConfig};
use clock_hal::{SimFault, SimulatedHardware, WaveHardware};
use clock_probe::{ProbeReport, Prober, RunError};
use std::path::Path;

/// Outcome of a complete run: reports or failure, plus everything written.
pub struct RunOutcome {
    /// Reports, or the error that aborted the run.
    pub result: Result<Vec<ProbeReport>, RunError>,
    /// Text written to the report stream.
    pub output: String,
}

impl RunOutcome {
    /// Exit status the binary would return.
    pub fn exit_code(&self) -> u8 {
        match &self.result {
            Ok(_) => 0,
            Err(e) => e.exit_code(),
        }
    }
}

/// Simulated hardware with the given slow-down factors.
pub fn simulated(pwm_scale: f64, pcm_scale: f64) -> SimulatedHardware {
    SimulatedHardware::new()
        .with_scale(ClockSource::Pwm, pwm_scale)
        .with_scale(ClockSource::Pcm, pcm_scale)
}

/// Simulated healthy hardware with one injected fault.
pub fn faulty(fault: SimFault) -> SimulatedHardware {
    SimulatedHardware::new().with_fault(fault)
}

/// Run a selection the way the binary does and capture the text report.
pub fn run_text<H: WaveHardware>(
    prober: &mut Prober<H>,
    selection: ClockSelection,
) -> RunOutcome {
    let mut out = Vec::new();
    let result = prober.run(selection, &mut out);
    RunOutcome {
        result,
        output: String::from_utf8(out).expect("report is UTF-8"),
    }
}

/// Parse a positional clock argument.
pub fn selection(arg: &str) -> ClockSelection {
    arg.parse().expect("clock argument parsing is infallible")
}

/// Check if running as root (pigpio needs /dev/mem).
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Check if this looks like a Raspberry Pi with GPIO access.
pub fn has_gpio_hardware() -> bool {
    Path::new("/dev/gpiomem").exists()
}

/// Check prerequisites for probing real hardware.
pub fn check_hardware_prerequisites() -> Result<(), String> {
    let mut errors = Vec::new();

    if !is_root() {
        errors.push("Not running as root - pigpio initialisation will fail");
    }
    if !has_gpio_hardware() {
        errors.push("/dev/gpiomem not found - not a Raspberry Pi");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}

/// Write `content` to a fresh temp file and load it as configuration.
pub fn config_from_file(content: &str) -> ProbeConfig {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    ProbeConfig::from_file(file.path()).expect("valid config")
}

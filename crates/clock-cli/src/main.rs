//! clock-check entry point.
//!
//! Probes the PWM and/or PCM clock that paces the GPIO waveform engine and
//! reports whether timed delays come out at their nominal length.

use anyhow::{Context, Result};
use clap::Parser;
use clock_common::{Backend, ClockSelection, ProbeConfig};
use clock_hal::{SimulatedHardware, WaveHardware};
use clock_probe::{write_json, Prober, RunError};
use std::convert::Infallible;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// Exit status for unreadable or invalid configuration.
const EXIT_CONFIG: u8 = 64;

/// Exit status when the hardware backend cannot be acquired.
const EXIT_UNAVAILABLE: u8 = 69;

/// clock-check command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "clock-check",
    about = "Check that the PWM/PCM clock driving GPIO waveforms runs at its nominal rate",
    version,
    long_about = None
)]
struct Args {
    /// Clock to test: `pwm`, `pcm`, or a number (0 = PWM, anything else = PCM).
    /// Both are tested when omitted.
    #[arg(value_name = "CLOCK", allow_negative_numbers = true)]
    clock: Option<String>,

    /// Path to a configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the simulated hardware backend.
    #[arg(long, short = 's')]
    simulated: bool,

    /// Print results as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "warn")]
    log_level: String,
}

/// A setup or probe failure with the exit status it maps to.
struct Failure {
    code: u8,
    error: anyhow::Error,
}

impl Failure {
    fn new(code: u8, error: impl Into<anyhow::Error>) -> Self {
        Self {
            code,
            error: error.into(),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(&args.log_level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("error: {:#}", failure.error);
            ExitCode::from(failure.code)
        }
    }
}

/// Initialize logging with the specified log level.
///
/// Logs go to stderr; stdout carries only the report.
fn init_logging(level: &str) {
    let filter = format!(
        "clock_check={},clock_probe={},clock_hal={},clock_common={}",
        level, level, level, level
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn run(args: &Args) -> Result<(), Failure> {
    let mut config = load_config(args).map_err(|e| Failure::new(EXIT_CONFIG, e))?;
    if args.simulated {
        config.backend = Backend::Simulated;
    }

    let selection = clock_selection(args);
    info!(
        ?selection,
        ?config.backend,
        sample_micros = config.sample_micros,
        "Starting clock check"
    );

    let hw = create_hardware(&config).map_err(|e| Failure::new(EXIT_UNAVAILABLE, e))?;
    let mut prober = Prober::new(hw, config);

    let stdout = io::stdout();
    write_output(&mut prober, selection, args.json, &mut stdout.lock()).map_err(|e| {
        error!(error = %e, code = e.exit_code(), "clock check aborted");
        Failure::new(e.exit_code(), e)
    })
}

/// Resolve the positional clock argument.
///
/// Parsed here rather than by clap so the fallback warning is emitted after
/// the subscriber is installed.
fn clock_selection(args: &Args) -> ClockSelection {
    match args.clock.as_deref() {
        Some(arg) => arg.parse().unwrap_or_else(|never: Infallible| match never {}),
        None => ClockSelection::default(),
    }
}

/// Probe `selection` and write the text lines, or the JSON array, to `out`.
///
/// In JSON mode the reports measured before a failure are still written.
fn write_output<H: WaveHardware, W: Write>(
    prober: &mut Prober<H>,
    selection: ClockSelection,
    json: bool,
    out: &mut W,
) -> Result<(), RunError> {
    let probed = if json {
        let mut reports = Vec::new();
        let probed = prober.run_into(selection, &mut io::sink(), &mut reports);
        let written = write_json(out, &reports).map_err(RunError::from);
        probed.and(written)
    } else {
        prober.run(selection, out).map(drop)
    };
    let flushed = out.flush();

    probed?;
    flushed?;
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `CLOCK_CHECK_CONFIG` environment variable
/// 3. `/etc/clock-check/config.toml` (system path)
/// 4. Built-in defaults
fn load_config(args: &Args) -> Result<ProbeConfig> {
    // 1. Command-line argument (highest priority)
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return ProbeConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path));
    }

    // 2. Environment variable
    if let Ok(env_path) = std::env::var("CLOCK_CHECK_CONFIG") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from CLOCK_CHECK_CONFIG");
            return ProbeConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from CLOCK_CHECK_CONFIG={:?}", env_path)
            });
        }
        warn!(
            path = %env_path,
            "CLOCK_CHECK_CONFIG set but file does not exist, checking other locations"
        );
    }

    // 3. System path
    let system_path = PathBuf::from("/etc/clock-check/config.toml");
    if system_path.exists() {
        info!(?system_path, "Loading config from system path");
        return ProbeConfig::from_file(&system_path)
            .with_context(|| format!("Failed to load config from {:?}", system_path));
    }

    // 4. Built-in defaults
    info!("No config file found, using built-in defaults");
    Ok(ProbeConfig::default())
}

/// Create the hardware backend selected by configuration.
fn create_hardware(config: &ProbeConfig) -> Result<Box<dyn WaveHardware>> {
    match config.backend {
        Backend::Simulated => {
            info!(?config.simulated, "Using simulated hardware");
            Ok(Box::new(SimulatedHardware::from_config(&config.simulated)))
        }
        Backend::Pigpio => pigpio_hardware(),
    }
}

#[cfg(all(feature = "pigpio", target_os = "linux"))]
fn pigpio_hardware() -> Result<Box<dyn WaveHardware>> {
    info!("Using pigpio hardware");
    let hw = clock_hal::PigpioHardware::acquire().context("Failed to claim pigpio")?;
    Ok(Box::new(hw))
}

#[cfg(not(all(feature = "pigpio", target_os = "linux")))]
fn pigpio_hardware() -> Result<Box<dyn WaveHardware>> {
    Err(clock_hal::HalError::Unavailable("pigpio"))
        .context("Rebuild with `--features pigpio` on the board, or pass --simulated")
}

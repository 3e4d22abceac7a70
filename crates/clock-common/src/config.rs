//! Configuration structures for a clock probe run.
//!
//! Supports TOML deserialization. Every field defaults to the probe's
//! fixed constants, so an empty file reproduces the stock behavior.

use crate::verdict::VerdictBands;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Sample granularities (microseconds per tick) the hardware layer accepts.
pub const VALID_SAMPLE_MICROS: [u32; 6] = [1, 2, 4, 5, 8, 10];

/// Number of pulses in the probe waveform.
pub const PROBE_PULSES: u32 = 2;

/// Top-level probe configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Microseconds per hardware sample tick.
    pub sample_micros: u32,

    /// Hold duration of each probe pulse.
    #[serde(with = "humantime_serde")]
    pub pulse_delay: Duration,

    /// Sleep between completion polls.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Upper bound on the completion poll. Unset means poll forever.
    #[serde(
        with = "humantime_serde::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub poll_timeout: Option<Duration>,

    /// Hardware backend.
    pub backend: Backend,

    /// Ratio bands used for the verdict.
    pub bands: VerdictBands,

    /// Simulated backend settings.
    pub simulated: SimulatedConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            sample_micros: 5,
            pulse_delay: Duration::from_micros(25_000),
            poll_interval: Duration::from_micros(500),
            poll_timeout: None,
            backend: Backend::default(),
            bands: VerdictBands::default(),
            simulated: SimulatedConfig::default(),
        }
    }
}

/// Supported hardware backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// pigpio C library on the board itself.
    #[default]
    Pigpio,
    /// In-process simulation with a virtual microsecond clock.
    Simulated,
}

/// Settings for the simulated backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    /// Slow-down factor of the PWM clock (2.0 doubles every delay).
    pub pwm_scale: f64,
    /// Slow-down factor of the PCM clock.
    pub pcm_scale: f64,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            pwm_scale: 1.0,
            pcm_scale: 1.0,
        }
    }
}

impl ProbeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a value is out of range.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_SAMPLE_MICROS.contains(&self.sample_micros) {
            return Err(ConfigError::Invalid(format!(
                "sample_micros must be one of {VALID_SAMPLE_MICROS:?}, got {}",
                self.sample_micros
            )));
        }
        if self.pulse_delay.is_zero() {
            return Err(ConfigError::Invalid("pulse_delay must be non-zero".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll_interval must be non-zero".into(),
            ));
        }
        let fits = u32::try_from(self.pulse_delay.as_micros())
            .ok()
            .and_then(|us| us.checked_mul(PROBE_PULSES))
            .is_some();
        if !fits {
            return Err(ConfigError::Invalid(format!(
                "pulse_delay {} does not fit the hardware tick counter",
                humantime::format_duration(self.pulse_delay)
            )));
        }
        if u32::try_from(self.poll_interval.as_micros()).is_err() {
            return Err(ConfigError::Invalid("poll_interval is too long".into()));
        }
        if self.poll_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::Invalid("poll_timeout must be non-zero".into()));
        }

        let VerdictBands {
            nominal,
            half_speed,
        } = self.bands;
        if !(nominal.low <= nominal.high && half_speed.low <= half_speed.high) {
            return Err(ConfigError::Invalid("band edges are inverted".into()));
        }
        if nominal.high >= half_speed.low {
            return Err(ConfigError::Invalid(
                "nominal band must lie below the half-speed band".into(),
            ));
        }
        if !(self.simulated.pwm_scale > 0.0 && self.simulated.pcm_scale > 0.0) {
            return Err(ConfigError::Invalid(
                "simulated clock scales must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Pulse hold duration in hardware microseconds.
    #[must_use]
    pub fn pulse_delay_micros(&self) -> u32 {
        u32::try_from(self.pulse_delay.as_micros()).unwrap_or(u32::MAX)
    }

    /// Poll sleep in microseconds.
    #[must_use]
    pub fn poll_interval_micros(&self) -> u32 {
        u32::try_from(self.poll_interval.as_micros()).unwrap_or(u32::MAX)
    }

    /// Poll timeout in hardware ticks, if one is configured.
    #[must_use]
    pub fn poll_timeout_ticks(&self) -> Option<u32> {
        self.poll_timeout
            .map(|t| u32::try_from(t.as_micros()).unwrap_or(u32::MAX))
    }

    /// Ticks the whole probe waveform should take on a healthy clock.
    #[must_use]
    pub fn expected_ticks(&self) -> u32 {
        self.pulse_delay_micros().saturating_mul(PROBE_PULSES)
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = Option::<String>::deserialize(deserializer)?;
            s.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

//! End-to-end probe scenarios against the simulated backend.
//!
//! # Acceptance Criteria
//!
//! - Healthy clocks report "clock is OK" with ratio 1.0
//! - A clock at half rate reports the half-speed verdict with ratio 2.0
//! - Anything else is reported as corrupt but is not a failure
//! - Every failing step aborts the run with its own exit status

use super::common::{config_from_file, faulty, run_text, selection, simulated};
use clock_common::{ClockSelection, ClockSource, ProbeConfig, Verdict};
use clock_hal::SimFault;
use clock_probe::{write_json, Prober};

#[test]
fn test_both_clocks_healthy() {
    let mut prober = Prober::new(simulated(1.0, 1.0), ProbeConfig::default());
    let outcome = run_text(&mut prober, ClockSelection::default());

    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(
        outcome.output,
        "testing PWM clock\n  delta = 50000, expected = 50000, ratio = 1.000000\n  clock is OK\n\
         testing PCM clock\n  delta = 50000, expected = 50000, ratio = 1.000000\n  clock is OK\n"
    );
}

#[test]
fn test_half_speed_pcm_is_reported_not_failed() {
    let mut prober = Prober::new(simulated(1.0, 2.0), ProbeConfig::default());
    let outcome = run_text(&mut prober, selection("pcm"));

    assert_eq!(outcome.exit_code(), 0);
    let reports = outcome.result.as_ref().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].clock, ClockSource::Pcm);
    assert_eq!(reports[0].verdict, Verdict::HalfSpeed);
    assert!(outcome
        .output
        .ends_with("  clock is at half speed. all delays are doubled!\n"));
}

#[test]
fn test_corrupt_clock_exits_zero() {
    let mut prober = Prober::new(simulated(0.5, 1.0), ProbeConfig::default());
    let outcome = run_text(&mut prober, selection("pwm"));

    assert_eq!(outcome.exit_code(), 0);
    assert!(outcome.output.contains("ratio = 0.500000"));
    assert!(outcome.output.ends_with("  clock is corrupt!\n"));
}

#[test]
fn test_numeric_selection() {
    for (arg, expected) in [("0", ClockSource::Pwm), ("3", ClockSource::Pcm)] {
        let mut prober = Prober::new(simulated(1.0, 1.0), ProbeConfig::default());
        let outcome = run_text(&mut prober, selection(arg));

        let reports = outcome.result.unwrap();
        assert_eq!(reports.len(), 1, "argument {arg}");
        assert_eq!(reports[0].clock, expected, "argument {arg}");
    }
}

#[test]
fn test_failing_steps_exit_codes() {
    let cases = [
        (SimFault::InitFails(ClockSource::Pwm), 10),
        (SimFault::AddNewFails, 1),
        (SimFault::GenericShortfall, 2),
        (SimFault::CreateFails, 3),
        (SimFault::SendRejected, 4),
    ];

    for (fault, code) in cases {
        let mut prober = Prober::new(faulty(fault), ProbeConfig::default());
        let outcome = run_text(&mut prober, ClockSelection::Both);

        assert_eq!(outcome.exit_code(), code, "{fault:?}");
        // The run stops at the first source; PCM is never announced.
        assert_eq!(outcome.output, "testing PWM clock\n", "{fault:?}");
        assert_eq!(prober.hardware().stats().sends, 0, "{fault:?}");
        assert!(!prober.hardware().is_initialised(), "{fault:?}");
    }
}

#[test]
fn test_second_source_init_failure() {
    let mut prober = Prober::new(
        faulty(SimFault::InitFails(ClockSource::Pcm)),
        ProbeConfig::default(),
    );
    let outcome = run_text(&mut prober, ClockSelection::Both);

    assert_eq!(outcome.exit_code(), 20);
    assert!(outcome.output.contains("clock is OK"));
    assert!(outcome.output.ends_with("testing PCM clock\n"));
}

#[test]
fn test_configured_timings() {
    let config = config_from_file(
        r#"
        sample_micros = 10
        pulse_delay = "5ms"
        poll_interval = "100us"
        "#,
    );
    let mut prober = Prober::new(simulated(2.0, 1.0), config);
    let outcome = run_text(&mut prober, ClockSelection::Both);

    let reports = outcome.result.unwrap();
    assert_eq!(reports[0].expected_ticks, 10_000);
    assert_eq!(reports[0].elapsed_ticks, 20_000);
    assert_eq!(reports[0].verdict, Verdict::HalfSpeed);
    assert_eq!(reports[1].verdict, Verdict::Nominal);
    assert_eq!(prober.hardware().clock(), (10, ClockSource::Pcm));
}

#[test]
fn test_custom_bands_from_config() {
    let config = config_from_file(
        r#"
        [bands]
        nominal = [0.99, 1.01]
        "#,
    );
    let mut prober = Prober::new(simulated(1.1, 1.0), config);
    let outcome = run_text(&mut prober, ClockSelection::Both);

    let reports = outcome.result.unwrap();
    assert_eq!(reports[0].verdict, Verdict::Corrupt);
    assert_eq!(reports[1].verdict, Verdict::Nominal);
}

#[test]
fn test_poll_timeout_aborts_run() {
    let config = config_from_file(r#"poll_timeout = "200ms""#);
    let mut prober = Prober::new(faulty(SimFault::NeverCompletes), config);
    let outcome = run_text(&mut prober, ClockSelection::Both);

    assert_eq!(outcome.exit_code(), 5);
    assert!(!prober.hardware().is_initialised());
}

#[test]
fn test_json_report() {
    let mut prober = Prober::new(simulated(1.0, 2.0), ProbeConfig::default());
    let reports = prober
        .run(ClockSelection::Both, &mut std::io::sink())
        .unwrap();

    let mut out = Vec::new();
    write_json(&mut out, &reports).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[0]["clock"], "pwm");
    assert_eq!(value[0]["verdict"], "nominal");
    assert_eq!(value[1]["clock"], "pcm");
    assert_eq!(value[1]["verdict"], "half_speed");
    assert_eq!(value[1]["ratio"], 2.0);
}

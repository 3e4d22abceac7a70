//! Hardware ownership acceptance tests.
//!
//! The waveform/clock layer is a process-wide singleton. These tests check
//! that each probe initialises it exactly once and releases it before the
//! next source is probed or the run ends, on success and on failure.
//!
//! # Acceptance Criteria
//!
//! - Every successful initialise is matched by exactly one terminate
//! - Clock configuration always precedes initialisation
//! - A fresh initialise after terminate behaves like the first one

use super::common::{faulty, run_text, simulated};
use clock_common::{ClockSelection, ClockSource, ProbeConfig};
use clock_hal::{SimFault, SimulatedHardware};
use clock_probe::Prober;

#[test]
fn test_init_terminate_balanced_across_sources() {
    let mut prober = Prober::new(simulated(1.0, 1.0), ProbeConfig::default());
    let outcome = run_text(&mut prober, ClockSelection::Both);
    assert_eq!(outcome.exit_code(), 0);

    let hw = prober.into_inner();
    let stats = hw.stats();
    assert_eq!(stats.initialises, 2);
    assert_eq!(stats.terminates, 2);
    assert_eq!(stats.clears, 2);
    assert!(!hw.is_initialised());
    assert_eq!(hw.wave_count(), 0);
}

#[test]
fn test_call_order_per_source() {
    let mut prober = Prober::new(simulated(1.0, 1.0), ProbeConfig::default());
    run_text(&mut prober, ClockSelection::Both);

    let calls = prober.hardware().calls();
    let per_source: Vec<&[&str]> = calls.split(|c| *c == "terminate").collect();
    // Two complete sessions and the empty tail after the last terminate.
    assert_eq!(per_source.len(), 3);
    for session in &per_source[..2] {
        assert_eq!(session[0], "configure_clock");
        assert_eq!(session[1], "initialise");
        assert_eq!(session.last(), Some(&"wave_clear"));
    }
    assert!(per_source[2].is_empty());
}

#[test]
fn test_fresh_initialise_after_terminate_matches_first() {
    let mut hw = SimulatedHardware::new();

    let first = {
        let mut prober = Prober::new(&mut hw, ProbeConfig::default());
        prober.probe(ClockSource::Pwm).unwrap()
    };
    let second = {
        let mut prober = Prober::new(&mut hw, ProbeConfig::default());
        prober.probe(ClockSource::Pwm).unwrap()
    };

    assert_eq!(first, second);
    assert_eq!(hw.stats().initialises, 2);
    assert_eq!(hw.stats().terminates, 2);
}

#[test]
fn test_failure_releases_before_exit() {
    for fault in [
        SimFault::AddNewFails,
        SimFault::GenericShortfall,
        SimFault::CreateFails,
        SimFault::SendRejected,
    ] {
        let mut prober = Prober::new(faulty(fault), ProbeConfig::default());
        let outcome = run_text(&mut prober, ClockSelection::Both);
        assert_ne!(outcome.exit_code(), 0);

        let hw = prober.hardware();
        assert_eq!(hw.stats().initialises, 1, "{fault:?}");
        assert_eq!(hw.stats().terminates, 1, "{fault:?}");
        assert_eq!(hw.calls().last(), Some(&"terminate"), "{fault:?}");
    }
}

#[test]
fn test_init_failure_owes_no_teardown() {
    let mut prober = Prober::new(
        faulty(SimFault::InitFails(ClockSource::Pwm)),
        ProbeConfig::default(),
    );
    let outcome = run_text(&mut prober, ClockSelection::Both);
    assert_eq!(outcome.exit_code(), 10);

    let hw = prober.hardware();
    assert_eq!(hw.calls(), ["configure_clock", "initialise"]);
    assert_eq!(hw.stats().terminates, 0);
}

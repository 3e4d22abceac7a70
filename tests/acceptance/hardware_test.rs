//! Real hardware acceptance tests.
//!
//! # Requirements
//!
//! - Raspberry Pi with libpigpio installed
//! - Root privileges
//! - `cargo test --features pigpio -- --ignored`
//!
//! # Acceptance Criteria
//!
//! - Both clocks probe without a fatal error
//! - The pigpio handle can be claimed again once released

#![cfg(all(feature = "pigpio", target_os = "linux"))]

use super::common::{check_hardware_prerequisites, run_text};
use clock_common::{ClockSelection, ProbeConfig};
use clock_hal::{HalError, PigpioHardware};
use clock_probe::Prober;
use std::time::Duration;

#[test]
#[ignore = "Requires a Raspberry Pi, root, and libpigpio"]
fn test_probe_both_clocks_on_hardware() {
    if let Err(e) = check_hardware_prerequisites() {
        eprintln!("Skipping test: {}", e);
        return;
    }

    let config = ProbeConfig {
        poll_timeout: Some(Duration::from_secs(2)),
        ..ProbeConfig::default()
    };
    let hw = PigpioHardware::acquire().expect("pigpio claim");
    assert_eq!(
        PigpioHardware::acquire().unwrap_err(),
        HalError::AlreadyClaimed
    );
    let mut prober = Prober::new(hw, config);
    let outcome = run_text(&mut prober, ClockSelection::Both);

    println!("{}", outcome.output);
    assert_eq!(outcome.exit_code(), 0);

    drop(prober);
    assert!(PigpioHardware::acquire().is_ok());
}

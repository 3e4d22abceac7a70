//! Integration tests for clock-check acceptance testing.
//!
//! - Verdicts and report text for healthy, slow, and broken clocks
//! - Exit statuses of every failing step
//! - Hardware release between and after probes

mod common;
mod hardware_test;
mod scenario_test;
mod teardown_test;

//! Human-readable and JSON output of probe results.

use crate::measurement::ProbeReport;
use clock_common::ClockSource;
use std::io::{self, Write};

/// Announce the source about to be probed.
pub fn write_header<W: Write>(out: &mut W, clock: ClockSource) -> io::Result<()> {
    writeln!(out, "testing {clock} clock")
}

/// Measurement line followed by the verdict line.
pub fn write_report<W: Write>(out: &mut W, report: &ProbeReport) -> io::Result<()> {
    writeln!(
        out,
        "  delta = {}, expected = {}, ratio = {:.6}",
        report.elapsed_ticks, report.expected_ticks, report.ratio
    )?;
    writeln!(out, "  {}", report.verdict.message())
}

/// All reports as a pretty-printed JSON array.
pub fn write_json<W: Write>(out: &mut W, reports: &[ProbeReport]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, reports)?;
    writeln!(out)
}

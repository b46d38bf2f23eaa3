//! Pipeline observability: monotonic performance counters and derived
//! throughput metrics.
//!
//! Counters are snapshot-read from the running pipeline
//! ([`crate::FilterPipeline::counters`]) and never reset mid-run. A
//! *stall tick* is a tick in which the external input held a valid
//! transfer the pipeline was not ready to accept — the canonical
//! backpressure visibility metric.

use serde::{Deserialize, Serialize};

/// Snapshot of the pipeline's monotonic performance counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerfCounters {
    /// Clock ticks elapsed.
    pub ticks: u64,
    /// Transfers committed on the external input.
    pub pixels_in: u64,
    /// Transfers committed on the external output.
    pub pixels_out: u64,
    /// Ticks in which the external input was valid but not ready.
    pub stall_ticks: u64,
}

impl PerfCounters {
    /// Output transfers per hundred ticks.
    #[must_use]
    pub fn throughput_pct(&self) -> f64 {
        percentage(self.pixels_out, self.ticks)
    }

    /// Share of ticks spent stalled at the input, as a percentage.
    #[must_use]
    pub fn stall_rate_pct(&self) -> f64 {
        percentage(self.stall_ticks, self.ticks)
    }

    /// Transfers currently buffered inside the pipeline.
    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.pixels_in - self.pixels_out
    }

    /// Format the counters as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("Pipeline Counters\n{}", "=".repeat(40)));
        lines.push(format!("{:<16} {:>12}", "Ticks", self.ticks));
        lines.push(format!("{:<16} {:>12}", "Pixels in", self.pixels_in));
        lines.push(format!("{:<16} {:>12}", "Pixels out", self.pixels_out));
        lines.push(format!("{:<16} {:>12}", "Stall ticks", self.stall_ticks));
        lines.push(format!(
            "{:<16} {:>11.1}%",
            "Throughput",
            self.throughput_pct(),
        ));
        lines.push(format!(
            "{:<16} {:>11.1}%",
            "Stall rate",
            self.stall_rate_pct(),
        ));
        lines.join("\n")
    }
}

/// `part / whole * 100`, zero when nothing has elapsed.
fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        part as f64 / whole as f64 * 100.0
    }
}

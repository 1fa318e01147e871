//! Run summary: elapsed time and the post-run row count of the first host.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Result of one harness run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Work units requested on the command line
    pub requested: usize,
    /// Work units that failed (only non-zero when failures are isolated)
    pub failed_units: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(skip)]
    pub elapsed: Duration,
    pub duration_ms: u64,
    /// Successful work units per second
    pub units_per_second: f64,
    /// Host the final count was read from
    pub count_host: String,
    /// Row count of `count_host`'s table after the run
    pub final_count: u64,
}

impl Report {
    pub fn new(
        requested: usize,
        failed_units: usize,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        count_host: String,
        final_count: u64,
    ) -> Self {
        let secs = elapsed.as_secs_f64();
        let succeeded = requested.saturating_sub(failed_units);
        let units_per_second = if secs > 0.0 {
            succeeded as f64 / secs
        } else {
            0.0
        };
        Self {
            requested,
            failed_units,
            started_at,
            completed_at: Utc::now(),
            elapsed,
            duration_ms: elapsed.as_millis() as u64,
            units_per_second,
            count_host,
            final_count,
        }
    }

    /// Write the elapsed time line and the count line.
    pub fn print_summary<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{:?}", self.elapsed)?;
        writeln!(
            out,
            "insert num = {}, select count = {}",
            self.requested, self.final_count
        )
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

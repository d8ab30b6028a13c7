// src/report.rs
// =============================================================================
// Turns probe results into console output.
//
// Text mode, one block per result:
//   Method: GET | URL: https://example.com/admin
//   Status Code: 403
//   Headers: {"content-type": ["text/html"], ...}
// or, for a failed request, one line:
//   Error: timed out: ... | Method: GET | URL: https://example.com/admin
//
// JSON mode prints one object per line, then a summary object.
// Both modes end with the total elapsed time.
// =============================================================================

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::sweep::{ProbeOutcome, ProbeResult};

/// Totals for one finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub failed: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

pub struct Reporter<W> {
    out: W,
    json: bool,
    summary: RunSummary,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            summary: RunSummary::default(),
        }
    }

    /// Prints one result as soon as it arrives.
    pub fn record(&mut self, result: &ProbeResult) -> Result<()> {
        self.summary.total += 1;
        if result.is_failure() {
            self.summary.failed += 1;
        }

        if self.json {
            serde_json::to_writer(&mut self.out, result)?;
            writeln!(self.out)?;
        } else {
            writeln!(self.out, "{}", format_result(result))?;
        }
        Ok(())
    }

    /// Prints the closing elapsed-time line and hands back the totals.
    pub fn finish(mut self, elapsed: Duration) -> Result<RunSummary> {
        self.summary.elapsed = elapsed;

        if self.json {
            serde_json::to_writer(&mut self.out, &self.summary)?;
            writeln!(self.out)?;
        } else {
            writeln!(self.out)?;
            writeln!(self.out, "Directory discovery completed in {:?}", elapsed)?;
        }
        self.out.flush()?;
        Ok(self.summary)
    }
}

pub fn format_result(result: &ProbeResult) -> String {
    match &result.outcome {
        ProbeOutcome::Response {
            status_code,
            headers,
        } => format!(
            "Method: {} | URL: {}\nStatus Code: {}\nHeaders: {:?}\n",
            result.method, result.url, status_code, headers
        ),
        ProbeOutcome::Failed { error } => format!(
            "Error: {} | Method: {} | URL: {}",
            error, result.method, result.url
        ),
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// Only -u and -i are required. The other flags default to the values the
// tool has always used (50 concurrent requests, 10 second timeout, text
// output), so `method-sweep -u <url> -i <file>` behaves the same as before.
// =============================================================================

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use crate::error::{SweepError, SweepResult};

#[derive(Parser, Debug)]
#[command(
    name = "method-sweep",
    version,
    about = "Probe every path in a wordlist with every common HTTP method",
    long_about = "method-sweep joins each line of the input file to the target URL and sends \
                  GET, POST, PUT, DELETE, OPTIONS and HEAD to every resulting URL, printing the \
                  status code and headers (or the error) for each request."
)]
pub struct Cli {
    /// Target base URL (e.g., https://example.com)
    #[arg(short = 'u', long = "url")]
    pub target: String,

    /// File containing the list of paths to test, one per line
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Maximum number of requests in flight at once
    #[arg(short = 'c', long, default_value_t = crate::sweep::DEFAULT_CEILING)]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(short = 't', long = "timeout", default_value_t = crate::sweep::DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Print one JSON object per result instead of text blocks
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Checks the values clap can't check by itself.
    pub fn validate(&self) -> SweepResult<()> {
        validate_target(&self.target)?;

        if self.timeout_secs == 0 {
            return Err(SweepError::Configuration(
                "timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(())
    }
}

// Only checks the target; the string itself is used as-is when joining paths
fn validate_target(target: &str) -> SweepResult<()> {
    if target.is_empty() {
        return Err(SweepError::Configuration(
            "target URL (-u) must not be empty".to_string(),
        ));
    }

    let url = Url::parse(target).map_err(|e| {
        SweepError::Configuration(format!("invalid target URL '{}': {}", target, e))
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SweepError::Configuration(format!(
            "unsupported scheme '{}' in target URL, expected http or https",
            other
        ))),
    }
}

// src/main.rs
// =============================================================================
// Entry point of method-sweep.
//
// What happens here:
// 1. Parse and validate command-line arguments (clap)
// 2. Load the wordlist of paths
// 3. Start the sweep: every path x every method, at most N requests at once
// 4. Print each result as soon as it comes back, then the elapsed time
// 5. Exit with 0 when the sweep ran (even if some requests failed),
//    2 when it could not start
// =============================================================================

// Module declarations - one file (or directory) per concern
mod cli;      // src/cli.rs - command-line flags
mod error;    // src/error.rs - fatal and per-request error types
mod logger;   // src/logger.rs - tracing setup
mod report;   // src/report.rs - console / JSON output
mod sweep;    // src/sweep/ - the concurrent probing engine
mod wordlist; // src/wordlist.rs - reads the list of paths

use std::io;
use std::time::{Duration, Instant};

// anyhow::Result lets run() return any of our error types with `?`
use anyhow::Result;
use clap::Parser; // Parser trait enables Cli::parse()
use futures::StreamExt; // StreamExt gives us .next() on the result stream
use tracing::{debug, info};

use cli::Cli;
use report::Reporter;
use sweep::{Dispatcher, HttpProber, Throttle};

#[tokio::main]
async fn main() {
    // Anything that stops the sweep from starting ends up here as an Err
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    // clap prints its own diagnostic and exits with code 2 on missing flags
    let cli = Cli::parse();
    logger::init_logging(cli.verbose);
    // Bad target URL / zero timeout: fail before touching the network
    cli.validate()?;

    // An unreadable wordlist is fatal, an empty one is just a short run
    let paths = wordlist::load_paths(&cli.input).await?;

    // One throttle and one HTTP client for the whole run
    let throttle = Throttle::new(cli.concurrency)?;
    let prober = HttpProber::new(Duration::from_secs(cli.timeout_secs))?;
    let dispatcher = Dispatcher::new(prober, throttle);

    info!(
        paths = paths.len(),
        requests = dispatcher.task_count(paths.len()),
        "loaded wordlist from {}",
        cli.input.display()
    );

    // Results go to stdout, logs to stderr, so `--json` can be piped as-is
    let mut reporter = Reporter::new(io::stdout(), cli.json);

    // The clock starts right before the first task is dispatched
    let start_time = Instant::now();
    let mut results = dispatcher.dispatch(&cli.target, &paths);

    // Print as results arrive; the loop ends once every task has finished
    while let Some(result) = results.next().await {
        reporter.record(&result)?;
    }
    debug!(
        created = results.created(),
        outstanding = results.outstanding(),
        "result stream closed"
    );

    // Always printed, even when every single request failed
    let summary = reporter.finish(start_time.elapsed())?;
    info!(
        total = summary.total,
        failed = summary.failed,
        "sweep complete"
    );

    Ok(())
}

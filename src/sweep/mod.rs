// src/sweep/mod.rs
// =============================================================================
// The probing engine.
//
// Submodules:
// - task: ProbeTask / ProbeResult and the fixed method set
// - http: the Prober trait and the reqwest-backed HttpProber
// - throttle: bounds how many tasks are in flight
// - tracker: counts outstanding tasks so completion is unambiguous
// - dispatch: fans tasks out and streams results back
// =============================================================================

mod dispatch;
mod http;
pub mod task;
mod throttle;
mod tracker;

pub use dispatch::Dispatcher;
pub use http::{HttpProber, DEFAULT_TIMEOUT};
pub use task::{ProbeOutcome, ProbeResult};
pub use throttle::{Throttle, DEFAULT_CEILING};

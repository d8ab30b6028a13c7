// src/sweep/task.rs
// =============================================================================
// The units of work and their outcomes.
//
// A ProbeTask is one (target, path, method) combination. Every task gets a
// unique id: its index in the path-major cross product of paths x methods.
// A ProbeResult is produced exactly once per task and carries the same id,
// so results can be matched back to tasks no matter what order they finish in.
// =============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::Method;
use serde::{Serialize, Serializer};

use crate::error::ProbeError;

/// Methods tried against every path, in this order.
pub const METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
    Method::HEAD,
];

#[derive(Debug, Clone)]
pub struct ProbeTask {
    pub id: usize,
    pub target: Arc<str>,
    pub path: Arc<str>,
    pub method: Method,
}

impl ProbeTask {
    /// Joins target and path with a single '/'.
    ///
    /// The join is literal: no escaping, no collapsing of "//" when the target
    /// already ends with a slash or the path starts with one.
    pub fn url(&self) -> String {
        format!("{}/{}", self.target, self.path)
    }
}

/// Header name -> every value received for it, in arrival order.
pub type Headers = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Response { status_code: u16, headers: Headers },
    Failed { error: ProbeError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub id: usize,
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    pub url: String,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    pub fn response(task: &ProbeTask, status_code: u16, headers: Headers) -> Self {
        Self {
            id: task.id,
            method: task.method.clone(),
            url: task.url(),
            outcome: ProbeOutcome::Response {
                status_code,
                headers,
            },
        }
    }

    pub fn failed(task: &ProbeTask, error: ProbeError) -> Self {
        Self {
            id: task.id,
            method: task.method.clone(),
            url: task.url(),
            outcome: ProbeOutcome::Failed { error },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Failed { .. })
    }
}

fn serialize_method<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}

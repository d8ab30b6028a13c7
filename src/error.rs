// src/error.rs
// =============================================================================
// Error types for method-sweep.
//
// There are two very different kinds of failure in this tool:
// - SweepError: something is wrong before the sweep even starts (bad flags,
//   unreadable wordlist, HTTP client could not be built). These are fatal.
// - ProbeError: one single request failed. These never stop the sweep, they
//   are recorded as that request's result and printed like any other result.
// =============================================================================

use std::fmt::Write;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Fatal errors. Any of these aborts the process before dispatch starts.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("could not read input file '{}': {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type SweepResult<T> = Result<T, SweepError>;

/// Why a single probe failed. The payload is the human-readable cause chain.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ProbeError {
    /// The method/URL pair could not be turned into a request
    #[error("invalid request: {0}")]
    RequestConstruction(String),
    /// No response within the per-request timeout
    #[error("timed out: {0}")]
    Timeout(String),
    /// DNS failure, refused connection, TLS handshake failure...
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for ProbeError {
    fn from(error: reqwest::Error) -> Self {
        let message = cause_chain(&error);

        if error.is_builder() {
            ProbeError::RequestConstruction(message)
        } else if error.is_timeout() {
            ProbeError::Timeout(message)
        } else if error.is_connect() {
            ProbeError::Connect(message)
        } else {
            ProbeError::Transport(message)
        }
    }
}

// reqwest's Display only shows the outermost layer ("error sending request
// for url ..."), the useful part (refused, dns, tls) lives in source()
fn cause_chain(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = err.to_string();
    while let Some(src) = err.source() {
        let _ = write!(s, ": {}", src);
        err = src;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Leaf;

    impl std::fmt::Display for Leaf {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "connection refused")
        }
    }

    impl std::error::Error for Leaf {}

    #[derive(Debug)]
    struct Outer(Leaf);

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_cause_chain_includes_sources() {
        let chain = cause_chain(&Outer(Leaf));
        assert_eq!(chain, "error sending request: connection refused");
    }

    #[test]
    fn test_probe_error_display() {
        let err = ProbeError::Timeout("operation timed out".to_string());
        assert_eq!(err.to_string(), "timed out: operation timed out");

        let err = ProbeError::Transport("reset".to_string());
        assert_eq!(err.to_string(), "reset");
    }

    #[test]
    fn test_probe_error_serializes_with_kind() {
        let err = ProbeError::Connect("refused".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "connect");
        assert_eq!(json["message"], "refused");
    }

    #[test]
    fn test_input_error_names_path() {
        let err = SweepError::Input {
            path: PathBuf::from("words.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("words.txt"));
    }
}

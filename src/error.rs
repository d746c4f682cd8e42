//! Errors that cross a component boundary.
//!
//! Malformed ranges and failed probes are absorbed where they happen (the
//! range is skipped, the probe reports [`crate::models::Latency::Unreachable`]),
//! so only fetch, write and configuration failures appear here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

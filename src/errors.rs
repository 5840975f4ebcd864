//! Error types for the pipeline.
//!
//! Two layers, matching the recovery policy:
//! - [`FetchError`] is per-source. A failing source is logged and skipped;
//!   its error never aborts the batch.
//! - [`PipelineError`] is surfaced to the caller: total fetch failure,
//!   store I/O failure, a busy store, or bad configuration.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure surfaced by a pipeline operation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Every source failed and nothing was retrieved. Partial success is
    /// not an error; this fires only when the whole fetch came up empty.
    #[error("all {attempted} sources failed; no items were retrieved")]
    SourceUnavailable { attempted: usize },

    /// The intermediate or output store could not be read or written.
    #[error("store {} unavailable: {reason}", .path.display())]
    StoreUnavailable { path: PathBuf, reason: String },

    /// A conflicting invocation is already writing the same store.
    #[error("{stage} rejected: another invocation is writing this store")]
    PipelineBusy { stage: &'static str },

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn store(path: &Path, reason: impl std::fmt::Display) -> Self {
        PipelineError::StoreUnavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Per-source fetch failure. Recorded against the source and recovered
/// locally; the fetch as a whole continues with the remaining sources.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source exceeded its {budget:?} time budget")]
    Timeout { budget: Duration },

    #[error("malformed feed: {0}")]
    MalformedFeed(String),

    /// The source yielded neither a parseable feed nor any article content.
    #[error("no feed or article content found")]
    NoContent,
}

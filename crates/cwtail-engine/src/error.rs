//! Errors that end a tail session.
//!
//! Throttling and vanished log groups are absorbed by discovery and the
//! workers; everything here reaches the orchestrator, which surfaces the first
//! one and cancels the rest.

use cwtail_cloudwatch::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TailError {
    #[error("failed to list log groups: {0}")]
    ListGroups(#[source] ApiError),

    #[error("initial check failed for {group}: {source}")]
    InitialDiscovery { group: String, source: ApiError },

    #[error("failed to describe log streams of {group}: {source}")]
    Discovery { group: String, source: ApiError },

    #[error(
        "log streams exceed {limit} ({count} in {group}), so please filter log streams with '--stream' or '--stream-prefix' option"
    )]
    TooManyStreams {
        group: String,
        count: usize,
        limit: usize,
    },

    #[error("unknown error while filtering log events of {group}: {source}")]
    Fetch { group: String, source: ApiError },

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("tail task terminated abnormally: {0}")]
    TaskAborted(String),
}

impl TailError {
    /// Configuration-fatal errors need operator action, not a retry.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::TooManyStreams { .. })
    }
}

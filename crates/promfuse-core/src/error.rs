//! Shared error type across promfuse crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// A target could not be fetched (transport failure or bad status).
    UpstreamFetchFailed,
    /// The whole run was aborted because a target failed under
    /// abort-on-failure mode.
    RunAborted,
    /// Invalid configuration.
    BadConfig,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::UpstreamFetchFailed => "UPSTREAM_FETCH_FAILED",
            ClientCode::RunAborted => "RUN_ABORTED",
            ClientCode::BadConfig => "BAD_CONFIG",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PromFuseError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum PromFuseError {
    /// One target fetch failed. Local to that target unless the run is
    /// configured to abort on any failure.
    #[error("fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },
    /// First fetch failure promoted to a run-level error under
    /// abort-on-failure mode. No partial results accompany this.
    #[error("run aborted: fetch failed for {url}: {reason}")]
    RunAborted { url: String, reason: String },
    /// One metric or metadata line did not match the exposition grammar.
    /// Never propagates past the parser; logged and skipped per line.
    #[error("unparsable exposition line: {0}")]
    ParseLine(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PromFuseError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            PromFuseError::FetchFailed { .. } => ClientCode::UpstreamFetchFailed,
            PromFuseError::RunAborted { .. } => ClientCode::RunAborted,
            PromFuseError::BadConfig(_) => ClientCode::BadConfig,
            PromFuseError::ParseLine(_) | PromFuseError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Promote a fetch failure to the run-level abort error. Other variants
    /// pass through unchanged.
    pub fn into_aborted(self) -> Self {
        match self {
            PromFuseError::FetchFailed { url, reason } => {
                PromFuseError::RunAborted { url, reason }
            }
            other => other,
        }
    }
}

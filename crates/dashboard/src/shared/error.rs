use reqwest::StatusCode;
use thiserror::Error;

/// Failures of the read/write webhook calls.
///
/// Transport and HTTP-status failures are retried and flip the
/// connectivity indicator. A malformed feed is neither retried nor
/// treated as a connectivity problem: it degrades to an empty order
/// list so the dashboard shows "no orders" instead of crashing.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook returned HTTP {0}")]
    Status(StatusCode),

    #[error("malformed feed: {0}")]
    Malformed(String),
}

impl FeedError {
    /// Only transport-level failures count against connectivity
    pub fn affects_connectivity(&self) -> bool {
        !matches!(self, FeedError::Malformed(_))
    }
}

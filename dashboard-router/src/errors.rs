use crate::normalize::NormalizeError;
use performance_client::ClientError;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for dashboard service operations
pub type Result<T, E = DashboardError> = std::result::Result<T, E>;

/// Errors that abort a whole request or the service
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Dashboard metadata could not be loaded; there is nothing to render.
    #[error("Config API error: {0}")]
    ConfigFetch(ClientError),

    #[error("Client setup error: {0}")]
    Client(ClientError),

    #[error("Response serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of one data source fetch that did not produce a payload.
///
/// Cloned once per waiter, so it only carries owned strings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The Data API answered with an error document
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The Data API could not be reached or answered garbage
    #[error("transport error: {0}")]
    Transport(String),

    /// The data source's query could not be normalized
    #[error("invalid query: {0}")]
    Config(#[from] NormalizeError),

    #[error("upstream fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The worker queue was full when the fetch was dispatched
    #[error("worker queue is full")]
    Overloaded,

    /// The coalescer has shut down
    #[error("fetch coordinator unavailable")]
    Unavailable,

    #[error("internal error: {0}")]
    Internal(String),
}

impl FetchError {
    /// Short label used for metric tags and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Upstream(_) => "upstream",
            FetchError::Transport(_) => "transport",
            FetchError::Config(_) => "config",
            FetchError::Timeout(_) => "timeout",
            FetchError::Overloaded => "overloaded",
            FetchError::Unavailable => "unavailable",
            FetchError::Internal(_) => "internal",
        }
    }
}

impl From<ClientError> for FetchError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Upstream { message } => FetchError::Upstream(message),
            other => FetchError::Transport(other.to_string()),
        }
    }
}

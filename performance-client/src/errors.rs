use http::StatusCode;

/// Errors returned by the Config API and Data API clients.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The Data API answered with `"status": "error"`.
    #[error("upstream error: {message}")]
    Upstream { message: String },

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

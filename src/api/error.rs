//! Error types for the log backend client.
use thiserror::Error;

/// Errors returned by a [`Backend`](super::Backend) call.
///
/// Every variant ends up as the failed state of the controller that issued
/// the request; the console never retries.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request could not be completed (connection refused, reset, ...).
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API Error: {status_text}")]
    Status {
        /// Numeric HTTP status.
        status: u16,
        /// Canonical reason phrase, e.g. `Not Found`.
        status_text: String,
    },

    /// The upload endpoint rejected the file. Carries the raw response body.
    #[error("{status_text} - {body}")]
    UploadRejected {
        status: u16,
        status_text: String,
        body: String,
    },

    /// The response body was not the JSON shape we expected.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The staged file could not be read from disk.
    #[error("Could not read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, ApiError>;

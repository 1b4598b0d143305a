use std::error::Error as StdError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for PagerDuty operations
pub type Result<T> = std::result::Result<T, PagerDutyError>;

/// Errors that can occur when building or sending PagerDuty events
#[derive(Debug, Error)]
pub enum PagerDutyError {
    /// Invalid connection configuration (URL, proxy, header, certificate)
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Malformed call into an event's generic key access
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Client certificate could not be read from disk
    #[error("Failed to read client certificate {}: {source}", path.display())]
    ReadCertificate {
        /// Absolute path of the certificate
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to build HTTP client
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// Failed to serialize the event
    #[error("Failed to serialize event: {0}")]
    Serialize(#[source] serde_json::Error),

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest_middleware::Error),

    /// The Events API rejected the event (HTTP 400)
    #[error("PagerDuty rejected event: {message}")]
    ServiceRejected {
        /// Error message from PagerDuty
        message: String,
        /// Field-level errors from PagerDuty
        errors: Vec<serde_json::Value>,
    },
}

impl PagerDutyError {
    /// Check if the error is retryable
    ///
    /// Returns `true` only for connection and timeout failures. A rejected
    /// event will be rejected again, and rate limiting (HTTP 403) is not
    /// reported as an error at all.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(reqwest_middleware::Error::Reqwest(err)) => {
                err.is_connect() || err.is_timeout()
            }
            Self::Transport(source) => {
                if let Some(err) = StdError::source(source)
                    .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
                {
                    return err.is_connect() || err.is_timeout();
                }
                false
            }
            _ => false,
        }
    }

    /// Field-level errors reported by PagerDuty, empty for other errors
    pub fn service_errors(&self) -> &[serde_json::Value] {
        match self {
            Self::ServiceRejected { errors, .. } => errors,
            _ => &[],
        }
    }
}

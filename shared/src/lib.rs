// shared/src/lib.rs

/// Failure taxonomy shared by every crate in the workspace.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Network failure, timeout, non-success status or malformed upstream payload.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("daily quota exceeded")]
    QuotaExceeded,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },
    #[error("{0} is not configured")]
    ConfigurationMissing(&'static str),
    /// A uniqueness constraint rejected the write.
    #[error("conflict")]
    Conflict,
    #[error("storage: {0}")]
    Storage(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Errors worth serving stale data for, rather than surfacing.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UpstreamUnavailable(_) | Error::QuotaExceeded | Error::NotFound(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::UpstreamUnavailable(format!("timed out: {}", err))
        } else {
            Error::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::UpstreamUnavailable(format!("malformed payload: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod clock;
pub mod config;

pub use clock::{Clock, ManualClock, SystemClock};

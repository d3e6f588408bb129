use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Failures talking to the record store.
///
/// Absence of a record is never an error; adapters return `Ok(None)`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("record store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("record store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed {collection} document: {message}")]
    Decode {
        collection: &'static str,
        message: String,
    },

    #[error("invalid record store base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read fixture {path}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid fixture: {0}")]
    FixtureFormat(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether a fresh attempt could plausibly succeed without any change
    /// to the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Unavailable(_) | StoreError::Timeout(_) => true,
            StoreError::Rejected { status, .. } => {
                *status == 429 || *status >= 500
            }
            StoreError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|status| {
                        status.as_u16() == 429 || status.is_server_error()
                    })
            }
            StoreError::Decode { .. }
            | StoreError::InvalidBaseUrl(_)
            | StoreError::Fixture { .. }
            | StoreError::FixtureFormat(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures delivering an analytics record. These never leave the
/// analytics worker.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("analytics endpoint rejected record ({status})")]
    Rejected { status: u16 },

    #[error("analytics transport failed: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_are_retryable() {
        assert!(StoreError::Unavailable("offline".into()).is_retryable());
        assert!(StoreError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(
            StoreError::Rejected {
                status: 503,
                message: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn malformed_data_is_not_retryable() {
        let err = StoreError::Decode {
            collection: "stalls",
            message: "missing field `eventId`".into(),
        };
        assert!(!err.is_retryable());
        assert!(
            !StoreError::Rejected {
                status: 403,
                message: "denied".into()
            }
            .is_retryable()
        );
    }
}

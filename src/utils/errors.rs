use thiserror::Error;

/// Errors from page and media fetches.
///
/// Callers treat every variant as "skip and continue"; the variants exist so
/// logs and tests can tell a timeout from a bad status.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(crate::utils::constants::FETCH_TIMEOUT)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Errors from webhook delivery.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("webhook rejected payload with status {0}")]
    Status(reqwest::StatusCode),

    #[error("webhook transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}

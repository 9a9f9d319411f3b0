use thiserror::Error;

/// Failure to obtain any HTTP response from the Seer API.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid cookie header: {0}")]
    InvalidCookie(String),
}

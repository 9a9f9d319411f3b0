//! Error taxonomy for the authentication flow.
//!
//! Only a few of these stop `authenticate`; most protocol failures degrade to
//! "not authenticated" and are retried by the login loop.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::TransportError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid verify response: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error(
        "Credentials file {} is malformed: expected email and password, found {lines} line(s)",
        path.display()
    )]
    MalformedCredentialsFile { path: PathBuf, lines: usize },

    #[error("Failed to read credentials file {}: {source}", path.display())]
    CredentialsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read credentials from terminal: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("Invalid API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("Could not determine home directory")]
    NoHomeDirectory,
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_credentials_message() {
        let err = AuthError::MalformedCredentialsFile {
            path: PathBuf::from("/home/u/.seerpy/credentials"),
            lines: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("/home/u/.seerpy/credentials"));
        assert!(msg.contains("1 line"));
    }

    #[test]
    fn test_transport_error_passes_through() {
        let err = AuthError::from(TransportError::InvalidUrl("x".into()));
        assert_eq!(err.to_string(), "Invalid request URL: x");
    }
}

//! Session authentication for the Seer cloud API.
//!
//! Logs in with email/password, verifies the resulting session cookie and
//! keeps it under `~/.seerpy` so later runs can skip the login prompt.

pub mod api;
pub mod auth;
pub mod config;
pub mod console;
pub mod error;

pub use api::{HttpTransport, Transport, TransportError, TransportResponse};
pub use auth::{
    CredentialProvider, CredentialSource, Credentials, Environment, FileSessionStore,
    MemorySessionStore, PersistOutcome, PromptHint, Session, SessionAuthenticator, SessionStore,
    VerifyResult,
};
pub use config::{AuthPaths, Config};
pub use console::{Console, TerminalConsole};
pub use error::{AuthError, Result};

//! Authentication module for establishing and persisting Seer sessions.
//!
//! This module provides:
//! - `SessionAuthenticator`: the login/verify/retry state machine
//! - `CredentialSource`: email/password from the credentials file or a prompt
//! - `SessionStore`: per-environment persistence of the session cookie
//!
//! Sessions are cookie maps persisted under `~/.seerpy`, one file per environment.

pub mod authenticator;
pub mod credentials;
pub mod session;
pub mod store;

pub use authenticator::{AttemptState, SessionAuthenticator, MAX_LOGIN_ATTEMPTS};
pub use credentials::{
    CredentialOrigin, CredentialProvider, CredentialSource, Credentials, PromptHint,
};
pub use session::{Environment, Session, VerifyResult, DEVELOPMENT_COOKIE, PRODUCTION_COOKIE};
pub use store::{FileSessionStore, MemorySessionStore, PersistOutcome, SessionStore};

//! HTTP seam between the authenticator and the Seer API.
//!
//! `Transport` is the capability the state machine talks to; `HttpTransport`
//! implements it with reqwest. Only status, cookies and the JSON body of a
//! response are surfaced.

pub mod client;
pub mod error;
pub mod transport;

pub use client::HttpTransport;
pub use error::TransportError;
pub use transport::{Transport, TransportResponse};

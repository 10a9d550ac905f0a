//! Template-messaging provider client for customer notifications.
//!
//! The provider addresses customers by contact id, not phone number:
//! senders first create-or-fetch a contact for a phone number in
//! international form, then send a named template parameterized with
//! plain strings.
//!
//! Authentication exchanges the long-lived API key for a short-lived
//! bearer token; the token is cached inside the client and refreshed
//! before each reconciliation cycle (refresh-or-reuse, fail-open).

mod auth;
mod client;
pub mod phone;

pub use auth::MessagingToken;
pub use client::MessagingClient;

use thiserror::Error;

/// Errors that can occur when interacting with the messaging provider.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Token exchange or refresh failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No bearer token is available (refresh has never succeeded).
    #[error("No access token available")]
    NoAccessToken,

    /// Failed to parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

//! Commerce platform (Shopify Admin API) client.
//!
//! The relay reads three things from the platform:
//!
//! - order metafields, which carry the operational status tag driving
//!   the branch-pickup flow and the supply-branch label for customer
//!   messages
//! - the order's fulfillment list, for the carrier tracking URL
//! - the carrier's public tracking page, fetched as opaque text and
//!   scanned for marker substrings (the carrier has no structured API)
//!
//! Authentication is a static Admin API access token sent as the
//! `X-Shopify-Access-Token` header.

mod client;
pub mod types;

pub use client::ShopifyClient;

use thiserror::Error;

/// Errors that can occur when interacting with the platform.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed (transport, DNS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the platform.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: invalid access token")]
    Unauthorized,

    /// Failed to parse a response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The order record lacks the expected status metafield.
    ///
    /// Not a fault: the status field is written by store staff and is
    /// simply absent until they first set it.
    #[error("Status field missing: {namespace}.{key}")]
    StatusFieldMissing { namespace: String, key: String },
}

impl ShopifyError {
    /// Whether the error means "no transition" rather than a platform
    /// fault worth surfacing.
    #[must_use]
    pub const fn is_status_field_missing(&self) -> bool {
        matches!(self, Self::StatusFieldMissing { .. })
    }
}

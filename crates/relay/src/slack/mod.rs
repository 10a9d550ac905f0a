//! Slack operations channel integration.
//!
//! The relay posts to a single operations channel: a completion summary
//! when an order reaches its terminal status. Sends are best-effort and
//! fire-and-forget; a missed alert never aborts a reconciliation cycle.

mod client;
mod messages;
mod types;

pub use client::SlackClient;
pub use messages::build_order_summary;
pub use types::{Block, PostMessageResponse, Text};

use thiserror::Error;

/// Errors that can occur when interacting with the Slack API.
#[derive(Debug, Error)]
pub enum SlackError {
    /// Request failed to send.
    #[error("Request error: {0}")]
    Request(String),

    /// Response could not be parsed.
    #[error("Response error: {0}")]
    Response(String),

    /// Slack API returned an error.
    #[error("Slack API error: {0}")]
    Api(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_error_display() {
        let err = SlackError::Api("channel_not_found".to_string());
        assert_eq!(err.to_string(), "Slack API error: channel_not_found");
    }
}

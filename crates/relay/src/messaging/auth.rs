//! Messaging provider authentication.
//!
//! Exchanges the long-lived API key for a short-lived bearer token used
//! on message and contact requests.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::MessagingError;

/// Bearer token obtained from the provider's token endpoint.
#[derive(Debug, Clone)]
pub struct MessagingToken {
    /// Bearer token for API requests.
    pub access_token: SecretString,
    /// Unix timestamp when the token expires.
    pub expires_at: i64,
}

impl MessagingToken {
    /// Check if the token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        // Consider expired if less than 60 seconds remaining
        now >= self.expires_at - 60
    }
}

/// Request body for the token endpoint.
#[derive(Serialize)]
struct TokenRequest<'a> {
    api_key: &'a str,
}

/// Response from the token endpoint.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Token lifetime in seconds.
    expires_in: i64,
}

/// Exchange the API key for a bearer token.
///
/// # Errors
///
/// Returns `MessagingError::AuthenticationFailed` if the provider
/// rejects the key, or `MessagingError::Http` on transport failure.
#[instrument(skip(api_key))]
pub async fn exchange_token(
    client: &reqwest::Client,
    api_base: &str,
    api_key: &SecretString,
) -> Result<MessagingToken, MessagingError> {
    let now = chrono::Utc::now().timestamp();

    let response = client
        .post(format!("{api_base}/auth/token"))
        .json(&TokenRequest {
            api_key: api_key.expose_secret(),
        })
        .send()
        .await?;

    let status = response.status();

    if status.is_success() {
        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| MessagingError::Parse(format!("Failed to parse token response: {e}")))?;

        Ok(MessagingToken {
            access_token: SecretString::from(token_response.access_token),
            expires_at: now + token_response.expires_in,
        })
    } else {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(MessagingError::AuthenticationFailed(format!(
            "HTTP {status}: {error_text}"
        )))
    }
}

//! Messaging provider API client.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::auth::{MessagingToken, exchange_token};
use super::MessagingError;
use crate::config::MessagingConfig;

/// Per-request timeout; bounds worst-case reconciliation cycle latency.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Messaging provider client.
///
/// Cheap to clone; the HTTP client, configuration, and the cached
/// bearer token live behind an `Arc`. The token is held in the client
/// context and refreshed before use, never in shared global state.
#[derive(Clone)]
pub struct MessagingClient {
    inner: Arc<MessagingClientInner>,
}

struct MessagingClientInner {
    client: reqwest::Client,
    api_base: String,
    api_key: secrecy::SecretString,
    /// In-memory token cache
    token: RwLock<Option<MessagingToken>>,
}

impl std::fmt::Debug for MessagingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingClient")
            .field("api_base", &self.inner.api_base)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Request body for contact create-or-fetch.
#[derive(Serialize)]
struct ContactRequest<'a> {
    phone: &'a str,
}

/// Response from contact create-or-fetch.
#[derive(Deserialize)]
struct ContactResponse {
    id: String,
}

/// Request body for a templated message send.
#[derive(Serialize)]
struct TemplateMessageRequest<'a> {
    contact_id: &'a str,
    template: &'a str,
    params: &'a [String],
}

impl MessagingClient {
    /// Create a new messaging client without a token.
    ///
    /// Call [`Self::ensure_token`] before sending; the scheduler does so
    /// at startup and before every reconciliation cycle.
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::Http` if the HTTP client fails to build.
    pub fn new(config: &MessagingConfig) -> Result<Self, MessagingError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            inner: Arc::new(MessagingClientInner {
                client,
                api_base: config.api_base.clone(),
                api_key: config.api_key.clone(),
                token: RwLock::new(None),
            }),
        })
    }

    /// Refresh-or-reuse the bearer token.
    ///
    /// Cheap when the cached token is still valid. On refresh failure
    /// the previous token (possibly stale or absent) stays in place and
    /// the error is returned for the caller to log; subsequent sends
    /// fail individually and are logged per the fail-open contract.
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::AuthenticationFailed` if the exchange is
    /// rejected, or `MessagingError::Http` on transport failure.
    #[instrument(skip(self))]
    pub async fn ensure_token(&self) -> Result<(), MessagingError> {
        {
            let cached = self.inner.token.read().await;
            if cached.as_ref().is_some_and(|token| !token.is_expired()) {
                debug!("reusing cached messaging token");
                return Ok(());
            }
        }

        let token =
            exchange_token(&self.inner.client, &self.inner.api_base, &self.inner.api_key).await?;
        *self.inner.token.write().await = Some(token);
        debug!("messaging token refreshed");

        Ok(())
    }

    /// Create-or-fetch the contact for a phone number in international
    /// form, returning the provider's stable contact id.
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::NoAccessToken` when no token has ever
    /// been obtained, or an API/transport error from the provider.
    #[instrument(skip(self), fields(phone = %phone))]
    pub async fn contact_for_phone(&self, phone: &str) -> Result<String, MessagingError> {
        let token = self.bearer().await?;

        let response = self
            .inner
            .client
            .post(format!("{}/contacts", self.inner.api_base))
            .bearer_auth(&token)
            .json(&ContactRequest { phone })
            .send()
            .await?;

        let contact: ContactResponse = Self::handle_response(response).await?;

        Ok(contact.id)
    }

    /// Send a named template message to a contact.
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::NoAccessToken` when no token has ever
    /// been obtained, or an API/transport error from the provider.
    #[instrument(skip(self, params), fields(contact_id = %contact_id, template = %template))]
    pub async fn send_template(
        &self,
        contact_id: &str,
        template: &str,
        params: &[String],
    ) -> Result<(), MessagingError> {
        let token = self.bearer().await?;

        let response = self
            .inner
            .client
            .post(format!("{}/messages/template", self.inner.api_base))
            .bearer_auth(&token)
            .json(&TemplateMessageRequest {
                contact_id,
                template,
                params,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MessagingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("template message dispatched");

        Ok(())
    }

    /// The current bearer token value, stale or not.
    ///
    /// Sends deliberately use whatever token is cached: refresh failures
    /// must not block the cycle, and a rejected send is logged by the
    /// dispatcher.
    async fn bearer(&self) -> Result<String, MessagingError> {
        self.inner
            .token
            .read()
            .await
            .as_ref()
            .map(|token| token.access_token.expose_secret().to_string())
            .ok_or(MessagingError::NoAccessToken)
    }

    /// Handle an API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MessagingError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| MessagingError::Parse(format!("Failed to parse response: {e}")));
        }

        let message = response.text().await.unwrap_or_default();
        Err(MessagingError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

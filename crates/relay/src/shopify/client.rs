//! REST client for the platform's order and metafield endpoints.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};
use url::Url;

use super::ShopifyError;
use super::types::{Metafield, MetafieldsResponse, OrderEnvelope};
use crate::config::ShopifyConfig;
use crate::reconcile::StatusSource;

/// Per-request timeout; bounds worst-case reconciliation cycle latency.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Platform API client.
///
/// Cheap to clone; the HTTP clients and configuration live behind an
/// `Arc`.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    /// Client with the access-token header, for Admin API calls.
    api: reqwest::Client,
    /// Plain client for third-party tracking pages. The admin token
    /// must never reach the carrier's servers.
    page: reqwest::Client,
    base_url: String,
    status_namespace: String,
    status_key: String,
    branch_key: String,
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("base_url", &self.inner.base_url)
            .field("status_namespace", &self.inner.status_namespace)
            .field("status_key", &self.inner.status_key)
            .finish_non_exhaustive()
    }
}

impl ShopifyClient {
    /// Create a new platform client.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Parse` if the access token is not a valid
    /// header value, or `ShopifyError::Http` if a client fails to build.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(config.access_token.expose_secret())
            .map_err(|e| ShopifyError::Parse(format!("Invalid access token format: {e}")))?;
        token.set_sensitive(true);
        headers.insert("X-Shopify-Access-Token", token);

        let api = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let page = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                api,
                page,
                base_url: format!(
                    "https://{}/admin/api/{}",
                    config.store, config.api_version
                ),
                status_namespace: config.status_namespace.clone(),
                status_key: config.status_key.clone(),
                branch_key: config.branch_key.clone(),
            }),
        })
    }

    /// Fetch the operational status tag for a branch-pickup order.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::StatusFieldMissing` when the order has no
    /// status metafield yet, or a transport/API error otherwise.
    #[instrument(skip(self))]
    pub async fn operational_status_tag(&self, external_id: i64) -> Result<String, ShopifyError> {
        let metafields = self.order_metafields(external_id).await?;

        find_metafield(&metafields, &self.inner.status_namespace, &self.inner.status_key)
            .map(|field| field.value.clone())
            .ok_or_else(|| ShopifyError::StatusFieldMissing {
                namespace: self.inner.status_namespace.clone(),
                key: self.inner.status_key.clone(),
            })
    }

    /// Fetch the supply-branch label for a pickup order.
    ///
    /// Absence is a valid outcome, not an error; the caller substitutes
    /// a default label.
    ///
    /// # Errors
    ///
    /// Returns a transport/API error if the metafield query fails.
    #[instrument(skip(self))]
    pub async fn branch_name(&self, external_id: i64) -> Result<Option<String>, ShopifyError> {
        let metafields = self.order_metafields(external_id).await?;

        Ok(
            find_metafield(&metafields, &self.inner.status_namespace, &self.inner.branch_key)
                .map(|field| field.value.clone()),
        )
    }

    /// Poll the order's fulfillment list for a carrier tracking URL.
    ///
    /// `None` means "not yet fulfilled", not an error.
    ///
    /// # Errors
    ///
    /// Returns a transport/API error, or `ShopifyError::Parse` when the
    /// platform reports a tracking reference that is not a valid URL.
    #[instrument(skip(self))]
    pub async fn fulfillment_tracking(
        &self,
        external_id: i64,
    ) -> Result<Option<String>, ShopifyError> {
        let url = format!("{}/orders/{external_id}.json", self.inner.base_url);
        let response = self.inner.api.get(&url).send().await?;
        let envelope: OrderEnvelope = Self::handle_response(response).await?;

        let Some(tracking) = envelope
            .into_order()
            .fulfillments
            .into_iter()
            .find_map(|fulfillment| fulfillment.tracking_url)
        else {
            debug!(external_id, "no fulfillment tracking yet");
            return Ok(None);
        };

        let parsed = Url::parse(&tracking)
            .map_err(|e| ShopifyError::Parse(format!("Invalid tracking URL {tracking:?}: {e}")))?;

        Ok(Some(parsed.into()))
    }

    /// Fetch the carrier's public tracking page as opaque text.
    ///
    /// The page is rendered for humans; callers scan it for marker
    /// substrings and never parse it structurally.
    ///
    /// # Errors
    ///
    /// Returns a transport error or `ShopifyError::Api` on a non-success
    /// status from the carrier.
    #[instrument(skip(self), fields(url = %tracking_url))]
    pub async fn tracking_page(&self, tracking_url: &str) -> Result<String, ShopifyError> {
        let response = self.inner.page.get(tracking_url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ShopifyError::Api {
                status: status.as_u16(),
                message: format!("tracking page returned {status}"),
            });
        }

        Ok(response.text().await?)
    }

    /// Fetch all metafields for an order.
    async fn order_metafields(&self, external_id: i64) -> Result<Vec<Metafield>, ShopifyError> {
        let url = format!("{}/orders/{external_id}/metafields.json", self.inner.base_url);
        let response = self.inner.api.get(&url).send().await?;
        let parsed: MetafieldsResponse = Self::handle_response(response).await?;

        Ok(parsed.metafields)
    }

    /// Handle an API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ShopifyError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| ShopifyError::Parse(format!("Failed to parse response: {e}")));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ShopifyError::Unauthorized);
        }

        let message = response.text().await.unwrap_or_default();
        Err(ShopifyError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl StatusSource for ShopifyClient {
    async fn operational_status(&self, external_id: i64) -> Result<String, ShopifyError> {
        self.operational_status_tag(external_id).await
    }

    async fn branch_name(&self, external_id: i64) -> Result<Option<String>, ShopifyError> {
        Self::branch_name(self, external_id).await
    }

    async fn fulfillment_tracking(&self, external_id: i64) -> Result<Option<String>, ShopifyError> {
        Self::fulfillment_tracking(self, external_id).await
    }

    async fn tracking_page(&self, tracking_url: &str) -> Result<String, ShopifyError> {
        Self::tracking_page(self, tracking_url).await
    }
}

/// Find a metafield by namespace and key.
fn find_metafield<'a>(
    metafields: &'a [Metafield],
    namespace: &str,
    key: &str,
) -> Option<&'a Metafield> {
    metafields
        .iter()
        .find(|field| field.namespace == namespace && field.key == key)
}

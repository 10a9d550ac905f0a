//! Order webhook ingestion.
//!
//! Receives the platform's `orders/create` webhook: a batch of raw
//! orders. Every order in the batch is classified before anything is
//! stored, so a malformed entry rejects the whole request and no
//! partial record is ever created.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha256;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::classifier::{OrdersEnvelope, classify_shipping, initial_tracking};
use crate::db::RepositoryError;
use crate::error::AppError;
use crate::models::NewOrder;
use crate::state::AppState;

/// Webhook signature header sent by the platform.
const HMAC_HEADER: &str = "x-shopify-hmac-sha256";

/// Response body for a successful ingestion.
#[derive(Debug, Serialize)]
pub struct CreatedOrders {
    /// Ids of the records created by this request.
    pub created: Vec<Uuid>,
    /// External ids skipped because they were already ingested
    /// (webhook redelivery).
    pub duplicates: Vec<i64>,
}

/// Ingest a batch of new orders.
///
/// When a webhook secret is configured, the raw body's HMAC signature
/// is verified before parsing; a mismatch rejects the request with 401.
#[instrument(skip(state, headers, body))]
pub async fn create_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if let Some(secret) = &state.config().shopify.webhook_secret {
        verify_webhook_signature(secret, &headers, &body)?;
    }

    let envelope: OrdersEnvelope = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("malformed payload: {e}")))?;

    // Classify everything before storing anything: a bad entry rejects
    // the whole batch with nothing written.
    let mut new_orders = Vec::with_capacity(envelope.orders.len());
    for raw in &envelope.orders {
        let shipping_method = classify_shipping(raw)?;

        new_orders.push(NewOrder {
            first_name: raw.billing_address.first_name.clone(),
            last_name: raw.billing_address.last_name.clone(),
            phone: raw.billing_address.phone.clone().unwrap_or_default(),
            items: raw.line_items.iter().map(|item| item.name.clone()).collect(),
            shipping_method,
            external_id: raw.id,
            order_number: raw.name.clone(),
            tracking_url: initial_tracking(raw),
        });
    }

    let mut created = Vec::new();
    let mut duplicates = Vec::new();

    for new_order in new_orders {
        let external_id = new_order.external_id;
        match state.orders().create(new_order).await {
            Ok(order) => {
                info!(
                    order_number = %order.order_number,
                    shipping_method = ?order.shipping_method,
                    "order ingested"
                );
                created.push(order.id);
            }
            Err(RepositoryError::Conflict(_)) => {
                // Webhook redelivery: the record already exists.
                warn!(external_id, "duplicate order webhook, skipping");
                duplicates.push(external_id);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(CreatedOrders {
            created,
            duplicates,
        }),
    ))
}

/// Verify the platform's webhook signature.
///
/// The platform signs the raw request body with HMAC-SHA256 and sends
/// the base64 digest in the `X-Shopify-Hmac-Sha256` header.
fn verify_webhook_signature(
    secret: &SecretString,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), AppError> {
    let provided = headers
        .get(HMAC_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing webhook signature".to_string()))?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    mac.update(body);

    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    // Constant-time comparison
    if !constant_time_compare(&expected, provided) {
        return Err(AppError::Unauthorized("signature mismatch".to_string()));
    }

    Ok(())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

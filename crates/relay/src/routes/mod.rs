//! HTTP route handlers.

pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the relay's router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/webhooks/orders", post(orders::create_orders))
}

/// Default page identifying the service.
async fn index() -> &'static str {
    "parcel-relay"
}

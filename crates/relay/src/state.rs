//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::RelayConfig;
use crate::db::OrderRepository;
use crate::messaging::MessagingClient;
use crate::notify::NotificationService;
use crate::shopify::ShopifyClient;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RelayConfig,
    pool: PgPool,
    orders: OrderRepository,
    shopify: ShopifyClient,
    messaging: MessagingClient,
    dispatcher: NotificationService,
}

impl AppState {
    /// Build the application state.
    #[must_use]
    pub fn new(
        config: RelayConfig,
        pool: PgPool,
        shopify: ShopifyClient,
        messaging: MessagingClient,
        dispatcher: NotificationService,
    ) -> Self {
        let orders = OrderRepository::new(pool.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                orders,
                shopify,
                messaging,
                dispatcher,
            }),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    pub fn orders(&self) -> &OrderRepository {
        &self.inner.orders
    }

    pub fn shopify(&self) -> &ShopifyClient {
        &self.inner.shopify
    }

    pub fn messaging(&self) -> &MessagingClient {
        &self.inner.messaging
    }

    pub fn dispatcher(&self) -> &NotificationService {
        &self.inner.dispatcher
    }
}

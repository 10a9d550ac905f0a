//! Scripted in-memory implementations of the reconciler seams.
//!
//! Each fake records the effects it observes so tests can assert on
//! exactly-once behavior across multiple cycles. Platform answers are
//! behind mutexes and can be re-scripted between cycles to simulate
//! status progression.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use parcel_relay::db::RepositoryError;
use parcel_relay::models::{Order, ShippingMethod};
use parcel_relay::reconcile::{CustomerUpdate, Dispatch, OrderStore, StatusSource};
use parcel_relay::shopify::ShopifyError;

/// Build an in-flight order for tests.
pub fn make_order(method: ShippingMethod, external_id: i64) -> Order {
    Order {
        id: Uuid::new_v4(),
        first_name: "Noa".to_string(),
        last_name: "Levi".to_string(),
        phone: "050-1234567".to_string(),
        items: vec!["Candle".to_string(), "Soap".to_string()],
        shipping_method: method,
        external_id,
        order_number: format!("#{external_id}"),
        tracking_url: None,
        customer_notified: false,
        created_at: Utc::now(),
    }
}

/// In-memory order store recording flag flips and deletes.
#[derive(Default)]
pub struct FakeStore {
    pub orders: Mutex<Vec<Order>>,
    pub deletes: Mutex<Vec<Uuid>>,
}

impl FakeStore {
    pub fn with_orders(orders: Vec<Order>) -> Self {
        Self {
            orders: Mutex::new(orders),
            deletes: Mutex::new(Vec::new()),
        }
    }

    /// Current state of an order, if it still exists.
    pub fn order(&self, id: Uuid) -> Option<Order> {
        self.orders
            .lock()
            .expect("lock")
            .iter()
            .find(|order| order.id == id)
            .cloned()
    }

    pub fn open_count(&self) -> usize {
        self.orders.lock().expect("lock").len()
    }
}

#[async_trait]
impl OrderStore for &FakeStore {
    async fn list_open(&self) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.orders.lock().expect("lock").clone())
    }

    async fn set_tracking_url(&self, id: Uuid, url: &str) -> Result<(), RepositoryError> {
        let mut orders = self.orders.lock().expect("lock");
        let order = orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or(RepositoryError::NotFound)?;
        order.tracking_url = Some(url.to_string());
        Ok(())
    }

    async fn mark_customer_notified(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut orders = self.orders.lock().expect("lock");
        let order = orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if order.customer_notified {
            return Ok(false);
        }
        order.customer_notified = true;
        Ok(true)
    }

    async fn delete_order(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.orders.lock().expect("lock").retain(|order| order.id != id);
        self.deletes.lock().expect("lock").push(id);
        Ok(())
    }
}

/// Scripted platform keyed by external order id.
#[derive(Default)]
pub struct FakePlatform {
    status_tags: Mutex<HashMap<i64, String>>,
    branches: Mutex<HashMap<i64, String>>,
    tracking: Mutex<HashMap<i64, String>>,
    pages: Mutex<HashMap<String, String>>,
}

impl FakePlatform {
    pub fn set_status_tag(&self, external_id: i64, tag: &str) {
        self.status_tags
            .lock()
            .expect("lock")
            .insert(external_id, tag.to_string());
    }

    pub fn set_branch(&self, external_id: i64, branch: &str) {
        self.branches
            .lock()
            .expect("lock")
            .insert(external_id, branch.to_string());
    }

    pub fn set_tracking(&self, external_id: i64, url: &str) {
        self.tracking
            .lock()
            .expect("lock")
            .insert(external_id, url.to_string());
    }

    pub fn set_page(&self, url: &str, content: &str) {
        self.pages
            .lock()
            .expect("lock")
            .insert(url.to_string(), content.to_string());
    }
}

#[async_trait]
impl StatusSource for &FakePlatform {
    async fn operational_status(&self, external_id: i64) -> Result<String, ShopifyError> {
        self.status_tags
            .lock()
            .expect("lock")
            .get(&external_id)
            .cloned()
            .ok_or_else(|| ShopifyError::StatusFieldMissing {
                namespace: "custom".to_string(),
                key: "delivery_status".to_string(),
            })
    }

    async fn branch_name(&self, external_id: i64) -> Result<Option<String>, ShopifyError> {
        Ok(self.branches.lock().expect("lock").get(&external_id).cloned())
    }

    async fn fulfillment_tracking(&self, external_id: i64) -> Result<Option<String>, ShopifyError> {
        Ok(self.tracking.lock().expect("lock").get(&external_id).cloned())
    }

    async fn tracking_page(&self, tracking_url: &str) -> Result<String, ShopifyError> {
        self.pages
            .lock()
            .expect("lock")
            .get(tracking_url)
            .cloned()
            .ok_or(ShopifyError::Api {
                status: 503,
                message: "carrier down".to_string(),
            })
    }
}

/// Dispatcher recording every send.
#[derive(Default)]
pub struct FakeDispatch {
    pub operations: Mutex<Vec<String>>,
    pub customers: Mutex<Vec<(String, CustomerUpdate)>>,
}

impl FakeDispatch {
    pub fn operations_count(&self) -> usize {
        self.operations.lock().expect("lock").len()
    }

    pub fn customer_count(&self) -> usize {
        self.customers.lock().expect("lock").len()
    }

    pub fn customer_updates(&self) -> Vec<(String, CustomerUpdate)> {
        self.customers.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Dispatch for &FakeDispatch {
    async fn notify_operations(&self, order: &Order) {
        self.operations
            .lock()
            .expect("lock")
            .push(order.order_number.clone());
    }

    async fn notify_customer(&self, order: &Order, update: CustomerUpdate) {
        self.customers
            .lock()
            .expect("lock")
            .push((order.order_number.clone(), update));
    }
}

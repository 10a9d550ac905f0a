//! The persisted order record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an order reaches the customer.
///
/// Set exactly once at ingestion from the payload's shipping-line title
/// and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "shipping_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    /// Courier delivery to the customer's home address.
    HomeDelivery,
    /// Pickup from a carrier branch.
    BranchPickup,
}

impl ShippingMethod {
    /// Human-readable label for operations messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HomeDelivery => "home delivery",
            Self::BranchPickup => "branch pickup",
        }
    }
}

/// An order awaiting reconciliation.
///
/// Rows exist only while the order is in flight; reaching the terminal
/// status deletes the row, so re-notification after completion is
/// impossible by construction.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    /// Store-assigned identifier.
    pub id: Uuid,
    /// Customer first name (used in customer messages).
    pub first_name: String,
    /// Customer last name.
    pub last_name: String,
    /// Raw phone string as received; normalized only at send time.
    pub phone: String,
    /// Ordered item names, in payload order.
    pub items: Vec<String>,
    /// Shipping method classified at ingestion.
    pub shipping_method: ShippingMethod,
    /// Order id on the commerce platform.
    pub external_id: i64,
    /// Human-readable order number (e.g. "#1042").
    pub order_number: String,
    /// Carrier tracking page URL, absent until a fulfillment exists.
    pub tracking_url: Option<String>,
    /// Whether the intermediate heads-up went out to the customer.
    ///
    /// Flips false→true at most once and never regresses; the terminal
    /// transition is gated on it.
    pub customer_notified: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Full customer name for operations messages.
    #[must_use]
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields for creating an order record at ingestion.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub items: Vec<String>,
    pub shipping_method: ShippingMethod,
    pub external_id: i64,
    pub order_number: String,
    pub tracking_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_method_label() {
        assert_eq!(ShippingMethod::HomeDelivery.label(), "home delivery");
        assert_eq!(ShippingMethod::BranchPickup.label(), "branch pickup");
    }

    #[test]
    fn test_customer_name() {
        let order = Order {
            id: Uuid::new_v4(),
            first_name: "Noa".to_string(),
            last_name: "Levi".to_string(),
            phone: "050-1234567".to_string(),
            items: vec!["Candle".to_string()],
            shipping_method: ShippingMethod::BranchPickup,
            external_id: 1,
            order_number: "#1001".to_string(),
            tracking_url: None,
            customer_notified: false,
            created_at: Utc::now(),
        };

        assert_eq!(order.customer_name(), "Noa Levi");
    }
}

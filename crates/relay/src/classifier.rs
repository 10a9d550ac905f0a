//! Shipping classification for incoming order payloads.
//!
//! The webhook body carries raw platform orders. Classification derives
//! the shipping method from the declared shipping-line title and extracts
//! the initial tracking reference from the fulfillment list. Pure
//! functions, no I/O.

use serde::Deserialize;
use thiserror::Error;

use crate::models::ShippingMethod;

/// Marker substring in a shipping-line title that selects home-courier
/// delivery ("delivery courier to the home"). Any other title means the
/// order is collected from a carrier branch.
pub const HOME_DELIVERY_MARKER: &str = "שליח עד הבית";

/// Classification failure: the payload carries no usable shipping line.
///
/// The ingestion boundary must reject such payloads outright; no partial
/// record is ever created for them.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Neither a shipping-lines array entry nor a single shipping-line
    /// object is present.
    #[error("order {order_number:?} has no shipping line")]
    MissingShippingLine {
        /// Human-readable order number, for the rejection message.
        order_number: String,
    },
}

/// Webhook envelope: a batch of raw platform orders.
#[derive(Debug, Deserialize)]
pub struct OrdersEnvelope {
    pub orders: Vec<RawOrder>,
}

/// A raw order as delivered by the platform webhook.
///
/// Only the fields the relay consumes are modeled; everything else in
/// the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct RawOrder {
    /// Platform order id.
    pub id: i64,
    /// Human-readable order number (e.g. "#1042").
    pub name: String,
    pub billing_address: BillingAddress,
    /// Some payload revisions deliver an array of shipping lines...
    #[serde(default)]
    pub shipping_lines: Vec<ShippingLine>,
    /// ...others a single object.
    #[serde(default)]
    pub shipping_line: Option<ShippingLine>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub fulfillments: Vec<Fulfillment>,
}

/// Billing contact details.
#[derive(Debug, Deserialize)]
pub struct BillingAddress {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A declared shipping line.
#[derive(Debug, Deserialize)]
pub struct ShippingLine {
    pub title: String,
}

/// An ordered item.
#[derive(Debug, Deserialize)]
pub struct LineItem {
    pub name: String,
}

/// A platform fulfillment record.
#[derive(Debug, Deserialize)]
pub struct Fulfillment {
    #[serde(default)]
    pub tracking_url: Option<String>,
}

impl RawOrder {
    /// The effective shipping-line title: first entry of the array, or
    /// the single object when the payload omits the array.
    fn shipping_title(&self) -> Option<&str> {
        self.shipping_lines
            .first()
            .or(self.shipping_line.as_ref())
            .map(|line| line.title.as_str())
    }
}

/// Classify an order's shipping method from its shipping-line title.
///
/// # Errors
///
/// Returns `ClassifyError::MissingShippingLine` when the payload has no
/// shipping line at all; the caller must reject the payload.
pub fn classify_shipping(order: &RawOrder) -> Result<ShippingMethod, ClassifyError> {
    let title = order
        .shipping_title()
        .ok_or_else(|| ClassifyError::MissingShippingLine {
            order_number: order.name.clone(),
        })?;

    if title.contains(HOME_DELIVERY_MARKER) {
        Ok(ShippingMethod::HomeDelivery)
    } else {
        Ok(ShippingMethod::BranchPickup)
    }
}

/// Initial tracking reference: the first fulfillment's tracking URL, if
/// the order was already fulfilled when the webhook fired.
#[must_use]
pub fn initial_tracking(order: &RawOrder) -> Option<String> {
    order
        .fulfillments
        .first()
        .and_then(|fulfillment| fulfillment.tracking_url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_from(value: serde_json::Value) -> RawOrder {
        serde_json::from_value(value).expect("valid raw order")
    }

    #[test]
    fn test_home_delivery_marker_classifies_home_delivery() {
        let order = order_from(json!({
            "id": 1,
            "name": "#1001",
            "billing_address": {"first_name": "Noa", "last_name": "Levi"},
            "shipping_lines": [{"title": "שליח עד הבית - תל אביב"}],
        }));

        assert_eq!(
            classify_shipping(&order).expect("classified"),
            ShippingMethod::HomeDelivery
        );
    }

    #[test]
    fn test_other_titles_classify_branch_pickup() {
        for title in ["איסוף מסניף", "נקודת חלוקה", "Standard Shipping"] {
            let order = order_from(json!({
                "id": 2,
                "name": "#1002",
                "billing_address": {"first_name": "Dan", "last_name": "Peretz"},
                "shipping_lines": [{"title": title}],
            }));

            assert_eq!(
                classify_shipping(&order).expect("classified"),
                ShippingMethod::BranchPickup,
                "title {title:?} should classify as pickup"
            );
        }
    }

    #[test]
    fn test_single_shipping_line_object_is_accepted() {
        let order = order_from(json!({
            "id": 3,
            "name": "#1003",
            "billing_address": {"first_name": "Noa", "last_name": "Levi"},
            "shipping_line": {"title": "שליח עד הבית"},
        }));

        assert_eq!(
            classify_shipping(&order).expect("classified"),
            ShippingMethod::HomeDelivery
        );
    }

    #[test]
    fn test_array_takes_precedence_over_single_object() {
        let order = order_from(json!({
            "id": 4,
            "name": "#1004",
            "billing_address": {"first_name": "Noa", "last_name": "Levi"},
            "shipping_lines": [{"title": "איסוף מסניף"}],
            "shipping_line": {"title": "שליח עד הבית"},
        }));

        assert_eq!(
            classify_shipping(&order).expect("classified"),
            ShippingMethod::BranchPickup
        );
    }

    #[test]
    fn test_missing_shipping_line_is_rejected() {
        let order = order_from(json!({
            "id": 5,
            "name": "#1005",
            "billing_address": {"first_name": "Noa", "last_name": "Levi"},
        }));

        let err = classify_shipping(&order).expect_err("must reject");
        assert!(matches!(err, ClassifyError::MissingShippingLine { .. }));
        assert!(err.to_string().contains("#1005"));
    }

    #[test]
    fn test_initial_tracking_from_first_fulfillment() {
        let order = order_from(json!({
            "id": 6,
            "name": "#1006",
            "billing_address": {"first_name": "Noa", "last_name": "Levi"},
            "shipping_lines": [{"title": "שליח עד הבית"}],
            "fulfillments": [
                {"tracking_url": "https://carrier.example/track/abc"},
                {"tracking_url": "https://carrier.example/track/def"}
            ],
        }));

        assert_eq!(
            initial_tracking(&order).as_deref(),
            Some("https://carrier.example/track/abc")
        );
    }

    #[test]
    fn test_initial_tracking_absent_for_empty_fulfillments() {
        // The end-to-end shape from the webhook: home delivery, nothing
        // fulfilled yet.
        let order = order_from(json!({
            "id": 7,
            "name": "#1007",
            "billing_address": {"first_name": "Noa", "last_name": "Levi"},
            "shipping_lines": [{"title": "שליח עד הבית"}],
            "fulfillments": [],
        }));

        assert_eq!(
            classify_shipping(&order).expect("classified"),
            ShippingMethod::HomeDelivery
        );
        assert_eq!(initial_tracking(&order), None);
    }

    #[test]
    fn test_fulfillment_without_tracking_url_yields_none() {
        let order = order_from(json!({
            "id": 8,
            "name": "#1008",
            "billing_address": {"first_name": "Noa", "last_name": "Levi"},
            "shipping_lines": [{"title": "איסוף מסניף"}],
            "fulfillments": [{}],
        }));

        assert_eq!(initial_tracking(&order), None);
    }
}

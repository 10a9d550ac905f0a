//! Response types for the platform's order and metafield endpoints.
//!
//! Different platform API revisions wrap the order resource differently:
//! some return the resource at the top level, others nest it under an
//! `order` key. The untagged [`OrderEnvelope`] accepts both so the
//! choice stays inside this adapter.

use serde::Deserialize;

/// Response from the order metafields endpoint.
#[derive(Debug, Deserialize)]
pub struct MetafieldsResponse {
    #[serde(default)]
    pub metafields: Vec<Metafield>,
}

/// A single order metafield.
#[derive(Debug, Clone, Deserialize)]
pub struct Metafield {
    pub namespace: String,
    pub key: String,
    pub value: String,
}

/// Order resource envelope: flat or nested under `order`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OrderEnvelope {
    Wrapped { order: OrderResource },
    Flat(OrderResource),
}

impl OrderEnvelope {
    /// The order resource, whichever shape it arrived in.
    #[must_use]
    pub fn into_order(self) -> OrderResource {
        match self {
            Self::Wrapped { order } | Self::Flat(order) => order,
        }
    }
}

/// The slice of the platform order resource the relay consumes.
#[derive(Debug, Deserialize)]
pub struct OrderResource {
    #[serde(default)]
    pub fulfillments: Vec<FulfillmentResource>,
}

/// A platform fulfillment record.
#[derive(Debug, Deserialize)]
pub struct FulfillmentResource {
    #[serde(default)]
    pub tracking_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_envelope_nested() {
        let json = r#"{"order": {"fulfillments": [{"tracking_url": "https://t.example/1"}]}}"#;
        let envelope: OrderEnvelope = serde_json::from_str(json).expect("parses");
        let order = envelope.into_order();
        assert_eq!(order.fulfillments.len(), 1);
        assert_eq!(
            order.fulfillments.first().and_then(|f| f.tracking_url.as_deref()),
            Some("https://t.example/1")
        );
    }

    #[test]
    fn test_order_envelope_flat() {
        let json = r#"{"fulfillments": []}"#;
        let envelope: OrderEnvelope = serde_json::from_str(json).expect("parses");
        assert!(envelope.into_order().fulfillments.is_empty());
    }

    #[test]
    fn test_metafields_response() {
        let json = r#"{"metafields": [
            {"namespace": "custom", "key": "delivery_status", "value": "הגיע לסניף"},
            {"namespace": "custom", "key": "pickup_branch", "value": "סניף דיזנגוף"}
        ]}"#;
        let response: MetafieldsResponse = serde_json::from_str(json).expect("parses");
        assert_eq!(response.metafields.len(), 2);
    }
}

//! Slack message builders for operations alerts.

use crate::models::{Order, ShippingMethod};

use super::types::{Block, ContextElement, PlainText, Text};

/// Build the completion summary posted when an order reaches its
/// terminal status, just before the record is deleted.
///
/// The message includes:
/// - Header with the order number
/// - Customer name and phone
/// - Shipping method and item list
/// - Tracking link when one is known
#[must_use]
pub fn build_order_summary(order: &Order) -> Vec<Block> {
    let emoji = method_emoji(order.shipping_method);

    let mut blocks = vec![
        Block::Header {
            text: PlainText::new(format!("{emoji} Order {} completed", order.order_number)),
        },
        Block::Section {
            text: Text::mrkdwn(format!(
                "*Customer:* {}\n*Phone:* {}",
                order.customer_name(),
                order.phone
            )),
        },
        Block::Section {
            text: Text::mrkdwn(format!(
                "*Shipping:* {}\n*Items:*\n{}",
                order.shipping_method.label(),
                format_items(&order.items)
            )),
        },
    ];

    if let Some(tracking_url) = &order.tracking_url {
        blocks.push(Block::Section {
            text: Text::mrkdwn(format!("*Tracking:* <{tracking_url}>")),
        });
    }

    blocks.push(Block::Divider);
    blocks.push(Block::Context {
        elements: vec![ContextElement::Mrkdwn {
            text: format!("platform order id {}", order.external_id),
        }],
    });

    blocks
}

/// Get an emoji for a shipping method.
const fn method_emoji(method: ShippingMethod) -> &'static str {
    match method {
        ShippingMethod::HomeDelivery => "🚚",
        ShippingMethod::BranchPickup => "📦",
    }
}

/// Format the item list as markdown bullets.
fn format_items(items: &[String]) -> String {
    if items.is_empty() {
        return "_(no items)_".to_string();
    }

    items
        .iter()
        .map(|item| format!("• {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn order(method: ShippingMethod, tracking: Option<&str>) -> Order {
        Order {
            id: Uuid::new_v4(),
            first_name: "Noa".to_string(),
            last_name: "Levi".to_string(),
            phone: "050-1234567".to_string(),
            items: vec!["Candle".to_string(), "Soap".to_string()],
            shipping_method: method,
            external_id: 4242,
            order_number: "#1042".to_string(),
            tracking_url: tracking.map(String::from),
            customer_notified: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_for_pickup_order() {
        let blocks = build_order_summary(&order(ShippingMethod::BranchPickup, None));

        // Header, two sections, divider, context
        assert_eq!(blocks.len(), 5);
        match blocks.first().expect("header") {
            Block::Header { text } => {
                assert!(text.text.contains("#1042"));
                assert!(text.text.contains('📦'));
            }
            _ => panic!("Expected Header block"),
        }
    }

    #[test]
    fn test_summary_includes_tracking_when_known() {
        let blocks = build_order_summary(&order(
            ShippingMethod::HomeDelivery,
            Some("https://carrier.example/track/abc"),
        ));

        // Header, three sections, divider, context
        assert_eq!(blocks.len(), 6);
        let has_tracking = blocks.iter().any(|block| match block {
            Block::Section {
                text: Text::Mrkdwn { text },
            } => text.contains("https://carrier.example/track/abc"),
            _ => false,
        });
        assert!(has_tracking);
    }

    #[test]
    fn test_format_items() {
        assert_eq!(
            format_items(&["Candle".to_string(), "Soap".to_string()]),
            "• Candle\n• Soap"
        );
        assert_eq!(format_items(&[]), "_(no items)_");
    }
}

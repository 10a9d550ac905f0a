//! Notification dispatch.
//!
//! Bridges the reconciler's [`Dispatch`] seam to the real channels:
//! operations summaries go to Slack (when configured), customer updates
//! go through the template-messaging provider. Every failure path here
//! logs and returns — notification delivery is best-effort by contract,
//! and a missed message must never abort or roll back a reconciliation
//! transition.

use async_trait::async_trait;
use tracing::{debug, error, instrument, warn};

use crate::config::MessagingConfig;
use crate::messaging::{MessagingClient, phone};
use crate::models::Order;
use crate::reconcile::{CustomerUpdate, Dispatch};
use crate::slack::{SlackClient, build_order_summary};

/// Dispatcher for operations and customer notifications.
#[derive(Debug, Clone)]
pub struct NotificationService {
    slack: Option<SlackClient>,
    messaging: MessagingClient,
    pickup_template: String,
    delivery_template: String,
    default_country: String,
}

impl NotificationService {
    /// Create a new notification service.
    ///
    /// `slack` is optional; without it, operations alerts are skipped
    /// (and logged at debug level).
    #[must_use]
    pub fn new(
        slack: Option<SlackClient>,
        messaging: MessagingClient,
        config: &MessagingConfig,
    ) -> Self {
        Self {
            slack,
            messaging,
            pickup_template: config.pickup_template.clone(),
            delivery_template: config.delivery_template.clone(),
            default_country: config.default_country.clone(),
        }
    }

    /// Template name and parameters for a customer update.
    ///
    /// Pickup: first name, order number, branch. Delivery: first name,
    /// order number, tracking URL.
    fn template_for(&self, order: &Order, update: &CustomerUpdate) -> (String, Vec<String>) {
        match update {
            CustomerUpdate::Pickup { branch } => (
                self.pickup_template.clone(),
                vec![
                    order.first_name.clone(),
                    order.order_number.clone(),
                    branch.clone(),
                ],
            ),
            CustomerUpdate::Delivery { tracking_url } => (
                self.delivery_template.clone(),
                vec![
                    order.first_name.clone(),
                    order.order_number.clone(),
                    tracking_url.clone(),
                ],
            ),
        }
    }
}

#[async_trait]
impl Dispatch for NotificationService {
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    async fn notify_operations(&self, order: &Order) {
        let Some(slack) = &self.slack else {
            debug!("Slack not configured, skipping operations summary");
            return;
        };

        let blocks = build_order_summary(order);
        let fallback = format!("Order {} completed", order.order_number);

        if let Err(e) = slack.post_message(blocks, Some(&fallback)).await {
            error!(error = %e, "failed to post operations summary");
        }
    }

    #[instrument(skip(self, order, update), fields(order_number = %order.order_number))]
    async fn notify_customer(&self, order: &Order, update: CustomerUpdate) {
        // Unparseable phones are skipped silently: no contact, no
        // notification, no error.
        let Some(msisdn) = phone::normalize(&order.phone, &self.default_country) else {
            debug!(phone = %order.phone, "phone not normalizable, skipping customer update");
            return;
        };

        let contact_id = match self.messaging.contact_for_phone(&msisdn).await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "contact lookup failed; customer update dropped");
                return;
            }
        };

        let (template, params) = self.template_for(order, &update);

        if let Err(e) = self
            .messaging
            .send_template(&contact_id, &template, &params)
            .await
        {
            warn!(error = %e, template = %template, "customer template send failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use secrecy::SecretString;
    use uuid::Uuid;

    use crate::models::ShippingMethod;

    fn service() -> NotificationService {
        let config = MessagingConfig {
            api_base: "https://messaging.example".to_string(),
            api_key: SecretString::from("msg_test_key"),
            pickup_template: "order_arrived_pickup".to_string(),
            delivery_template: "order_shipped".to_string(),
            default_country: "972".to_string(),
        };
        let messaging = MessagingClient::new(&config).expect("client builds");
        NotificationService::new(None, messaging, &config)
    }

    fn order(method: ShippingMethod) -> Order {
        Order {
            id: Uuid::new_v4(),
            first_name: "Noa".to_string(),
            last_name: "Levi".to_string(),
            phone: "050-1234567".to_string(),
            items: vec!["Candle".to_string()],
            shipping_method: method,
            external_id: 4242,
            order_number: "#1042".to_string(),
            tracking_url: None,
            customer_notified: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_pickup_template_params() {
        let service = service();
        let (template, params) = service.template_for(
            &order(ShippingMethod::BranchPickup),
            &CustomerUpdate::Pickup {
                branch: "סניף דיזנגוף".to_string(),
            },
        );

        assert_eq!(template, "order_arrived_pickup");
        assert_eq!(params, vec!["Noa", "#1042", "סניף דיזנגוף"]);
    }

    #[test]
    fn test_delivery_template_params() {
        let service = service();
        let (template, params) = service.template_for(
            &order(ShippingMethod::HomeDelivery),
            &CustomerUpdate::Delivery {
                tracking_url: "https://carrier.example/track/abc".to_string(),
            },
        );

        assert_eq!(template, "order_shipped");
        assert_eq!(
            params,
            vec!["Noa", "#1042", "https://carrier.example/track/abc"]
        );
    }

    #[tokio::test]
    async fn test_operations_summary_skipped_without_slack() {
        // Must return without error (and without attempting any I/O).
        let service = service();
        service.notify_operations(&order(ShippingMethod::BranchPickup)).await;
    }

    #[tokio::test]
    async fn test_customer_update_skipped_for_bad_phone() {
        let service = service();
        let mut order = order(ShippingMethod::BranchPickup);
        order.phone = "not a phone".to_string();

        // Skipped before any network call: completes immediately.
        service
            .notify_customer(
                &order,
                CustomerUpdate::Pickup {
                    branch: "סניף".to_string(),
                },
            )
            .await;
    }
}

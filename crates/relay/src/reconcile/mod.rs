//! Order lifecycle reconciliation.
//!
//! The reconciler walks every open order once per cycle and drives a
//! small per-order state machine:
//!
//! - **intermediate**: the shipment is progressing (arrived at the
//!   pickup branch, or entered the carrier's sorting facility). The
//!   customer gets a one-time heads-up and the order's
//!   `customer_notified` flag flips true.
//! - **terminal**: the shipment completed (collected, delivered,
//!   closed). Operations get a summary and the record is deleted.
//!
//! The terminal transition is gated on the flag so the heads-up always
//! precedes completion; a cycle that observes a terminal signal on an
//! un-notified order takes no action and waits for a later cycle.
//!
//! Orders are processed concurrently and independently: one order's
//! platform or dispatch failure is logged and leaves that order's state
//! untouched for the next cycle, without affecting the rest. Only a
//! store failure while listing orders aborts a cycle.

pub mod scheduler;
pub mod status;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::db::RepositoryError;
use crate::models::{Order, ShippingMethod};
use crate::shopify::ShopifyError;

use self::status::{PageStatus, PickupStatus};

/// Branch label used in customer messages when the platform has none.
const FALLBACK_BRANCH_LABEL: &str = "הסניף שבחרת בהזמנה";

/// Store operations the reconciler needs.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// All currently open orders.
    async fn list_open(&self) -> Result<Vec<Order>, RepositoryError>;

    /// Persist a newly discovered tracking URL.
    async fn set_tracking_url(&self, id: Uuid, url: &str) -> Result<(), RepositoryError>;

    /// Flip the customer-notified flag if it is still unset; `true`
    /// when this call won the flip.
    async fn mark_customer_notified(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// Remove a completed order.
    async fn delete_order(&self, id: Uuid) -> Result<(), RepositoryError>;
}

/// Platform signals the reconciler consumes.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Operational status tag for a pickup order.
    async fn operational_status(&self, external_id: i64) -> Result<String, ShopifyError>;

    /// Supply-branch label; `None` is valid.
    async fn branch_name(&self, external_id: i64) -> Result<Option<String>, ShopifyError>;

    /// Carrier tracking URL; `None` means not yet fulfilled.
    async fn fulfillment_tracking(&self, external_id: i64) -> Result<Option<String>, ShopifyError>;

    /// Carrier tracking page content, as opaque text.
    async fn tracking_page(&self, tracking_url: &str) -> Result<String, ShopifyError>;
}

/// A customer-facing status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerUpdate {
    /// Parcel waiting at a branch.
    Pickup { branch: String },
    /// Shipment on its way; tracking link included.
    Delivery { tracking_url: String },
}

/// Notification sinks. Implementations are fail-open: failures are
/// logged inside and never propagated, so a missed message cannot
/// abort or roll back a transition.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Post the completion summary to the operations channel.
    async fn notify_operations(&self, order: &Order);

    /// Send the templated heads-up to the customer.
    async fn notify_customer(&self, order: &Order, update: CustomerUpdate);
}

/// Errors that stop reconciliation of a single order.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Platform query failed; the order is retried next cycle.
    #[error("platform error: {0}")]
    Platform(#[from] ShopifyError),

    /// Store mutation failed; the order is retried next cycle.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}

/// What a cycle did to one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOutcome {
    /// No transition detected.
    Unchanged,
    /// Intermediate transition: customer heads-up sent, flag set.
    CustomerNotified,
    /// Terminal transition: summary sent, record deleted.
    Completed,
}

/// Aggregate counts for one reconciliation cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Orders examined.
    pub processed: usize,
    /// Intermediate transitions.
    pub notified: usize,
    /// Terminal transitions.
    pub completed: usize,
    /// Orders whose processing failed and will be retried.
    pub failed: usize,
}

/// The reconciliation engine, generic over its seams.
pub struct Reconciler<S, P, D> {
    store: S,
    platform: P,
    dispatch: D,
}

impl<S, P, D> Reconciler<S, P, D>
where
    S: OrderStore,
    P: StatusSource,
    D: Dispatch,
{
    /// Create a new reconciler.
    pub const fn new(store: S, platform: P, dispatch: D) -> Self {
        Self {
            store,
            platform,
            dispatch,
        }
    }

    /// Run one reconciliation cycle over all open orders.
    ///
    /// Per-order work runs concurrently with no ordering guarantee;
    /// failures are isolated per order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` only when the store cannot list open
    /// orders; the whole cycle is abandoned and retried next tick.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleReport, RepositoryError> {
        let orders = self.store.list_open().await?;

        let mut report = CycleReport {
            processed: orders.len(),
            ..CycleReport::default()
        };

        let outcomes = join_all(orders.into_iter().map(|order| self.process_order(order))).await;

        for outcome in outcomes {
            match outcome {
                Some(OrderOutcome::CustomerNotified) => report.notified += 1,
                Some(OrderOutcome::Completed) => report.completed += 1,
                Some(OrderOutcome::Unchanged) => {}
                None => report.failed += 1,
            }
        }

        info!(
            processed = report.processed,
            notified = report.notified,
            completed = report.completed,
            failed = report.failed,
            "reconciliation cycle finished"
        );

        Ok(report)
    }

    /// Process one order, catching its errors so other orders proceed.
    async fn process_order(&self, order: Order) -> Option<OrderOutcome> {
        let order_number = order.order_number.clone();

        let result = match order.shipping_method {
            ShippingMethod::BranchPickup => self.reconcile_pickup(&order).await,
            ShippingMethod::HomeDelivery => self.reconcile_delivery(order).await,
        };

        match result {
            Ok(outcome) => Some(outcome),
            Err(error) => {
                warn!(
                    order_number = %order_number,
                    error = %error,
                    "order reconciliation failed; will retry next cycle"
                );
                None
            }
        }
    }

    /// Branch-pickup flow, driven by the operational status tag.
    async fn reconcile_pickup(&self, order: &Order) -> Result<OrderOutcome, ReconcileError> {
        let tag = match self.platform.operational_status(order.external_id).await {
            Ok(tag) => tag,
            Err(error) if error.is_status_field_missing() => {
                debug!(order_number = %order.order_number, "no status tag yet");
                return Ok(OrderOutcome::Unchanged);
            }
            Err(error) => return Err(error.into()),
        };

        match PickupStatus::from_tag(&tag) {
            Some(state) if state.is_terminal() => {
                if order.customer_notified {
                    self.finalize(order).await?;
                    Ok(OrderOutcome::Completed)
                } else {
                    // The heads-up has not gone out yet; hold the
                    // terminal transition for a later cycle.
                    debug!(
                        order_number = %order.order_number,
                        tag = %tag,
                        "terminal tag before customer heads-up; waiting"
                    );
                    Ok(OrderOutcome::Unchanged)
                }
            }
            Some(PickupStatus::ArrivedAtBranch) if !order.customer_notified => {
                // Flag first: if another cycle got here in parallel,
                // exactly one of us wins and sends.
                if !self.store.mark_customer_notified(order.id).await? {
                    return Ok(OrderOutcome::Unchanged);
                }

                let branch = match self.platform.branch_name(order.external_id).await {
                    Ok(Some(branch)) => branch,
                    Ok(None) => FALLBACK_BRANCH_LABEL.to_string(),
                    Err(error) => {
                        // The flag is already set; dropping the message
                        // now would lose the heads-up forever.
                        warn!(
                            order_number = %order.order_number,
                            error = %error,
                            "branch lookup failed; using fallback label"
                        );
                        FALLBACK_BRANCH_LABEL.to_string()
                    }
                };

                self.dispatch
                    .notify_customer(order, CustomerUpdate::Pickup { branch })
                    .await;

                Ok(OrderOutcome::CustomerNotified)
            }
            _ => Ok(OrderOutcome::Unchanged),
        }
    }

    /// Home-delivery flow, driven by the carrier tracking page.
    async fn reconcile_delivery(&self, order: Order) -> Result<OrderOutcome, ReconcileError> {
        if let Some(tracking_url) = order.tracking_url.clone() {
            return self.evaluate_tracking(&order, &tracking_url).await;
        }

        // No tracking reference yet: ask the platform once per cycle.
        let Some(tracking_url) = self.platform.fulfillment_tracking(order.external_id).await?
        else {
            return Ok(OrderOutcome::Unchanged);
        };

        self.store.set_tracking_url(order.id, &tracking_url).await?;
        info!(
            order_number = %order.order_number,
            "tracking URL discovered"
        );

        let mut updated = order;
        updated.tracking_url = Some(tracking_url.clone());

        // Single bounded re-evaluation within the same cycle.
        self.evaluate_tracking(&updated, &tracking_url).await
    }

    /// Evaluate the tracking page rules for an order with a known URL.
    async fn evaluate_tracking(
        &self,
        order: &Order,
        tracking_url: &str,
    ) -> Result<OrderOutcome, ReconcileError> {
        let content = self.platform.tracking_page(tracking_url).await?;

        match PageStatus::classify(&content) {
            Some(PageStatus::Terminal) => {
                if order.customer_notified {
                    self.finalize(order).await?;
                    Ok(OrderOutcome::Completed)
                } else {
                    debug!(
                        order_number = %order.order_number,
                        "terminal page before customer heads-up; waiting"
                    );
                    Ok(OrderOutcome::Unchanged)
                }
            }
            Some(PageStatus::Intermediate) if !order.customer_notified => {
                if !self.store.mark_customer_notified(order.id).await? {
                    return Ok(OrderOutcome::Unchanged);
                }

                self.dispatch
                    .notify_customer(
                        order,
                        CustomerUpdate::Delivery {
                            tracking_url: tracking_url.to_string(),
                        },
                    )
                    .await;

                Ok(OrderOutcome::CustomerNotified)
            }
            _ => Ok(OrderOutcome::Unchanged),
        }
    }

    /// Terminal transition: summary first, then delete.
    ///
    /// The summary send is attempted before the delete, but a failed
    /// send (logged by the dispatcher) does not block cleanup.
    async fn finalize(&self, order: &Order) -> Result<(), ReconcileError> {
        self.dispatch.notify_operations(order).await;
        self.store.delete_order(order.id).await?;

        info!(order_number = %order.order_number, "order completed and retired");

        Ok(())
    }
}

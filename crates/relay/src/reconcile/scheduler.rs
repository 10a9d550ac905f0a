//! Reconciliation scheduling.
//!
//! A single background task owns the cadence: refresh the messaging
//! credential, run one cycle, sleep until the next tick. The cycle is
//! awaited inline, so two cycles can never overlap — a tick that fires
//! while a cycle is still running is delayed, not stacked.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::messaging::MessagingClient;

use super::{Dispatch, OrderStore, Reconciler, StatusSource};

/// Spawn the reconciliation loop.
///
/// Runs until the process exits; in-flight work on shutdown is dropped,
/// which is safe because every transition is re-detected by polling
/// except the terminal delete, and that only happens after its summary
/// send was attempted.
pub fn spawn<S, P, D>(
    reconciler: Reconciler<S, P, D>,
    messaging: MessagingClient,
    period: Duration,
) -> tokio::task::JoinHandle<()>
where
    S: OrderStore + 'static,
    P: StatusSource + 'static,
    D: Dispatch + 'static,
{
    info!(period_secs = period.as_secs(), "starting reconciliation loop");

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // Never stack cycles behind a slow one; just run late.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            // Refresh-or-reuse the messaging credential before the
            // cycle; on failure the cycle proceeds with whatever token
            // is cached and individual sends fail and get logged.
            if let Err(e) = messaging.ensure_token().await {
                warn!(error = %e, "messaging token refresh failed; proceeding");
            }

            if let Err(e) = reconciler.run_cycle().await {
                error!(error = %e, "reconciliation cycle aborted; store unavailable");
            }
        }
    })
}

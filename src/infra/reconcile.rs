use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::use_cases::subscription_lifecycle::SubscriptionLifecycleUseCases;

/// Run the reconcile sweep every `interval_secs`. The first sweep runs
/// immediately. Failures are logged and retried on the next tick.
pub async fn run_reconcile_loop(use_cases: Arc<SubscriptionLifecycleUseCases>, interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Subscription reconcile loop started (every {}s)",
        interval_secs
    );

    loop {
        ticker.tick().await;

        match use_cases.reconcile_expired().await {
            Ok(report) if report.total_expired() > 0 || report.total_skipped() > 0 => {
                info!(
                    expired = report.total_expired(),
                    skipped = report.total_skipped(),
                    "Scheduled reconcile marked subscriptions expired"
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = ?e, "Scheduled reconcile failed");
            }
        }
    }
}

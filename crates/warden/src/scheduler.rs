//! Background expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use warden_batch::{Cancellable, CancellationToken};
use warden_core::traits::INoticeDispatcher;

use crate::pipeline::TriagePipeline;

/// Run the expiry sweep every `interval` until `stop` is cancelled.
///
/// The stop flag is checked on each tick, so shutdown takes at most one
/// interval. A failed sweep is logged and retried on the next tick.
pub fn spawn_expiry_scheduler<D: INoticeDispatcher + 'static>(
    pipeline: Arc<TriagePipeline<D>>,
    interval: Duration,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "expiry scheduler started");
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if stop.is_cancelled() {
                break;
            }
            if let Err(e) = pipeline.lifecycle().sweep_expired(Utc::now()).await {
                error!(error = %e, "expiry sweep failed");
            }
        }
        info!("expiry scheduler stopped");
    })
}

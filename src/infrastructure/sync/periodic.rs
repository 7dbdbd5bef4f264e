use super::wake::{SyncWaker, WakeReason};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Best-effort periodic wake. Missed ticks are skipped rather than bursted.
pub fn spawn_periodic_wake(waker: SyncWaker, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if waker.is_closed() {
                break;
            }
            waker.notify(WakeReason::Periodic);
        }
        tracing::debug!(target: "offline::trigger", "periodic wake stopped");
    })
}

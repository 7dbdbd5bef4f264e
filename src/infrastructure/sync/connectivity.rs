use super::wake::{SyncWaker, WakeReason};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Online,
    Offline,
}

/// Fires a wake on every offline to online transition. Registered once at startup.
pub fn spawn_connectivity_listener(
    mut rx: watch::Receiver<ConnectivityState>,
    waker: SyncWaker,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut previous = *rx.borrow_and_update();
        while rx.changed().await.is_ok() {
            let current = *rx.borrow_and_update();
            if previous == ConnectivityState::Offline && current == ConnectivityState::Online {
                tracing::info!(target: "offline::trigger", "connectivity restored");
                waker.notify(WakeReason::ConnectivityRestored);
            }
            previous = current;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::sync_runner::SyncRunner;
    use crate::domain::entities::offline::SyncResult;
    use crate::infrastructure::sync::wake::{BACKGROUND_SYNC_TAG, SyncTriggerLoop};
    use crate::shared::error::AppError;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use tokio::time::{Duration, timeout};

    struct ForwardingRunner(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl SyncRunner for ForwardingRunner {
        async fn run_once(&self, trigger: &str) -> Result<SyncResult, AppError> {
            let _ = self.0.send(trigger.to_string());
            Ok(SyncResult::default())
        }
    }

    #[tokio::test]
    async fn only_offline_to_online_transition_wakes() {
        let (runs_tx, mut runs_rx) = mpsc::unbounded_channel();
        let (waker, trigger_loop) =
            SyncTriggerLoop::channel(Arc::new(ForwardingRunner(runs_tx)), 4);
        trigger_loop.spawn();

        let (state_tx, state_rx) = watch::channel(ConnectivityState::Online);
        spawn_connectivity_listener(state_rx, waker);

        state_tx.send(ConnectivityState::Offline).unwrap();
        tokio::task::yield_now().await;
        state_tx.send(ConnectivityState::Online).unwrap();

        let trigger = timeout(Duration::from_secs(2), runs_rx.recv())
            .await
            .expect("wake within timeout")
            .unwrap();
        assert_eq!(trigger, BACKGROUND_SYNC_TAG);

        state_tx.send(ConnectivityState::Online).unwrap();
        assert!(
            timeout(Duration::from_millis(100), runs_rx.recv())
                .await
                .is_err()
        );
    }
}

use crate::application::ports::sync_runner::SyncRunner;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Stable tag of the connectivity-regained wake. Re-registering under the same tag
/// replaces the previous registration instead of adding one.
pub const BACKGROUND_SYNC_TAG: &str = "catch-sync-background";
pub const PERIODIC_SYNC_TAG: &str = "catch-sync-periodic";
pub const MANUAL_SYNC_TAG: &str = "catch-sync-manual";
pub const ENQUEUE_SYNC_TAG: &str = "catch-sync-enqueue";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    ConnectivityRestored,
    Periodic,
    Manual,
    Enqueued,
}

impl WakeReason {
    pub fn tag(&self) -> &'static str {
        match self {
            WakeReason::ConnectivityRestored => BACKGROUND_SYNC_TAG,
            WakeReason::Periodic => PERIODIC_SYNC_TAG,
            WakeReason::Manual => MANUAL_SYNC_TAG,
            WakeReason::Enqueued => ENQUEUE_SYNC_TAG,
        }
    }
}

/// Reply to a manual wake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WakeAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WakeAck {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug)]
pub struct WakeRequest {
    pub reason: WakeReason,
    reply: Option<oneshot::Sender<WakeAck>>,
}

/// Cloneable handle every wake source sends through.
#[derive(Clone)]
pub struct SyncWaker {
    tx: mpsc::Sender<WakeRequest>,
}

impl SyncWaker {
    /// Fire-and-forget wake. Returns `false` when the wake was dropped because the
    /// channel is full or the trigger loop is gone.
    pub fn notify(&self, reason: WakeReason) -> bool {
        match self.tx.try_send(WakeRequest {
            reason,
            reply: None,
        }) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!(
                    target: "offline::trigger",
                    tag = reason.tag(),
                    "wake dropped, runs already queued"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Manual wake. Resolves once the run it started has finished.
    pub async fn request_sync(&self) -> WakeAck {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = WakeRequest {
            reason: WakeReason::Manual,
            reply: Some(reply_tx),
        };
        if self.tx.send(request).await.is_err() {
            return WakeAck::failed("sync worker is not running");
        }
        reply_rx
            .await
            .unwrap_or_else(|_| WakeAck::failed("sync run ended without a reply"))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receives wakes and starts one orchestrator run per wake. Runs may overlap.
pub struct SyncTriggerLoop {
    runner: Arc<dyn SyncRunner>,
    rx: mpsc::Receiver<WakeRequest>,
}

impl SyncTriggerLoop {
    pub fn channel(runner: Arc<dyn SyncRunner>, buffer: usize) -> (SyncWaker, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (SyncWaker { tx }, Self { runner, rx })
    }

    /// Runs until every `SyncWaker` has been dropped.
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(request) = self.rx.recv().await {
                let runner = Arc::clone(&self.runner);
                tokio::spawn(handle_wake(runner, request));
            }
            tracing::debug!(target: "offline::trigger", "trigger loop stopped");
        })
    }
}

async fn handle_wake(runner: Arc<dyn SyncRunner>, request: WakeRequest) {
    let tag = request.reason.tag();
    tracing::debug!(target: "offline::trigger", tag, "sync wake received");

    let ack = match runner.run_once(tag).await {
        Ok(_) => WakeAck::ok(),
        Err(err) => {
            tracing::error!(
                target: "offline::trigger",
                tag,
                error = %err,
                "sync run failed"
            );
            WakeAck::failed(err.to_string())
        }
    };

    if let Some(reply) = request.reply {
        // The requester may have given up waiting.
        let _ = reply.send(ack);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::offline::SyncResult;
    use crate::shared::error::AppError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRunner {
        triggers: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl SyncRunner for RecordingRunner {
        async fn run_once(&self, trigger: &str) -> Result<SyncResult, AppError> {
            self.triggers.lock().unwrap().push(trigger.to_string());
            if self.fail {
                return Err(AppError::Database("disk I/O error".into()));
            }
            Ok(SyncResult::default())
        }
    }

    #[tokio::test]
    async fn manual_wake_acknowledges_success() {
        let runner = Arc::new(RecordingRunner::default());
        let (waker, trigger_loop) = SyncTriggerLoop::channel(runner.clone(), 4);
        trigger_loop.spawn();

        assert_eq!(waker.request_sync().await, WakeAck::ok());
        assert_eq!(
            runner.triggers.lock().unwrap().as_slice(),
            [MANUAL_SYNC_TAG.to_string()]
        );
    }

    #[tokio::test]
    async fn manual_wake_carries_run_error() {
        let runner = Arc::new(RecordingRunner {
            fail: true,
            ..Default::default()
        });
        let (waker, trigger_loop) = SyncTriggerLoop::channel(runner, 4);
        trigger_loop.spawn();

        let ack = waker.request_sync().await;
        assert!(!ack.success);
        assert!(ack.error.unwrap().contains("disk I/O error"));
    }

    #[tokio::test]
    async fn manual_wake_without_loop_fails() {
        let runner = Arc::new(RecordingRunner::default());
        let (waker, trigger_loop) = SyncTriggerLoop::channel(runner, 4);
        drop(trigger_loop);

        let ack = waker.request_sync().await;
        assert!(!ack.success);
        assert!(waker.is_closed());
        assert!(!waker.notify(WakeReason::Enqueued));
    }

    #[test]
    fn ack_serializes_without_empty_error() {
        let json = serde_json::to_value(WakeAck::ok()).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true }));
    }
}

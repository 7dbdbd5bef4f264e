#![allow(dead_code)]

use async_trait::async_trait;
use catch_sync::test_support::application::ports::submission_gateway::{
    DeliveryError, DeliveryReceipt, SubmissionGateway, SubmissionRequest,
};
use catch_sync::test_support::application::services::sync_service::{SyncPolicy, SyncService};
use catch_sync::test_support::domain::entities::offline::{
    CatchReport, Coordinates, PendingItemDraft, PendingPayload, WaypointSubmission,
};
use catch_sync::test_support::infrastructure::database::ConnectionPool;
use catch_sync::test_support::infrastructure::offline::SqliteOfflinePersistence;
use catch_sync::test_support::shared::ManualClock;
use catch_sync::test_support::shared::config::DatabaseConfig;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Gateway that answers from a script and then accepts everything.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<DeliveryReceipt, DeliveryError>>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<SubmissionRequest>>,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedGateway {
    pub fn accepting() -> Self {
        Self::with_script(Vec::new())
    }

    pub fn with_script(script: Vec<Result<DeliveryReceipt, DeliveryError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            delay: None,
            gate: None,
        }
    }

    pub fn failing_times(times: usize) -> Self {
        Self::with_script((0..times).map(|_| Err(server_error())).collect())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every call waits for one permit on `gate` before answering.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SubmissionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionGateway for ScriptedGateway {
    async fn submit(&self, request: &SubmissionRequest) -> Result<DeliveryReceipt, DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        next.unwrap_or_else(|| Ok(created()))
    }
}

pub fn created() -> DeliveryReceipt {
    DeliveryReceipt {
        status: 201,
        body: Some(json!({ "ok": true })),
    }
}

pub fn server_error() -> DeliveryError {
    DeliveryError::Status {
        status: 500,
        body: "internal error".into(),
    }
}

pub fn fixed_start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap()
}

pub fn catch_report(trip: &str) -> CatchReport {
    CatchReport {
        trip_id: trip.into(),
        date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        no_catch: false,
        imei: "356938035643809".into(),
        fish_group: Some("grouper".into()),
        quantity: Some(4),
        average_size: Some("large".into()),
        fish_length: Some(42.5),
        photos: vec!["photo-1.jpg".into()],
    }
}

pub fn waypoint(user: &str) -> WaypointSubmission {
    WaypointSubmission {
        user_id: user.into(),
        imei: Some("356938035643809".into()),
        username: None,
        name: "Reef edge".into(),
        description: Some("good at dawn".into()),
        coordinates: Coordinates {
            lat: -8.65,
            lng: 115.22,
        },
        waypoint_type: "fishing_spot".into(),
        metadata: json!({}),
    }
}

pub fn catch_draft(trip: &str) -> PendingItemDraft {
    PendingItemDraft::new(PendingPayload::Catch(catch_report(trip)), None)
}

pub fn waypoint_draft(user: &str) -> PendingItemDraft {
    PendingItemDraft::new(PendingPayload::Waypoint(waypoint(user)), None)
}

/// Polls `gateway` until it has seen `expected` calls.
pub async fn wait_for_calls(gateway: &ScriptedGateway, expected: usize) {
    for _ in 0..200 {
        if gateway.calls() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("gateway saw {} calls, expected {expected}", gateway.calls());
}

pub struct SyncHarness {
    pub store: Arc<SqliteOfflinePersistence>,
    pub gateway: Arc<ScriptedGateway>,
    pub clock: Arc<ManualClock>,
    pub service: Arc<SyncService>,
    pub pool: ConnectionPool,
}

pub async fn memory_harness(gateway: ScriptedGateway) -> SyncHarness {
    let pool = ConnectionPool::from_memory().await.expect("in-memory store");
    harness_with_pool(pool, gateway)
}

pub async fn file_harness(path: &Path, gateway: ScriptedGateway) -> SyncHarness {
    let pool = ConnectionPool::open(&DatabaseConfig {
        url: format!("sqlite://{}", path.display()),
        max_connections: 4,
        connection_timeout: 5,
        busy_timeout: 5,
    })
    .await
    .expect("file store");
    harness_with_pool(pool, gateway)
}

fn harness_with_pool(pool: ConnectionPool, gateway: ScriptedGateway) -> SyncHarness {
    let store = Arc::new(SqliteOfflinePersistence::new(pool.get_pool().clone()));
    let gateway = Arc::new(gateway);
    let clock = Arc::new(ManualClock::new(fixed_start()));
    let service = Arc::new(SyncService::new(
        store.clone(),
        gateway.clone(),
        clock.clone(),
        SyncPolicy::default(),
    ));
    SyncHarness {
        store,
        gateway,
        clock,
        service,
        pool,
    }
}

use crate::application::ports::offline_store::OfflinePersistence;
use crate::application::ports::submission_gateway::SubmissionGateway;
use crate::application::services::offline_service::{OfflineService, OfflineServiceTrait};
use crate::application::services::sync_service::{SyncPolicy, SyncService};
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::delivery::HttpSubmissionGateway;
use crate::infrastructure::offline::SqliteOfflinePersistence;
use crate::infrastructure::sync::{
    ConnectivityState, SyncTriggerLoop, SyncWaker, WakeReason, spawn_connectivity_listener,
    spawn_periodic_wake,
};
use crate::presentation::handlers::OfflineHandler;
use crate::shared::clock::{Clock, SystemClock};
use crate::shared::config::AppConfig;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Everything one background context needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub offline_handler: Arc<OfflineHandler>,
    pub sync_service: Option<Arc<SyncService>>,
    pub waker: Option<SyncWaker>,
    db_pool: Option<ConnectionPool>,
    connectivity: Arc<watch::Sender<ConnectivityState>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl AppState {
    pub async fn initialize(config: AppConfig) -> anyhow::Result<Self> {
        let gateway: Arc<dyn SubmissionGateway> =
            Arc::new(HttpSubmissionGateway::new(&config.api)?);
        Self::initialize_with_gateway(config, gateway).await
    }

    pub async fn initialize_with_gateway(
        config: AppConfig,
        gateway: Arc<dyn SubmissionGateway>,
    ) -> anyhow::Result<Self> {
        let (connectivity_tx, connectivity_rx) = watch::channel(ConnectivityState::Online);
        let config = Arc::new(config);

        let db_pool = match ConnectionPool::open(&config.database).await {
            Ok(pool) => pool,
            Err(err) if err.is_storage_unavailable() => {
                tracing::warn!(
                    target: "offline::store",
                    error = %err,
                    "offline store unavailable, submissions will be delivered directly"
                );
                return Ok(Self {
                    config,
                    offline_handler: Arc::new(OfflineHandler::direct_only(gateway)),
                    sync_service: None,
                    waker: None,
                    db_pool: None,
                    connectivity: Arc::new(connectivity_tx),
                    tasks: Arc::new(Mutex::new(Vec::new())),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let persistence: Arc<dyn OfflinePersistence> =
            Arc::new(SqliteOfflinePersistence::new(db_pool.get_pool().clone()));
        let offline_service: Arc<dyn OfflineServiceTrait> = Arc::new(OfflineService::with_clock(
            persistence.clone(),
            clock.clone(),
        ));
        let sync_service = Arc::new(SyncService::new(
            persistence,
            gateway.clone(),
            clock,
            SyncPolicy::from(&config.sync),
        ));

        let (waker, trigger_loop) =
            SyncTriggerLoop::channel(sync_service.clone(), config.sync.wake_buffer);
        let mut tasks = vec![
            trigger_loop.spawn(),
            spawn_connectivity_listener(connectivity_rx, waker.clone()),
        ];
        if config.sync.auto_sync {
            tasks.push(spawn_periodic_wake(
                waker.clone(),
                Duration::from_secs(config.sync.sync_interval),
            ));
            // Pick up whatever a previous context left behind.
            waker.notify(WakeReason::Periodic);
        }

        let offline_handler = Arc::new(OfflineHandler::new(
            offline_service,
            sync_service.clone(),
            gateway,
            waker.clone(),
        ));

        tracing::info!(
            target: "offline::sync",
            auto_sync = config.sync.auto_sync,
            sync_interval = config.sync.sync_interval,
            "background sync ready"
        );

        Ok(Self {
            config,
            offline_handler,
            sync_service: Some(sync_service),
            waker: Some(waker),
            db_pool: Some(db_pool),
            connectivity: Arc::new(connectivity_tx),
            tasks: Arc::new(Mutex::new(tasks)),
        })
    }

    pub fn queue_enabled(&self) -> bool {
        self.db_pool.is_some()
    }

    /// Host-side connectivity hook. An offline to online change wakes the sync.
    pub fn set_connectivity(&self, state: ConnectivityState) {
        self.connectivity.send_replace(state);
    }

    pub async fn shutdown(&self) {
        let handles = match self.tasks.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            handle.abort();
        }
        if let Some(pool) = &self.db_pool {
            pool.close().await;
        }
        tracing::info!(target: "offline::sync", "background sync stopped");
    }
}

pub mod connectivity;
pub mod periodic;
pub mod wake;

pub use connectivity::{ConnectivityState, spawn_connectivity_listener};
pub use periodic::spawn_periodic_wake;
pub use wake::{
    BACKGROUND_SYNC_TAG, ENQUEUE_SYNC_TAG, MANUAL_SYNC_TAG, PERIODIC_SYNC_TAG, SyncTriggerLoop,
    SyncWaker, WakeAck, WakeReason,
};

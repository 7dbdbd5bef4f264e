pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod shared;
pub mod state;

pub use state::AppState;

/// Re-exports used by the integration tests under `tests/`.
pub mod test_support {
    pub use crate::application;
    pub use crate::domain;
    pub use crate::infrastructure;
    pub use crate::presentation;
    pub use crate::shared;
}

pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catch_sync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

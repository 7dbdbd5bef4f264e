pub mod offline_store;
pub mod submission_gateway;
pub mod sync_runner;

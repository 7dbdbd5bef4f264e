pub mod database;
pub mod delivery;
pub mod offline;
pub mod sync;

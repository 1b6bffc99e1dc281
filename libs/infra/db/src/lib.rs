//! libSQL-backed persistence adapter for the sightings ledger:
//! sightings, long-spawn observations, landmarks and a small key-value
//! system-state table used to checkpoint the scheduler's hour baseline.

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::DbClient;
pub use errors::DbError;
pub use repositories::{FortRepository, LongSpawnRepository, SightingRepository, SystemStateRepository};

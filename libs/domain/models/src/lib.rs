//! Domain entities shared between the scanning engine, the persistence
//! layer and the upstream API client: the things the system observes
//! (spawns, sightings, landmarks) and the things it operates with
//! (accounts, proxies, workers).

pub mod account;
pub mod landmark;
pub mod pipeline;
pub mod proxy;
pub mod sighting;
pub mod spawn;
pub mod worker;

pub use account::{Account, AccountAuthState};
pub use landmark::Landmark;
pub use pipeline::PipelineItem;
pub use proxy::Proxy;
pub use sighting::{normalize_timestamp, Sighting, SightingKey};
pub use spawn::Spawn;
pub use worker::{WorkerErrorCode, WorkerSnapshot};

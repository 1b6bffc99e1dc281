mod fort;
mod longspawn;
mod sighting;
mod system_state;

pub use fort::FortRepository;
pub use longspawn::LongSpawnRepository;
pub use sighting::SightingRepository;
pub use system_state::SystemStateRepository;

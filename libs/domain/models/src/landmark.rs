use serde::{Deserialize, Serialize};

/// A persistent geographic feature (a "fort" in the upstream API) whose
/// metadata is replaced in place as fresher observations arrive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub external_id: String,
    pub lat: f64,
    pub lon: f64,
    pub team: Option<u8>,
    pub prestige: Option<i64>,
    pub guard_species_id: Option<u32>,
    pub last_modified: i64,
}

impl Landmark {
    /// An incoming observation only supersedes a stored row when its
    /// `last_modified` has strictly advanced.
    pub fn supersedes(&self, stored: &Landmark) -> bool {
        self.last_modified > stored.last_modified
    }
}

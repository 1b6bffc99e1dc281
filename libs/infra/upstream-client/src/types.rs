use serde::{Deserialize, Serialize};

/// One wild spawn encounter as reported by `GET_MAP_OBJECTS`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WildPokemon {
    pub encounter_id: String,
    pub species_id: u32,
    pub lat: f64,
    pub lon: f64,
    /// Milliseconds remaining until this spawn despawns. Out-of-range
    /// values (outside `[0, 3_600_000]`) get mapped to the long-spawn
    /// sentinel by the caller, per the scanner's worker module.
    pub time_till_hidden_ms: i64,
    pub spawn_id: Option<String>,
}

/// One landmark ("fort") as reported by `GET_MAP_OBJECTS`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Fort {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// `1` marks a pokestop; anything else is a gym. Pokestops are
    /// excluded from landmark extraction per the visit body contract.
    pub fort_type: u8,
    pub enabled: bool,
    pub team: Option<u8>,
    pub prestige: Option<i64>,
    pub guard_species_id: Option<u32>,
    pub last_modified_ms: i64,
}

/// The flattened shape the core cares about from `GET_MAP_OBJECTS`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MapCell {
    pub wild_pokemons: Vec<WildPokemon>,
    pub forts: Vec<Fort>,
}

/// The response envelope for `get_map_objects`: `status_code` at the
/// top, a per-cell breakdown, and an optional captcha challenge URL
/// surfaced the same way `CHECK_CHALLENGE` would report it.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MapObjectsResponse {
    pub status_code: i32,
    pub map_cells: Vec<MapCell>,
    pub challenge_url: Option<String>,
}

impl MapObjectsResponse {
    /// Status code 3 signals an explicit account ban in the upstream's
    /// response contract.
    pub fn is_account_banned(&self) -> bool {
        self.status_code == 3
    }

    pub fn has_captcha(&self) -> bool {
        self.challenge_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChallengeStatus {
    pub challenge_url: Option<String>,
}

use serde::{Deserialize, Serialize};

/// Buckets a raw expiry timestamp onto a 120-second grid so that two
/// observations of the same wild spawn (reported a few seconds apart by
/// different workers) collapse to the same dedup key.
pub fn normalize_timestamp(expire_timestamp: i64) -> i64 {
    (expire_timestamp.div_euclid(120)) * 120
}

/// A time-bounded observation of a transient entity at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub encounter_id: String,
    pub species_id: u32,
    pub spawn_id: Option<String>,
    pub expire_timestamp: i64,
    pub lat: f64,
    pub lon: f64,
}

impl Sighting {
    pub fn normalized_timestamp(&self) -> i64 {
        normalize_timestamp(self.expire_timestamp)
    }

    /// The composite dedup key described in the data model: at most one
    /// row may exist per `(species_id, normalized_timestamp, lat, lon)`.
    pub fn key(&self) -> SightingKey {
        SightingKey {
            species_id: self.species_id,
            normalized_timestamp: self.normalized_timestamp(),
            lat_key: (self.lat * 100_000.0).round() as i64,
            lon_key: (self.lon * 100_000.0).round() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SightingKey {
    pub species_id: u32,
    pub normalized_timestamp: i64,
    lat_key: i64,
    lon_key: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        let t = 1_700_000_121;
        assert_eq!(normalize_timestamp(normalize_timestamp(t)), normalize_timestamp(t));
    }

    #[test]
    fn normalize_floors_into_a_120_second_bucket() {
        let t = 1_700_000_121;
        let n = normalize_timestamp(t);
        assert!(n <= t && t < n + 120);
    }

    #[test]
    fn dedup_scenario_from_spec() {
        let a = Sighting {
            encounter_id: "a".into(),
            species_id: 25,
            spawn_id: None,
            expire_timestamp: 1_700_000_121,
            lat: 0.1,
            lon: 0.1,
        };
        let b = Sighting { encounter_id: "b".into(), expire_timestamp: 1_700_000_115, ..a.clone() };
        assert_eq!(a.normalized_timestamp(), 1_700_000_040);
        assert_eq!(a.key(), b.key());
    }
}

use serde::{Deserialize, Serialize};

/// A geographic coordinate, optionally carrying an altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl Point {
    pub const fn new(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt }
    }

    pub const fn flat(lat: f64, lon: f64) -> Self {
        Self::new(lat, lon, 0.0)
    }

    /// Rounds lat/lon to 5 decimal places, the precision used as the
    /// cell-ID cache key (roughly 1.1 m of ground resolution).
    pub fn rounded_key(&self) -> (i64, i64) {
        let scale = 100_000.0;
        (
            (self.lat * scale).round() as i64,
            (self.lon * scale).round() as i64,
        )
    }
}

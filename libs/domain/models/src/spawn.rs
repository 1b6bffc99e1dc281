use geoscan_core_geo::Point;
use serde::{Deserialize, Serialize};

/// A known spawn point: a location that reactivates on a fixed offset
/// within every clock hour. Immutable once loaded from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    pub id: String,
    pub point: Point,
    /// Seconds past the top of the hour at which this spawn next activates.
    pub offset_in_hour_seconds: i64,
}

impl Spawn {
    pub fn new(id: impl Into<String>, point: Point, offset_in_hour_seconds: i64) -> Self {
        Self { id: id.into(), point, offset_in_hour_seconds }
    }
}

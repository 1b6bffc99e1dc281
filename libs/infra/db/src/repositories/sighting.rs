use crate::{DbClient, DbError};
use geoscan_domain_models::Sighting;
use libsql::params;
use tracing::{info, instrument};

/// Persists short-lived sightings, relying on the `sightings` table's
/// `UNIQUE(species_id, normalized_timestamp, lat, lon)` constraint as
/// the backstop for the in-memory cache's best-effort dedup.
pub struct SightingRepository {
    client: DbClient,
}

impl SightingRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    /// Inserts the sighting. Returns `Ok(true)` if it was newly stored,
    /// `Ok(false)` if the uniqueness constraint suppressed a duplicate.
    #[instrument(skip(self, sighting), fields(encounter_id = %sighting.encounter_id))]
    pub async fn insert_if_new(&self, sighting: &Sighting) -> Result<bool, DbError> {
        let conn = self.client.get_connection()?;
        let normalized = sighting.normalized_timestamp();

        let result = conn
            .execute(
                "INSERT INTO sightings
                    (encounter_id, species_id, spawn_id, expire_timestamp, normalized_timestamp, lat, lon)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    sighting.encounter_id.clone(),
                    sighting.species_id,
                    sighting.spawn_id.clone(),
                    sighting.expire_timestamp,
                    normalized,
                    sighting.lat,
                    sighting.lon,
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if e.to_string().contains("UNIQUE") => {
                info!("duplicate sighting suppressed: {}", sighting.encounter_id);
                Ok(false)
            }
            Err(other) => Err(DbError::Query(other)),
        }
    }
}

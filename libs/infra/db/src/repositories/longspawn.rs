use crate::{DbClient, DbError};
use geoscan_domain_models::Sighting;
use libsql::params;
use tracing::instrument;

/// Persists long-lived ("long spawn") observations. Unlike
/// `SightingRepository`, entries are upserted by composite key rather
/// than inserted-once, since the same extended spawn is expected to be
/// re-observed across its longer lifetime.
pub struct LongSpawnRepository {
    client: DbClient,
}

impl LongSpawnRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, sighting), fields(encounter_id = %sighting.encounter_id))]
    pub async fn upsert(&self, sighting: &Sighting) -> Result<(), DbError> {
        let conn = self.client.get_connection()?;
        let normalized = sighting.normalized_timestamp();

        conn.execute(
            "INSERT INTO longspawn (species_id, normalized_timestamp, lat, lon, encounter_id, expire_timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(species_id, normalized_timestamp, lat, lon)
             DO UPDATE SET encounter_id = excluded.encounter_id, expire_timestamp = excluded.expire_timestamp",
            params![
                sighting.species_id,
                normalized,
                sighting.lat,
                sighting.lon,
                sighting.encounter_id.clone(),
                sighting.expire_timestamp,
            ],
        )
        .await?;

        Ok(())
    }
}

use crate::{DbClient, DbError};
use geoscan_domain_models::Landmark;
use libsql::params;
use tracing::instrument;

/// Persists landmarks ("forts"), replacing the stored row only when the
/// incoming observation's `last_modified` has strictly advanced.
pub struct FortRepository {
    client: DbClient,
}

impl FortRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, landmark), fields(external_id = %landmark.external_id))]
    pub async fn upsert_if_newer(&self, landmark: &Landmark) -> Result<bool, DbError> {
        let conn = self.client.get_connection()?;

        let rows_affected = conn
            .execute(
                "INSERT INTO fort_sightings (external_id, lat, lon, team, prestige, guard_species_id, last_modified)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(external_id) DO UPDATE SET
                    lat = excluded.lat,
                    lon = excluded.lon,
                    team = excluded.team,
                    prestige = excluded.prestige,
                    guard_species_id = excluded.guard_species_id,
                    last_modified = excluded.last_modified
                 WHERE excluded.last_modified > fort_sightings.last_modified",
                params![
                    landmark.external_id.clone(),
                    landmark.lat,
                    landmark.lon,
                    landmark.team.map(|t| t as i64),
                    landmark.prestige,
                    landmark.guard_species_id.map(|g| g as i64),
                    landmark.last_modified,
                ],
            )
            .await?;

        Ok(rows_affected > 0)
    }
}

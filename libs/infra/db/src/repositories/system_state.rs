use crate::{DbClient, DbError};
use libsql::params;
use tracing::instrument;

/// A small key-value table for scheduler checkpoints that do not
/// warrant their own table: the current hour baseline, the last
/// bootstrap run, and similar singleton facts.
pub struct SystemStateRepository {
    client: DbClient,
}

impl SystemStateRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, value))]
    pub async fn set_int(&self, key: &str, value: i64) -> Result<(), DbError> {
        let conn = self.client.get_connection()?;
        conn.execute(
            "INSERT INTO system_state (key, value_int, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value_int = excluded.value_int, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_int(&self, key: &str) -> Result<Option<i64>, DbError> {
        let conn = self.client.get_connection()?;
        let mut rows = conn
            .query("SELECT value_int FROM system_state WHERE key = ?1", params![key])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<Option<i64>>(0)?),
            None => Ok(None),
        }
    }
}

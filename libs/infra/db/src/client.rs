//! Connection management for the sightings ledger.
//!
//! Supports three `DB_ENGINE` modes: a local libSQL file, a remote
//! libSQL/Turso HTTP endpoint, and an in-memory database for tests and
//! the bootstrap smoke path. In-memory databases keep one extra
//! "anchor" connection alive for the process lifetime — without it
//! SQLite would drop the schema the instant the bootstrap connection
//! closes, since there is no file backing it.

use crate::errors::DbError;
use crate::schema::apply_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct DbClient {
    database: Arc<Database>,
    _memory_anchor: Option<Arc<Connection>>,
}

impl DbClient {
    #[instrument(skip(access_token))]
    pub async fn connect(url: &str, access_token: Option<String>) -> Result<Self, DbError> {
        if url.is_empty() {
            return Err(DbError::Configuration("database url is empty".into()));
        }

        info!("opening database link to {url}");

        let is_remote = url.starts_with("libsql://") || url.starts_with("https://");
        let is_memory = url.contains(":memory:") || url.contains("mode=memory");

        let database = if is_remote {
            let token = access_token
                .ok_or_else(|| DbError::Configuration("remote database requires an access token".into()))?;
            Builder::new_remote(url.to_string(), token).build().await
        } else {
            Builder::new_local(url).build().await
        }
        .map_err(|e| DbError::Connection(format!("driver init failed: {e}")))?;

        let database = Arc::new(database);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = database
                .connect()
                .map_err(|e| DbError::Connection(format!("anchor connection failed: {e}")))?;
            apply_schema(&anchor_conn)
                .await
                .map_err(|e| DbError::Connection(format!("schema bootstrap failed: {e}")))?;
            anchor = Some(Arc::new(anchor_conn));
        } else {
            let bootstrap_conn = database
                .connect()
                .map_err(|e| DbError::Connection(format!("bootstrap connection failed: {e}")))?;
            apply_schema(&bootstrap_conn)
                .await
                .map_err(|e| DbError::Connection(format!("schema bootstrap failed: {e}")))?;
        }

        Ok(Self { database, _memory_anchor: anchor })
    }

    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.database.connect().map_err(|e| {
            error!("failed to allocate a connection: {e}");
            DbError::Connection(e.to_string())
        })
    }
}

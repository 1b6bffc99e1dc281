//! Two on-disk snapshots, loaded opportunistically on startup and
//! written on shutdown: a spawn-catalog snapshot and an accounts
//! snapshot. Absence of either is non-fatal — the caller falls back to
//! querying storage or to the configured account list.

use geoscan_domain_models::{Account, Spawn};
use std::path::Path;
use tokio::io::ErrorKind;
use tracing::{info, instrument};

#[instrument]
pub async fn load_spawn_snapshot(path: &Path) -> anyhow::Result<Option<Vec<Spawn>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(spawns))]
pub async fn save_spawn_snapshot(path: &Path, spawns: &[Spawn]) -> anyhow::Result<()> {
    let bytes = serde_json::to_vec_pretty(spawns)?;
    tokio::fs::write(path, bytes).await?;
    info!("wrote spawn snapshot with {} entries", spawns.len());
    Ok(())
}

#[instrument]
pub async fn load_accounts_snapshot(path: &Path) -> anyhow::Result<Option<Vec<Account>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[instrument(skip(accounts))]
pub async fn save_accounts_snapshot(path: &Path, accounts: &[Account]) -> anyhow::Result<()> {
    let bytes = serde_json::to_vec_pretty(accounts)?;
    tokio::fs::write(path, bytes).await?;
    info!("wrote accounts snapshot with {} entries", accounts.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoscan_core_geo::Point;

    #[tokio::test]
    async fn round_trips_a_spawn_snapshot_through_a_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spawns.json");
        let spawns = vec![Spawn::new("spawn-1", Point::flat(1.0, 2.0), 42)];

        save_spawn_snapshot(&path, &spawns).await.unwrap();
        let loaded = load_spawn_snapshot(&path).await.unwrap().unwrap();
        assert_eq!(loaded, spawns);
    }

    #[tokio::test]
    async fn missing_snapshot_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(load_spawn_snapshot(&path).await.unwrap().is_none());
    }
}

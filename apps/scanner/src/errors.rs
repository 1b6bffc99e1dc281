//! Scanner-level error enum. Wraps failures from the lower crates so
//! `main` has one type to unwrap into a process exit code.

use geoscan_infra_db::DbError;
use geoscan_infra_upstream::UpstreamError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("database error: {0}")]
    Database(#[from] DbError),

    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("spawn catalog error: {0}")]
    Catalog(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

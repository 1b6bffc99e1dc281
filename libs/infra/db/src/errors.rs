use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("configuration missing or invalid: {0}")]
    Configuration(String),

    #[error("query rejected: {0}")]
    Query(#[from] libsql::Error),

    #[error("row mapping failed: {0}")]
    Mapping(String),

    #[error("duplicate row suppressed: {0}")]
    Duplicate(String),
}

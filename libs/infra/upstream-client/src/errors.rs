use thiserror::Error;

/// The exception taxonomy the core observes from the wrapped
/// geospatial API client. Each variant maps onto one of the worker's
/// visit-state-machine branches.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("access forbidden (ip ban)")]
    Forbidden,

    #[error("authentication failed")]
    AuthFailed,

    #[error("not logged in")]
    NotLoggedIn,

    #[error("server busy")]
    ServerBusy,

    #[error("throttled")]
    Throttled,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("account banned")]
    Banned,

    #[error("transport error: {0}")]
    Transport(String),
}

impl UpstreamError {
    /// The minimum back-off floor for this category, per the retry
    /// envelope around the visit body.
    pub fn sleep_floor_seconds(&self) -> (f64, f64) {
        match self {
            UpstreamError::Forbidden => (15.0, 20.0),
            UpstreamError::Throttled => (10.0, 12.0),
            _ => (8.0, 12.0),
        }
    }
}

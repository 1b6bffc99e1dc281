use crate::errors::UpstreamError;
use crate::types::{ChallengeStatus, MapObjectsResponse};
use async_trait::async_trait;
use tracing::instrument;

/// The contract the core consumes from the wrapped geospatial API
/// client. The client itself — login flow, signature generation, the
/// wire protocol — is an external collaborator out of scope for this
/// crate; only this trait boundary and its exception taxonomy are.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn set_authentication(&mut self, username: &str, password: &str, provider: &str) -> Result<(), UpstreamError>;
    async fn set_position(&mut self, lat: f64, lon: f64, alt: f64) -> Result<(), UpstreamError>;
    async fn set_proxy(&mut self, proxy_url: Option<&str>) -> Result<(), UpstreamError>;
    async fn get_map_objects(&self, lat: f64, lon: f64, cell_ids: &[i64]) -> Result<MapObjectsResponse, UpstreamError>;
    async fn check_challenge(&self) -> Result<ChallengeStatus, UpstreamError>;
    async fn verify_challenge(&self, token: &str) -> Result<(), UpstreamError>;
}

/// An HTTP-backed `UpstreamClient` that forwards each operation to a
/// configured base URL as a JSON POST. Suitable for pointing at a
/// sidecar process that actually speaks the upstream wire protocol
/// (protobuf signing, device fingerprinting, etc. live there, not here).
pub struct HttpUpstreamClient {
    base_url: String,
    http: reqwest::Client,
    username: Option<String>,
    password: Option<String>,
    provider: Option<String>,
    proxy_url: Option<String>,
    position: (f64, f64, f64),
}

impl HttpUpstreamClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            username: None,
            password: None,
            provider: None,
            proxy_url: None,
            position: (0.0, 0.0, 0.0),
        }
    }

    fn map_transport_error(error: reqwest::Error) -> UpstreamError {
        if error.is_timeout() || error.is_connect() {
            UpstreamError::ServerBusy
        } else {
            UpstreamError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    #[instrument(skip(self, password))]
    async fn set_authentication(&mut self, username: &str, password: &str, provider: &str) -> Result<(), UpstreamError> {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self.provider = Some(provider.to_string());
        Ok(())
    }

    async fn set_position(&mut self, lat: f64, lon: f64, alt: f64) -> Result<(), UpstreamError> {
        self.position = (lat, lon, alt);
        Ok(())
    }

    async fn set_proxy(&mut self, proxy_url: Option<&str>) -> Result<(), UpstreamError> {
        self.proxy_url = proxy_url.map(String::from);
        Ok(())
    }

    #[instrument(skip(self, cell_ids), fields(lat, lon))]
    async fn get_map_objects(&self, lat: f64, lon: f64, cell_ids: &[i64]) -> Result<MapObjectsResponse, UpstreamError> {
        let response = self
            .http
            .post(format!("{}/get_map_objects", self.base_url))
            .json(&serde_json::json!({
                "username": self.username,
                "lat": lat,
                "lon": lon,
                "cell_ids": cell_ids,
                "proxy": self.proxy_url,
            }))
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        if response.status() == reqwest::StatusCode::FORBIDDEN {
            return Err(UpstreamError::Forbidden);
        }
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(UpstreamError::NotLoggedIn);
        }
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(UpstreamError::Throttled);
        }

        response
            .json::<MapObjectsResponse>()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))
    }

    async fn check_challenge(&self) -> Result<ChallengeStatus, UpstreamError> {
        let response = self
            .http
            .post(format!("{}/check_challenge", self.base_url))
            .json(&serde_json::json!({ "username": self.username }))
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        response
            .json::<ChallengeStatus>()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))
    }

    async fn verify_challenge(&self, token: &str) -> Result<(), UpstreamError> {
        self.http
            .post(format!("{}/verify_challenge", self.base_url))
            .json(&serde_json::json!({ "username": self.username, "token": token }))
            .send()
            .await
            .map_err(Self::map_transport_error)?;
        Ok(())
    }
}

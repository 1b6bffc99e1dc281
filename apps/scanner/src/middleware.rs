//! Bearer-token guard for the read-only viewer channel. There is no
//! notion of distinct operator identities here — a caller either holds
//! the configured key or doesn't.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::routes::ViewerState;

pub async fn auth_guard(State(state): State<ViewerState>, req: Request, next: Next) -> Result<Response, StatusCode> {
    let Some(expected) = &state.auth_key else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected => Ok(next.run(req).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

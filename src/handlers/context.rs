use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::models::PlayerContext;
use crate::utils::error::AppError;

/// Set by the session gateway in front of the agenda once the player is
/// authenticated. The agenda trusts these headers as-is.
pub const PLAYER_ID_HEADER: &str = "x-player-id";
pub const TEAM_ID_HEADER: &str = "x-team-id";

fn header_id(parts: &Parts, name: &str) -> Result<i64, AppError> {
    let value = parts
        .headers
        .get(name)
        .ok_or_else(|| AppError::AuthError(format!("Missing {} header", name)))?;

    value
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::AuthError(format!("Invalid {} header", name)))
}

#[async_trait]
impl<S> FromRequestParts<S> for PlayerContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let player_id = header_id(parts, PLAYER_ID_HEADER)?;
        let team_id = header_id(parts, TEAM_ID_HEADER)?;
        Ok(PlayerContext::new(player_id, team_id))
    }
}

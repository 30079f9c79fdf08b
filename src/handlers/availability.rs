//! Availability endpoints: `PUT` records the caller's vote, `GET` returns the
//! raw counts.

use axum::extract::State;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::handlers::extract::{ApiJson, EventId};
use crate::models::{EventStatus, PlayerContext};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct SetAvailabilityRequest {
    /// One of `available`, `maybe`, `unavailable`.
    #[serde(default)]
    pub status: String,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetAvailabilityResponse {
    pub event_status: EventStatus,
    pub event_status_label: &'static str,
}

pub async fn set_availability(
    ctx: PlayerContext,
    State(state): State<AppState>,
    EventId(event_id): EventId,
    ApiJson(request): ApiJson<SetAvailabilityRequest>,
) -> Result<Response, AppError> {
    let event_status = state
        .events
        .set_availability(&ctx, event_id, &request.status, request.comment)
        .await?;

    Ok(success(
        SetAvailabilityResponse {
            event_status,
            event_status_label: event_status.label(),
        },
        "Availability recorded",
    ))
}

pub async fn get_availability_stats(
    ctx: PlayerContext,
    State(state): State<AppState>,
    EventId(event_id): EventId,
) -> Result<Response, AppError> {
    let stats = state.events.availability_stats(&ctx, event_id).await?;

    Ok(success(stats, "Availability statistics retrieved"))
}

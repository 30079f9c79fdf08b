//! Event endpoints.
//!
//! - `GET /api/events?month=YYYY-MM` lists the team's agenda for a month
//! - `POST /api/events` proposes a new event
//! - `GET /api/events/:id` returns an event with its votes
//! - `PATCH /api/events/:id` updates an event (creator only)
//! - `DELETE /api/events/:id` deletes an event (creator only)

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Response;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handlers::extract::{ApiJson, EventId};
use crate::models::{
    AvailabilityStats, CreateEventInput, Event, EventCategory, EventStatus, PlayerContext,
    UpdateEventInput, Vote, VoteStatus,
};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    /// `YYYY-MM`; defaults to the current month.
    pub month: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: EventCategory,
    pub category_label: &'static str,
    pub scheduled_at: NaiveDateTime,
    pub location: Option<String>,
    pub status: EventStatus,
    pub status_label: &'static str,
    pub min_attendees: i32,
    pub creator_id: i64,
    pub creator_name: String,
    pub created_at: DateTime<Utc>,
    pub available_count: i64,
    pub maybe_count: i64,
    pub unavailable_count: i64,
    pub total_responses: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availabilities: Option<Vec<VoteResponse>>,
}

impl EventResponse {
    fn new(event: Event, stats: AvailabilityStats) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            category: event.category,
            category_label: event.category.label(),
            scheduled_at: event.scheduled_at,
            location: event.location,
            status: event.status,
            status_label: event.status.label(),
            min_attendees: event.min_attendees,
            creator_id: event.creator_id,
            creator_name: event.creator_name,
            created_at: event.created_at,
            available_count: stats.available,
            maybe_count: stats.maybe,
            unavailable_count: stats.unavailable,
            total_responses: stats.total,
            availabilities: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub player_id: i64,
    pub player_name: String,
    pub status: VoteStatus,
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<Vote> for VoteResponse {
    fn from(vote: Vote) -> Self {
        Self {
            player_id: vote.player_id,
            player_name: vote.player_name,
            status: vote.status,
            comment: vote.comment,
            updated_at: vote.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    pub events: Vec<EventResponse>,
}

#[derive(Debug, Serialize)]
pub struct CreateEventResponse {
    pub event_id: Uuid,
}

pub async fn list_events(
    ctx: PlayerContext,
    State(state): State<AppState>,
    query: Result<Query<ListEventsQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let events = state
        .events
        .list_events(&ctx, query.month.as_deref())
        .await?
        .into_iter()
        .map(|summary| EventResponse::new(summary.event, summary.stats))
        .collect();

    Ok(success(ListEventsResponse { events }, "Events retrieved"))
}

pub async fn get_event(
    ctx: PlayerContext,
    State(state): State<AppState>,
    EventId(event_id): EventId,
) -> Result<Response, AppError> {
    let details = state.events.get_event(&ctx, event_id).await?;

    let mut event = EventResponse::new(details.event, details.stats);
    event.availabilities = Some(details.votes.into_iter().map(VoteResponse::from).collect());

    Ok(success(event, "Event retrieved"))
}

pub async fn create_event(
    ctx: PlayerContext,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateEventInput>,
) -> Result<Response, AppError> {
    let event_id = state.events.create_event(&ctx, input).await?;

    Ok(created(
        CreateEventResponse { event_id },
        "Event created successfully",
    ))
}

pub async fn update_event(
    ctx: PlayerContext,
    State(state): State<AppState>,
    EventId(event_id): EventId,
    ApiJson(input): ApiJson<UpdateEventInput>,
) -> Result<Response, AppError> {
    state.events.update_event(&ctx, event_id, input).await?;

    Ok(empty_success("Event updated"))
}

pub async fn delete_event(
    ctx: PlayerContext,
    State(state): State<AppState>,
    EventId(event_id): EventId,
) -> Result<Response, AppError> {
    state.events.delete_event(&ctx, event_id).await?;

    Ok(empty_success("Event deleted"))
}

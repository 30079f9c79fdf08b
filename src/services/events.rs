use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::models::event::{clamp_min_attendees, DEFAULT_MIN_ATTENDEES};
use crate::models::{
    AvailabilityStats, CreateEventInput, Event, EventCategory, EventChanges, EventStatus,
    EventSummary, NewEvent, PlayerContext, UpdateEventInput, Vote, VoteStatus,
};
use crate::services::confirmation;
use crate::store::AgendaStore;
use crate::utils::dates::{current_month, month_bounds, parse_scheduled_at};
use crate::utils::error::AppError;

pub const CREATOR_VOTE_COMMENT: &str = "event creator";

/// Event with its vote counts and ordered votes.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetails {
    pub event: Event,
    pub stats: AvailabilityStats,
    pub votes: Vec<Vote>,
}

/// Orchestrates event lifecycles and availability votes for one team at a
/// time. The identity of the caller is always passed in as a
/// [`PlayerContext`].
///
/// Concurrent votes by the same player are last-write-wins at the storage
/// layer; which of two near-simultaneous writes lands last is not defined.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn AgendaStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn AgendaStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self), fields(team_id = ctx.team_id))]
    pub async fn list_events(
        &self,
        ctx: &PlayerContext,
        month: Option<&str>,
    ) -> Result<Vec<EventSummary>, AppError> {
        let month = match month {
            Some(month) if !month.trim().is_empty() => month.to_string(),
            _ => current_month(),
        };
        let (from, until) = month_bounds(&month)?;

        let events = self.store.list_events(ctx.team_id, from, until).await?;
        debug!(count = events.len(), %month, "Listed events");
        Ok(events)
    }

    #[instrument(skip(self), fields(team_id = ctx.team_id))]
    pub async fn get_event(
        &self,
        ctx: &PlayerContext,
        event_id: Uuid,
    ) -> Result<EventDetails, AppError> {
        let event = self.team_event(ctx, event_id).await?;
        let votes = self.store.list_votes(event_id).await?;
        let stats = votes.iter().map(|vote| vote.status).collect();

        Ok(EventDetails {
            event,
            stats,
            votes,
        })
    }

    #[instrument(skip(self, input), fields(team_id = ctx.team_id, player_id = ctx.player_id))]
    pub async fn create_event(
        &self,
        ctx: &PlayerContext,
        input: CreateEventInput,
    ) -> Result<Uuid, AppError> {
        let title = non_empty(input.title)
            .ok_or_else(|| AppError::ValidationError("Title is required".to_string()))?;
        let scheduled_at = match non_empty(input.scheduled_at) {
            Some(raw) => parse_scheduled_at(&raw)?,
            None => return Err(AppError::ValidationError("Date is required".to_string())),
        };

        let new_event = NewEvent {
            team_id: ctx.team_id,
            creator_id: ctx.player_id,
            title,
            description: non_empty(input.description),
            category: EventCategory::normalize(input.category.as_deref()),
            scheduled_at,
            location: non_empty(input.location),
            min_attendees: input
                .min_attendees
                .map(clamp_min_attendees)
                .unwrap_or(DEFAULT_MIN_ATTENDEES),
        };

        let event = self.store.insert_event(&new_event).await?;
        info!(event_id = %event.id, category = event.category.as_str(), "Event created");

        // The creator always counts toward the threshold.
        self.record_vote(
            &event,
            ctx.player_id,
            VoteStatus::Available,
            Some(CREATOR_VOTE_COMMENT),
        )
        .await?;

        Ok(event.id)
    }

    #[instrument(skip(self, input), fields(team_id = ctx.team_id, player_id = ctx.player_id))]
    pub async fn update_event(
        &self,
        ctx: &PlayerContext,
        event_id: Uuid,
        input: UpdateEventInput,
    ) -> Result<(), AppError> {
        let event = self.team_event(ctx, event_id).await?;
        ensure_creator(ctx, &event, "modify")?;

        if input.is_empty() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }
        let changes = build_changes(&event, input)?;
        if changes.is_empty() {
            debug!(%event_id, "Update left the event unchanged");
            return Ok(());
        }

        let applied = self
            .store
            .update_event(event_id, &changes, event.status)
            .await?;
        if !applied {
            return Err(self.lost_race(ctx, event_id).await);
        }

        match changes.status {
            Some(status) => {
                info!(%event_id, from = %event.status, to = %status, "Event status overridden")
            }
            None => info!(%event_id, "Event updated"),
        }
        Ok(())
    }

    #[instrument(skip(self), fields(team_id = ctx.team_id, player_id = ctx.player_id))]
    pub async fn delete_event(&self, ctx: &PlayerContext, event_id: Uuid) -> Result<(), AppError> {
        let event = self.team_event(ctx, event_id).await?;
        ensure_creator(ctx, &event, "delete")?;

        if !self.store.delete_event(event_id).await? {
            return Err(AppError::event_not_found(event_id));
        }
        info!(%event_id, "Event deleted");
        Ok(())
    }

    /// Records the caller's vote and runs the confirmation check. Returns the
    /// event status observed after the check.
    #[instrument(skip(self, comment), fields(team_id = ctx.team_id, player_id = ctx.player_id))]
    pub async fn set_availability(
        &self,
        ctx: &PlayerContext,
        event_id: Uuid,
        status: &str,
        comment: Option<String>,
    ) -> Result<EventStatus, AppError> {
        let event = self.team_event(ctx, event_id).await?;
        let status: VoteStatus = status.parse().map_err(|_| {
            AppError::ValidationError(format!("Invalid availability status '{}'", status))
        })?;

        let comment = non_empty(comment);
        self.record_vote(&event, ctx.player_id, status, comment.as_deref())
            .await
    }

    #[instrument(skip(self), fields(team_id = ctx.team_id))]
    pub async fn availability_stats(
        &self,
        ctx: &PlayerContext,
        event_id: Uuid,
    ) -> Result<AvailabilityStats, AppError> {
        self.team_event(ctx, event_id).await?;
        Ok(self.store.tally(event_id).await?)
    }

    async fn team_event(&self, ctx: &PlayerContext, event_id: Uuid) -> Result<Event, AppError> {
        self.store
            .find_event(event_id, ctx.team_id)
            .await?
            .ok_or_else(|| AppError::event_not_found(event_id))
    }

    /// Upserts the vote, then re-reads the event and applies the automatic
    /// confirmation rule with a compare-and-set on the observed status.
    async fn record_vote(
        &self,
        event: &Event,
        player_id: i64,
        status: VoteStatus,
        comment: Option<&str>,
    ) -> Result<EventStatus, AppError> {
        if !self
            .store
            .upsert_vote(event.id, player_id, status, comment)
            .await?
        {
            return Err(AppError::event_not_found(event.id));
        }
        debug!(event_id = %event.id, player_id, status = %status, "Vote recorded");

        let current = self
            .store
            .find_event(event.id, event.team_id)
            .await?
            .ok_or_else(|| AppError::event_not_found(event.id))?;
        let tally = self.store.tally(event.id).await?;

        let decision =
            confirmation::evaluate(current.status, current.min_attendees, tally.available);
        let Some(next) = decision else {
            return Ok(current.status);
        };
        if !confirmation::is_forward(current.status, next) {
            warn!(
                event_id = %event.id,
                from = %current.status,
                to = %next,
                "Refusing backward transition"
            );
            return Ok(current.status);
        }

        if self
            .store
            .transition_status(event.id, current.status, next)
            .await?
        {
            info!(
                event_id = %event.id,
                available = tally.available,
                min_attendees = current.min_attendees,
                "Event confirmed"
            );
            return Ok(next);
        }

        // Another request changed the status first; report what it left.
        let latest = self
            .store
            .find_event(event.id, event.team_id)
            .await?
            .map(|event| event.status)
            .unwrap_or(current.status);
        debug!(event_id = %event.id, status = %latest, "Confirmation already settled");
        Ok(latest)
    }

    async fn lost_race(&self, ctx: &PlayerContext, event_id: Uuid) -> AppError {
        match self.store.find_event(event_id, ctx.team_id).await {
            Ok(Some(_)) => AppError::Conflict(
                "The event status changed while updating, reload it and try again".to_string(),
            ),
            Ok(None) => AppError::event_not_found(event_id),
            Err(err) => err.into(),
        }
    }
}

fn ensure_creator(ctx: &PlayerContext, event: &Event, action: &str) -> Result<(), AppError> {
    if event.creator_id == ctx.player_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Only the creator can {} this event",
            action
        )))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn build_changes(event: &Event, input: UpdateEventInput) -> Result<EventChanges, AppError> {
    let title = match input.title {
        Some(title) => Some(non_empty(Some(title)).ok_or_else(|| {
            AppError::ValidationError("Title cannot be empty".to_string())
        })?),
        None => None,
    };
    let scheduled_at = input
        .scheduled_at
        .as_deref()
        .map(parse_scheduled_at)
        .transpose()?;
    let status = match input.status {
        Some(raw) => {
            let requested: EventStatus = raw
                .trim()
                .parse()
                .map_err(|_| AppError::ValidationError(format!("Invalid event status '{}'", raw)))?;
            confirmation::manual_transition(event.status, requested)
                .map_err(|err| AppError::ValidationError(err.to_string()))?
        }
        None => None,
    };

    Ok(EventChanges {
        title,
        description: input.description.map(|value| non_empty(Some(value))),
        category: input
            .category
            .map(|raw| EventCategory::normalize(Some(raw.as_str()))),
        scheduled_at,
        location: input.location.map(|value| non_empty(Some(value))),
        min_attendees: input.min_attendees.map(clamp_min_attendees),
        status,
    })
}

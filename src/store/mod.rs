//! Persistence for events and availability votes.
//!
//! Two implementations share the same traits: [`PgStore`] backed by Postgres
//! and [`MemoryStore`] used for tests and local runs without a database.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AvailabilityStats, Event, EventChanges, EventStatus, EventSummary, NewEvent, Vote, VoteStatus,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, event: &NewEvent) -> StoreResult<Event>;

    /// Looks up an event visible to `team_id`.
    async fn find_event(&self, event_id: Uuid, team_id: i64) -> StoreResult<Option<Event>>;

    /// Non-cancelled events of a team scheduled in `[from, until)`, ordered by
    /// schedule, with their vote counts.
    async fn list_events(
        &self,
        team_id: i64,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> StoreResult<Vec<EventSummary>>;

    /// Applies `changes` only if the event still has `expected_status`.
    /// Returns whether a row was updated.
    async fn update_event(
        &self,
        event_id: Uuid,
        changes: &EventChanges,
        expected_status: EventStatus,
    ) -> StoreResult<bool>;

    /// Removes the event and all of its votes. Returns whether it existed.
    async fn delete_event(&self, event_id: Uuid) -> StoreResult<bool>;

    /// Compare-and-set on the status column. Returns whether the transition
    /// was applied.
    async fn transition_status(
        &self,
        event_id: Uuid,
        from: EventStatus,
        to: EventStatus,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Inserts or overwrites the vote of `player_id` in one atomic write.
    /// Returns `false` if the event no longer exists.
    async fn upsert_vote(
        &self,
        event_id: Uuid,
        player_id: i64,
        status: VoteStatus,
        comment: Option<&str>,
    ) -> StoreResult<bool>;

    async fn tally(&self, event_id: Uuid) -> StoreResult<AvailabilityStats>;

    /// Votes ordered available, maybe, unavailable, then by player name.
    async fn list_votes(&self, event_id: Uuid) -> StoreResult<Vec<Vote>>;
}

pub trait AgendaStore: EventStore + AvailabilityStore {}

impl<T: EventStore + AvailabilityStore> AgendaStore for T {}

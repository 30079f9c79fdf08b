use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{AvailabilityStore, EventStore, StoreError, StoreResult};
use crate::models::availability::fallback_player_name;
use crate::models::{
    AvailabilityStats, Event, EventChanges, EventStatus, EventSummary, NewEvent, Vote, VoteStatus,
};

const EVENT_COLUMNS: &str = "e.id, e.team_id, e.creator_id, \
    COALESCE(p.display_name, '') AS creator_name, e.title, e.description, e.category, \
    e.scheduled_at, e.location, e.min_attendees, e.status, e.created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    team_id: i64,
    creator_id: i64,
    creator_name: String,
    title: String,
    description: Option<String>,
    category: String,
    scheduled_at: NaiveDateTime,
    location: Option<String>,
    min_attendees: i32,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Event {
            id: row.id,
            team_id: row.team_id,
            creator_id: row.creator_id,
            creator_name: row.creator_name,
            title: row.title,
            description: row.description,
            category: row.category.parse().map_err(StoreError::Corrupt)?,
            scheduled_at: row.scheduled_at,
            location: row.location,
            min_attendees: row.min_attendees,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct EventSummaryRow {
    #[sqlx(flatten)]
    event: EventRow,
    available: i64,
    maybe: i64,
    unavailable: i64,
    total: i64,
}

#[derive(Debug, FromRow)]
struct StatsRow {
    available: i64,
    maybe: i64,
    unavailable: i64,
    total: i64,
}

impl From<StatsRow> for AvailabilityStats {
    fn from(row: StatsRow) -> Self {
        Self {
            available: row.available,
            maybe: row.maybe,
            unavailable: row.unavailable,
            total: row.total,
        }
    }
}

#[derive(Debug, FromRow)]
struct VoteRow {
    event_id: Uuid,
    player_id: i64,
    player_name: Option<String>,
    status: String,
    comment: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VoteRow> for Vote {
    type Error = StoreError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        Ok(Vote {
            event_id: row.event_id,
            player_id: row.player_id,
            player_name: row
                .player_name
                .unwrap_or_else(|| fallback_player_name(row.player_id)),
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            comment: row.comment,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn insert_event(&self, event: &NewEvent) -> StoreResult<Event> {
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO events \
             (id, team_id, creator_id, title, description, category, scheduled_at, location, min_attendees, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(id)
        .bind(event.team_id)
        .bind(event.creator_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.category.as_str())
        .bind(event.scheduled_at)
        .bind(&event.location)
        .bind(event.min_attendees)
        .bind(EventStatus::Proposed.as_str())
        .execute(&self.pool)
        .await?;

        self.find_event(id, event.team_id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("event {} vanished after insert", id)))
    }

    async fn find_event(&self, event_id: Uuid, team_id: i64) -> StoreResult<Option<Event>> {
        let sql = format!(
            "SELECT {} FROM events e \
             LEFT JOIN players p ON p.id = e.creator_id \
             WHERE e.id = $1 AND e.team_id = $2",
            EVENT_COLUMNS
        );

        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(event_id)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Event::try_from).transpose()
    }

    async fn list_events(
        &self,
        team_id: i64,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> StoreResult<Vec<EventSummary>> {
        let sql = format!(
            "SELECT {}, \
             COUNT(a.player_id) FILTER (WHERE a.status = 'available') AS available, \
             COUNT(a.player_id) FILTER (WHERE a.status = 'maybe') AS maybe, \
             COUNT(a.player_id) FILTER (WHERE a.status = 'unavailable') AS unavailable, \
             COUNT(a.player_id) AS total \
             FROM events e \
             LEFT JOIN players p ON p.id = e.creator_id \
             LEFT JOIN event_availability a ON a.event_id = e.id \
             WHERE e.team_id = $1 AND e.scheduled_at >= $2 AND e.scheduled_at < $3 \
             AND e.status <> 'cancelled' \
             GROUP BY e.id, p.display_name \
             ORDER BY e.scheduled_at ASC",
            EVENT_COLUMNS
        );

        let rows = sqlx::query_as::<_, EventSummaryRow>(&sql)
            .bind(team_id)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| -> StoreResult<EventSummary> {
                Ok(EventSummary {
                    event: Event::try_from(row.event)?,
                    stats: AvailabilityStats {
                        available: row.available,
                        maybe: row.maybe,
                        unavailable: row.unavailable,
                        total: row.total,
                    },
                })
            })
            .collect()
    }

    async fn update_event(
        &self,
        event_id: Uuid,
        changes: &EventChanges,
        expected_status: EventStatus,
    ) -> StoreResult<bool> {
        if changes.is_empty() {
            return Ok(true);
        }

        let mut query = update_query(event_id, changes, expected_status);
        let result = query.build().execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_event(&self, event_id: Uuid) -> StoreResult<bool> {
        // Votes go with the event through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn transition_status(
        &self,
        event_id: Uuid,
        from: EventStatus,
        to: EventStatus,
    ) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE events SET status = $3 WHERE id = $1 AND status = $2")
            .bind(event_id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl AvailabilityStore for PgStore {
    async fn upsert_vote(
        &self,
        event_id: Uuid,
        player_id: i64,
        status: VoteStatus,
        comment: Option<&str>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO event_availability (event_id, player_id, status, comment, updated_at) \
             VALUES ($1, $2, $3, $4, now()) \
             ON CONFLICT (event_id, player_id) \
             DO UPDATE SET status = EXCLUDED.status, comment = EXCLUDED.comment, updated_at = now()",
        )
        .bind(event_id)
        .bind(player_id)
        .bind(status.as_str())
        .bind(comment)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(err)) if err.is_foreign_key_violation() => {
                debug!(%event_id, player_id, "Vote rejected, event was deleted concurrently");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn tally(&self, event_id: Uuid) -> StoreResult<AvailabilityStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            "SELECT \
             COUNT(*) FILTER (WHERE status = 'available') AS available, \
             COUNT(*) FILTER (WHERE status = 'maybe') AS maybe, \
             COUNT(*) FILTER (WHERE status = 'unavailable') AS unavailable, \
             COUNT(*) AS total \
             FROM event_availability WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_votes(&self, event_id: Uuid) -> StoreResult<Vec<Vote>> {
        let rows = sqlx::query_as::<_, VoteRow>(
            "SELECT a.event_id, a.player_id, p.display_name AS player_name, \
             a.status, a.comment, a.updated_at \
             FROM event_availability a \
             LEFT JOIN players p ON p.id = a.player_id \
             WHERE a.event_id = $1 \
             ORDER BY CASE a.status \
                 WHEN 'available' THEN 1 \
                 WHEN 'maybe' THEN 2 \
                 WHEN 'unavailable' THEN 3 \
             END, \
             COALESCE(p.display_name, 'player #' || a.player_id::text) ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Vote::try_from).collect()
    }
}

/// `UPDATE` touching only the supplied columns, guarded by the status the
/// caller read.
fn update_query(
    event_id: Uuid,
    changes: &EventChanges,
    expected_status: EventStatus,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("UPDATE events SET ");
    let mut set = query.separated(", ");
    if let Some(title) = &changes.title {
        set.push("title = ").push_bind_unseparated(title.clone());
    }
    if let Some(description) = &changes.description {
        set.push("description = ")
            .push_bind_unseparated(description.clone());
    }
    if let Some(category) = changes.category {
        set.push("category = ")
            .push_bind_unseparated(category.as_str());
    }
    if let Some(scheduled_at) = changes.scheduled_at {
        set.push("scheduled_at = ").push_bind_unseparated(scheduled_at);
    }
    if let Some(location) = &changes.location {
        set.push("location = ").push_bind_unseparated(location.clone());
    }
    if let Some(min_attendees) = changes.min_attendees {
        set.push("min_attendees = ")
            .push_bind_unseparated(min_attendees);
    }
    if let Some(status) = changes.status {
        set.push("status = ").push_bind_unseparated(status.as_str());
    }
    query
        .push(" WHERE id = ")
        .push_bind(event_id)
        .push(" AND status = ")
        .push_bind(expected_status.as_str());
    query
}

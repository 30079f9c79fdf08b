use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AvailabilityStore, EventStore, StoreResult};
use crate::models::availability::{fallback_player_name, sort_votes};
use crate::models::{
    AvailabilityStats, Event, EventChanges, EventStatus, EventSummary, NewEvent, Player, Vote,
    VoteStatus,
};

/// Store kept entirely in process memory. Every operation takes the lock
/// once, so each write is atomic with respect to concurrent requests.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    players: HashMap<i64, Player>,
    events: HashMap<Uuid, Event>,
    votes: HashMap<(Uuid, i64), StoredVote>,
}

#[derive(Clone)]
struct StoredVote {
    status: VoteStatus,
    comment: Option<String>,
    updated_at: chrono::DateTime<Utc>,
}

impl MemoryState {
    fn player_name(&self, player_id: i64) -> Option<String> {
        self.players
            .get(&player_id)
            .map(|player| player.display_name.clone())
    }

    fn tally(&self, event_id: Uuid) -> AvailabilityStats {
        self.votes
            .iter()
            .filter(|((id, _), _)| *id == event_id)
            .map(|(_, vote)| vote.status)
            .collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a directory entry so events and votes can show its name.
    pub async fn add_player(&self, player: Player) {
        let mut state = self.state.write().await;
        state.players.insert(player.id, player);
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, event: &NewEvent) -> StoreResult<Event> {
        let mut state = self.state.write().await;
        let stored = Event {
            id: Uuid::new_v4(),
            team_id: event.team_id,
            creator_id: event.creator_id,
            creator_name: state.player_name(event.creator_id).unwrap_or_default(),
            title: event.title.clone(),
            description: event.description.clone(),
            category: event.category,
            scheduled_at: event.scheduled_at,
            location: event.location.clone(),
            min_attendees: event.min_attendees,
            status: EventStatus::Proposed,
            created_at: Utc::now(),
        };
        state.events.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_event(&self, event_id: Uuid, team_id: i64) -> StoreResult<Option<Event>> {
        let state = self.state.read().await;
        Ok(state
            .events
            .get(&event_id)
            .filter(|event| event.team_id == team_id)
            .cloned())
    }

    async fn list_events(
        &self,
        team_id: i64,
        from: NaiveDateTime,
        until: NaiveDateTime,
    ) -> StoreResult<Vec<EventSummary>> {
        let state = self.state.read().await;
        let mut summaries: Vec<EventSummary> = state
            .events
            .values()
            .filter(|event| {
                event.team_id == team_id
                    && event.status != EventStatus::Cancelled
                    && event.scheduled_at >= from
                    && event.scheduled_at < until
            })
            .map(|event| EventSummary {
                event: event.clone(),
                stats: state.tally(event.id),
            })
            .collect();
        summaries.sort_by_key(|summary| summary.event.scheduled_at);
        Ok(summaries)
    }

    async fn update_event(
        &self,
        event_id: Uuid,
        changes: &EventChanges,
        expected_status: EventStatus,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let Some(event) = state.events.get_mut(&event_id) else {
            return Ok(false);
        };
        if event.status != expected_status {
            return Ok(false);
        }

        if let Some(title) = &changes.title {
            event.title = title.clone();
        }
        if let Some(description) = &changes.description {
            event.description = description.clone();
        }
        if let Some(category) = changes.category {
            event.category = category;
        }
        if let Some(scheduled_at) = changes.scheduled_at {
            event.scheduled_at = scheduled_at;
        }
        if let Some(location) = &changes.location {
            event.location = location.clone();
        }
        if let Some(min_attendees) = changes.min_attendees {
            event.min_attendees = min_attendees;
        }
        if let Some(status) = changes.status {
            event.status = status;
        }
        Ok(true)
    }

    async fn delete_event(&self, event_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let existed = state.events.remove(&event_id).is_some();
        state.votes.retain(|(id, _), _| *id != event_id);
        Ok(existed)
    }

    async fn transition_status(
        &self,
        event_id: Uuid,
        from: EventStatus,
        to: EventStatus,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.events.get_mut(&event_id) {
            Some(event) if event.status == from => {
                event.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl AvailabilityStore for MemoryStore {
    async fn upsert_vote(
        &self,
        event_id: Uuid,
        player_id: i64,
        status: VoteStatus,
        comment: Option<&str>,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if !state.events.contains_key(&event_id) {
            return Ok(false);
        }
        state.votes.insert(
            (event_id, player_id),
            StoredVote {
                status,
                comment: comment.map(str::to_string),
                updated_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn tally(&self, event_id: Uuid) -> StoreResult<AvailabilityStats> {
        Ok(self.state.read().await.tally(event_id))
    }

    async fn list_votes(&self, event_id: Uuid) -> StoreResult<Vec<Vote>> {
        let state = self.state.read().await;
        let mut votes: Vec<Vote> = state
            .votes
            .iter()
            .filter(|((id, _), _)| *id == event_id)
            .map(|((id, player_id), vote)| Vote {
                event_id: *id,
                player_id: *player_id,
                player_name: state
                    .player_name(*player_id)
                    .unwrap_or_else(|| fallback_player_name(*player_id)),
                status: vote.status,
                comment: vote.comment.clone(),
                updated_at: vote.updated_at,
            })
            .collect();
        sort_votes(&mut votes);
        Ok(votes)
    }
}

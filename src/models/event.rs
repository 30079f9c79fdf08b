use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::availability::AvailabilityStats;

pub const MIN_ATTENDEES_FLOOR: i32 = 1;
pub const MIN_ATTENDEES_CEILING: i32 = 7;
pub const DEFAULT_MIN_ATTENDEES: i32 = 3;

/// Clamps a requested threshold into the supported range instead of rejecting it.
pub fn clamp_min_attendees(requested: i64) -> i32 {
    requested.clamp(
        i64::from(MIN_ATTENDEES_FLOOR),
        i64::from(MIN_ATTENDEES_CEILING),
    ) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    FriendlyMatch,
    ViewingParty,
    Meeting,
    Other,
}

impl EventCategory {
    /// Maps free-form client input onto a category. Unknown or missing values
    /// become `Other`; the league's legacy French identifiers are accepted.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("friendly_match") | Some("match_amical") => Self::FriendlyMatch,
            Some("viewing_party") | Some("visionnage") => Self::ViewingParty,
            Some("meeting") | Some("reunion") => Self::Meeting,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FriendlyMatch => "friendly_match",
            Self::ViewingParty => "viewing_party",
            Self::Meeting => "meeting",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FriendlyMatch => "🏉 Friendly match",
            Self::ViewingParty => "📺 Viewing party",
            Self::Meeting => "🤝 Meeting",
            Self::Other => "📅 Other",
        }
    }
}

impl FromStr for EventCategory {
    type Err = String;

    /// Strict parse used when decoding stored rows.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "friendly_match" => Ok(Self::FriendlyMatch),
            "viewing_party" => Ok(Self::ViewingParty),
            "meeting" => Ok(Self::Meeting),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown event category '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Proposed,
    Confirmed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Proposed => "Proposed",
            Self::Confirmed => "Confirmed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "proposed" => Ok(Self::Proposed),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown event status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: Uuid,
    pub team_id: i64,
    pub creator_id: i64,
    pub creator_name: String,
    pub title: String,
    pub description: Option<String>,
    pub category: EventCategory,
    pub scheduled_at: NaiveDateTime,
    pub location: Option<String>,
    pub min_attendees: i32,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}

/// A validated event ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub team_id: i64,
    pub creator_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: EventCategory,
    pub scheduled_at: NaiveDateTime,
    pub location: Option<String>,
    pub min_attendees: i32,
}

/// Validated partial update. `None` leaves a column untouched; for the
/// nullable text columns `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<EventCategory>,
    pub scheduled_at: Option<NaiveDateTime>,
    pub location: Option<Option<String>>,
    pub min_attendees: Option<i32>,
    pub status: Option<EventStatus>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Event listed in a monthly agenda, with its vote counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSummary {
    pub event: Event,
    pub stats: AvailabilityStats,
}

/// Raw create payload as sent by clients; validated by the event service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEventInput {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "type")]
    pub category: Option<String>,
    #[serde(alias = "proposed_date")]
    pub scheduled_at: Option<String>,
    pub location: Option<String>,
    #[serde(alias = "min_players")]
    pub min_attendees: Option<i64>,
}

/// Raw partial update payload; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventInput {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "type")]
    pub category: Option<String>,
    #[serde(alias = "proposed_date")]
    pub scheduled_at: Option<String>,
    pub location: Option<String>,
    #[serde(alias = "min_players")]
    pub min_attendees: Option<i64>,
    pub status: Option<String>,
}

impl UpdateEventInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.scheduled_at.is_none()
            && self.location.is_none()
            && self.min_attendees.is_none()
            && self.status.is_none()
    }
}

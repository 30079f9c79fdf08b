use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteStatus {
    Available,
    Maybe,
    Unavailable,
}

impl VoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Maybe => "maybe",
            Self::Unavailable => "unavailable",
        }
    }

    /// Position of the status in a vote listing.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Available => 1,
            Self::Maybe => 2,
            Self::Unavailable => 3,
        }
    }
}

impl fmt::Display for VoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "available" => Ok(Self::Available),
            "maybe" => Ok(Self::Maybe),
            "unavailable" => Ok(Self::Unavailable),
            other => Err(format!("unknown availability status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vote {
    pub event_id: Uuid,
    pub player_id: i64,
    pub player_name: String,
    pub status: VoteStatus,
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityStats {
    pub available: i64,
    pub maybe: i64,
    pub unavailable: i64,
    pub total: i64,
}

impl AvailabilityStats {
    pub fn record(&mut self, status: VoteStatus) {
        match status {
            VoteStatus::Available => self.available += 1,
            VoteStatus::Maybe => self.maybe += 1,
            VoteStatus::Unavailable => self.unavailable += 1,
        }
        self.total += 1;
    }
}

impl FromIterator<VoteStatus> for AvailabilityStats {
    fn from_iter<I: IntoIterator<Item = VoteStatus>>(iter: I) -> Self {
        let mut stats = Self::default();
        for status in iter {
            stats.record(status);
        }
        stats
    }
}

/// Listing order for votes: available, maybe, unavailable, then by name.
pub fn sort_votes(votes: &mut [Vote]) {
    votes.sort_by(|a, b| {
        a.status
            .rank()
            .cmp(&b.status.rank())
            .then_with(|| a.player_name.cmp(&b.player_name))
    });
}

pub fn fallback_player_name(player_id: i64) -> String {
    format!("player #{}", player_id)
}

pub mod availability;
pub mod event;
pub mod player;

pub use availability::{AvailabilityStats, Vote, VoteStatus};
pub use event::{
    CreateEventInput, Event, EventCategory, EventChanges, EventStatus, EventSummary, NewEvent,
    UpdateEventInput,
};
pub use player::{Player, PlayerContext};

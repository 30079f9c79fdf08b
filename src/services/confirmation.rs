//! Status rules for team events.
//!
//! ```text
//! proposed ──(threshold reached | creator)──▶ confirmed
//!     │                                          │
//!     └──────────────(creator)──▶ cancelled ◀────┘
//! ```
//!
//! Status only moves forward. Confirmation is sticky: an event that loses
//! available votes after being confirmed stays confirmed.

use crate::models::EventStatus;

/// Automatic rule run after every vote. Returns the status the event should
/// move to, or `None` when nothing changes.
pub fn evaluate(status: EventStatus, min_attendees: i32, available: i64) -> Option<EventStatus> {
    match status {
        EventStatus::Proposed if available >= i64::from(min_attendees) => {
            Some(EventStatus::Confirmed)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("an event cannot be moved back to proposed")]
    BackToProposed,

    #[error("a cancelled event cannot change status")]
    AlreadyCancelled,
}

/// Creator override. `Ok(None)` means the requested status is already the
/// current one.
pub fn manual_transition(
    current: EventStatus,
    requested: EventStatus,
) -> Result<Option<EventStatus>, TransitionError> {
    if current == requested {
        return Ok(None);
    }
    match (current, requested) {
        (EventStatus::Cancelled, _) => Err(TransitionError::AlreadyCancelled),
        (_, EventStatus::Proposed) => Err(TransitionError::BackToProposed),
        (_, next) => Ok(Some(next)),
    }
}

/// Whether `from -> to` is one of the forward transitions.
pub fn is_forward(from: EventStatus, to: EventStatus) -> bool {
    matches!(
        (from, to),
        (EventStatus::Proposed, EventStatus::Confirmed)
            | (EventStatus::Proposed, EventStatus::Cancelled)
            | (EventStatus::Confirmed, EventStatus::Cancelled)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EventStatus; 3] = [
        EventStatus::Proposed,
        EventStatus::Confirmed,
        EventStatus::Cancelled,
    ];

    #[test]
    fn test_confirms_when_threshold_reached() {
        assert_eq!(
            evaluate(EventStatus::Proposed, 3, 3),
            Some(EventStatus::Confirmed)
        );
        assert_eq!(
            evaluate(EventStatus::Proposed, 3, 5),
            Some(EventStatus::Confirmed)
        );
        assert_eq!(evaluate(EventStatus::Proposed, 3, 2), None);
    }

    #[test]
    fn test_confirmation_is_sticky() {
        assert_eq!(evaluate(EventStatus::Confirmed, 3, 0), None);
    }

    #[test]
    fn test_cancelled_never_resurrects() {
        assert_eq!(evaluate(EventStatus::Cancelled, 1, 7), None);
        for requested in ALL {
            if requested != EventStatus::Cancelled {
                assert_eq!(
                    manual_transition(EventStatus::Cancelled, requested),
                    Err(TransitionError::AlreadyCancelled)
                );
            }
        }
    }

    #[test]
    fn test_manual_overrides() {
        assert_eq!(
            manual_transition(EventStatus::Proposed, EventStatus::Confirmed),
            Ok(Some(EventStatus::Confirmed))
        );
        assert_eq!(
            manual_transition(EventStatus::Confirmed, EventStatus::Cancelled),
            Ok(Some(EventStatus::Cancelled))
        );
        assert_eq!(
            manual_transition(EventStatus::Confirmed, EventStatus::Proposed),
            Err(TransitionError::BackToProposed)
        );
        assert_eq!(
            manual_transition(EventStatus::Confirmed, EventStatus::Confirmed),
            Ok(None)
        );
    }

    #[test]
    fn test_every_allowed_transition_is_forward() {
        for current in ALL {
            for requested in ALL {
                if let Ok(Some(next)) = manual_transition(current, requested) {
                    assert!(is_forward(current, next), "{current} -> {next}");
                }
            }
            for available in 0..8 {
                if let Some(next) = evaluate(current, 3, available) {
                    assert!(is_forward(current, next));
                }
            }
        }
    }
}

pub mod confirmation;
pub mod events;

pub use events::{EventDetails, EventService};

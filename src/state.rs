use std::sync::Arc;

use crate::services::EventService;
use crate::store::AgendaStore;

#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
}

impl AppState {
    pub fn new(store: Arc<dyn AgendaStore>) -> Self {
        Self {
            events: EventService::new(store),
        }
    }
}

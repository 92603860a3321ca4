use std::sync::Arc;

use crate::notifier::Notifier;
use crate::store::EventStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
    pub notifier: Notifier,
    pub notify_in_background: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>, notifier: Notifier, notify_in_background: bool) -> Self {
        Self {
            store,
            notifier,
            notify_in_background,
        }
    }
}

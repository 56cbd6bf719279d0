// ABOUTME: Shared state handed to every API handler.
// ABOUTME: Cheap to clone; everything behind it is reference-counted.

use crate::store::SettingsStore;
use crate::trigger::Trigger;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub trigger: Arc<Trigger>,
    pub store: Arc<dyn SettingsStore>,
    pub version: String,
}

impl AppState {
    pub fn new(trigger: Arc<Trigger>, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            trigger,
            store,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

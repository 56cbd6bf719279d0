// ABOUTME: In-process settings store.
// ABOUTME: Used when no state file is configured, and by tests.

use super::{DeploymentSettings, SettingsStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<DeploymentSettings>,
}

impl MemorySettingsStore {
    pub fn with(settings: DeploymentSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self) -> Result<DeploymentSettings, StoreError> {
        Ok(*self.settings.lock())
    }

    async fn set(&self, swap_wait_seconds: i64) -> Result<DeploymentSettings, StoreError> {
        let updated = DeploymentSettings::new(swap_wait_seconds)?;
        *self.settings.lock() = updated;
        Ok(updated)
    }
}

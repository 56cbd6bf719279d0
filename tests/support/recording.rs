// ABOUTME: Recording test doubles for the notifier, scheduler and settings store.
// ABOUTME: Each keeps what it was given so tests can assert on it afterwards.

use async_trait::async_trait;
use parking_lot::Mutex;
use swapd::notify::Notifier;
use swapd::store::{DeploymentSettings, SettingsStore, StoreError};
use swapd::trigger::{SwapJob, SwapScheduler};

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

/// Keeps scheduled jobs (and so their claims) until cleared.
#[derive(Default)]
pub struct RecordingScheduler {
    jobs: Mutex<Vec<SwapJob>>,
}

impl RecordingScheduler {
    pub fn images(&self) -> Vec<String> {
        self.jobs.lock().iter().map(|j| j.image.to_string()).collect()
    }

    pub fn clear(&self) {
        self.jobs.lock().clear();
    }
}

impl SwapScheduler for RecordingScheduler {
    fn schedule(&self, job: SwapJob) {
        self.jobs.lock().push(job);
    }
}

/// A store whose backing storage is gone.
pub struct BrokenStore;

#[async_trait]
impl SettingsStore for BrokenStore {
    async fn get(&self) -> Result<DeploymentSettings, StoreError> {
        Err(StoreError::Unavailable("disk on fire".to_string()))
    }

    async fn set(&self, swap_wait_seconds: i64) -> Result<DeploymentSettings, StoreError> {
        DeploymentSettings::new(swap_wait_seconds)?;
        Err(StoreError::Unavailable("disk on fire".to_string()))
    }
}

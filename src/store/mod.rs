// ABOUTME: Persistent deployment settings: the swap stabilization wait.
// ABOUTME: One record, created with defaults on first read, updated atomically.

mod file;
mod memory;

pub use file::FileSettingsStore;
pub use memory::MemorySettingsStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SWAP_WAIT_SECONDS: u32 = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings store unavailable: {0}")]
    Unavailable(String),

    #[error("swap_wait_seconds must be a positive integer, got {0}")]
    InvalidWait(i64),
}

/// The single tunable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSettings {
    swap_wait_seconds: u32,
}

impl DeploymentSettings {
    pub fn new(swap_wait_seconds: i64) -> Result<Self, StoreError> {
        match u32::try_from(swap_wait_seconds) {
            Ok(secs) if secs > 0 => Ok(Self {
                swap_wait_seconds: secs,
            }),
            _ => Err(StoreError::InvalidWait(swap_wait_seconds)),
        }
    }

    pub fn swap_wait_seconds(&self) -> u32 {
        self.swap_wait_seconds
    }

    /// How long a new instance runs next to the old one before retirement.
    pub fn wait(&self) -> Duration {
        Duration::from_secs(u64::from(self.swap_wait_seconds))
    }
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            swap_wait_seconds: DEFAULT_SWAP_WAIT_SECONDS,
        }
    }
}

/// Storage for [`DeploymentSettings`].
///
/// Implementations serialize access themselves; `set` is a read-modify-write
/// under one lock, and a rejected value leaves the stored record untouched.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> Result<DeploymentSettings, StoreError>;

    async fn set(&self, swap_wait_seconds: i64) -> Result<DeploymentSettings, StoreError>;
}

/// File-backed store at `state_file`, or an in-memory one when absent.
pub fn open(state_file: Option<&Path>) -> Arc<dyn SettingsStore> {
    match state_file {
        Some(path) => Arc::new(FileSettingsStore::new(path)),
        None => Arc::new(MemorySettingsStore::default()),
    }
}

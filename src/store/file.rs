// ABOUTME: JSON-file settings store with atomic replacement.
// ABOUTME: Writes go to a sibling temp file which is then renamed over the target.

use super::{DeploymentSettings, SettingsStore, StoreError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    // Held across the file I/O of each operation.
    lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<Option<DeploymentSettings>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(unavailable(&self.path, e)),
        };

        let raw: RawSettings = serde_json::from_str(&content).map_err(|e| unavailable(&self.path, e))?;
        DeploymentSettings::new(raw.swap_wait_seconds)
            .map(Some)
            .map_err(|e| unavailable(&self.path, e))
    }

    async fn write(&self, settings: &DeploymentSettings) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| unavailable(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(settings).map_err(|e| unavailable(&self.path, e))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| unavailable(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| unavailable(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            swap_wait_seconds = settings.swap_wait_seconds(),
            "settings persisted"
        );
        Ok(())
    }
}

/// On-disk form; signed so an out-of-range value is reported, not misparsed.
#[derive(serde::Deserialize)]
struct RawSettings {
    swap_wait_seconds: i64,
}

fn unavailable(path: &Path, e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self) -> Result<DeploymentSettings, StoreError> {
        let _guard = self.lock.lock().await;

        match self.read().await? {
            Some(settings) => Ok(settings),
            None => {
                let settings = DeploymentSettings::default();
                self.write(&settings).await?;
                Ok(settings)
            }
        }
    }

    async fn set(&self, swap_wait_seconds: i64) -> Result<DeploymentSettings, StoreError> {
        let updated = DeploymentSettings::new(swap_wait_seconds)?;

        let _guard = self.lock.lock().await;
        self.write(&updated).await?;
        Ok(updated)
    }
}

// ABOUTME: Registry of base names with a swap underway.
// ABOUTME: Optionally backed by lock files so separate processes exclude each other.

use crate::types::InstanceName;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// A lock file older than this is assumed to belong to a dead process.
const STALE_AFTER_HOURS: i64 = 1;

#[derive(Debug, Clone, Error)]
#[error("a swap of {base_name} is already in progress (started {since})")]
pub struct SwapInProgress {
    pub base_name: String,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error(transparent)]
    InProgress(#[from] SwapInProgress),

    #[error("cannot take swap lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClaimError {
    fn lock(path: &Path, source: std::io::Error) -> Self {
        ClaimError::Lock {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Contents of a lock file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub base_name: String,
}

impl LockInfo {
    fn new(base_name: &InstanceName) -> Self {
        Self {
            pid: std::process::id(),
            started_at: Utc::now(),
            base_name: base_name.to_string(),
        }
    }

    pub fn is_stale(&self) -> bool {
        (Utc::now() - self.started_at).num_hours() >= STALE_AFTER_HOURS
    }
}

/// Base names currently being swapped.
///
/// Without a lock directory only claims from the same registry conflict.
/// With one, each claim also creates `<dir>/<base_name>.lock`, so every
/// process pointed at the same directory sees the others' swaps.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
    lock_dir: Option<Arc<PathBuf>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lock_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_dir = Some(Arc::new(dir.into()));
        self
    }

    pub fn lock_dir(&self) -> Option<&Path> {
        self.lock_dir.as_deref().map(PathBuf::as_path)
    }

    /// Claim `base_name`, failing if it is already claimed here or, with a
    /// lock directory, by another process.
    pub fn claim(&self, base_name: &InstanceName) -> Result<InFlightClaim, ClaimError> {
        let mut active = self.active.lock();
        if let Some(since) = active.get(base_name.as_str()) {
            return Err(SwapInProgress {
                base_name: base_name.to_string(),
                since: *since,
            }
            .into());
        }

        let lock_file = match self.lock_dir() {
            Some(dir) => Some(acquire_lock_file(dir, base_name)?),
            None => None,
        };

        active.insert(base_name.to_string(), Utc::now());
        Ok(InFlightClaim {
            active: Arc::clone(&self.active),
            base_name: base_name.clone(),
            lock_file,
        })
    }

    pub fn is_active(&self, base_name: &InstanceName) -> bool {
        self.active.lock().contains_key(base_name.as_str())
    }
}

/// Exclusive right to swap one base name.
#[derive(Debug)]
pub struct InFlightClaim {
    active: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
    base_name: InstanceName,
    lock_file: Option<PathBuf>,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        if let Some(path) = &self.lock_file
            && let Err(e) = fs::remove_file(path)
        {
            tracing::warn!(path = %path.display(), "failed to remove swap lock: {}", e);
        }
        self.active.lock().remove(self.base_name.as_str());
    }
}

/// Create the lock file with `create_new`, breaking it once if it is stale.
fn acquire_lock_file(dir: &Path, base_name: &InstanceName) -> Result<PathBuf, ClaimError> {
    let path = dir.join(format!("{}.lock", base_name));
    fs::create_dir_all(dir).map_err(|e| ClaimError::lock(&path, e))?;

    let info = LockInfo::new(base_name);
    let json = serde_json::to_vec(&info)
        .map_err(|e| ClaimError::lock(&path, std::io::Error::other(e)))?;

    for _ in 0..2 {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                if let Err(e) = file.write_all(&json) {
                    let _ = fs::remove_file(&path);
                    return Err(ClaimError::lock(&path, e));
                }
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let existing = read_lock_file(&path, base_name);
                if !existing.is_stale() {
                    return Err(SwapInProgress {
                        base_name: base_name.to_string(),
                        since: existing.started_at,
                    }
                    .into());
                }
                tracing::warn!(
                    path = %path.display(),
                    pid = existing.pid,
                    since = %existing.started_at,
                    "breaking stale swap lock"
                );
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(ClaimError::lock(&path, e)),
                }
            }
            Err(e) => return Err(ClaimError::lock(&path, e)),
        }
    }

    Err(ClaimError::lock(
        &path,
        std::io::Error::new(
            ErrorKind::AlreadyExists,
            "lock taken by another process while breaking it",
        ),
    ))
}

/// Read a held lock. A file that cannot be parsed, such as one whose writer
/// has not finished yet, is dated by its modification time.
fn read_lock_file(path: &Path, base_name: &InstanceName) -> LockInfo {
    if let Ok(bytes) = fs::read(path)
        && let Ok(info) = serde_json::from_slice::<LockInfo>(&bytes)
    {
        return info;
    }

    let started_at = fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    LockInfo {
        pid: 0,
        started_at,
        base_name: base_name.to_string(),
    }
}

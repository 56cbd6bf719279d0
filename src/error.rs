// ABOUTME: Application-wide error types for swapd.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::notify::NotifyError;
use crate::runtime::RuntimeError;
use crate::store::StoreError;
use crate::swap::{ClaimError, SwapError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid image reference: {0}")]
    InvalidImage(String),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Swap(#[from] SwapError),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

pub type Result<T> = std::result::Result<T, Error>;

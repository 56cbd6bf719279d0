// ABOUTME: Container operations trait for container runtimes.
// ABOUTME: Run detached, list by name, stop, remove and rename containers.

use super::shared_types::ContainerSpec;
use crate::types::{ContainerId, InstanceName};
use async_trait::async_trait;
use std::time::Duration;

/// Container lifecycle operations.
///
/// Every call is a single attempt. Retrying is the caller's decision.
#[async_trait]
pub trait ContainerOps: Send + Sync {
    /// Create and start a container from `spec`.
    ///
    /// A container that was created but failed to start is removed before
    /// the error is returned, so a failed call never leaves `spec.name` taken.
    async fn run_detached(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError>;

    /// Ids of all containers, running or stopped, named exactly `name`.
    async fn list_by_name(&self, name: &InstanceName) -> Result<Vec<ContainerId>, ContainerError>;

    /// Stop a running container, waiting up to `grace` before killing it.
    async fn stop_container(&self, id: &ContainerId, grace: Duration)
    -> Result<(), ContainerError>;

    /// Remove a stopped container.
    async fn remove_container(&self, id: &ContainerId) -> Result<(), ContainerError>;

    /// Rename a container.
    async fn rename_container(
        &self,
        id: &ContainerId,
        new_name: &InstanceName,
    ) -> Result<(), ContainerError>;
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("container name already in use: {0}")]
    NameInUse(String),

    #[error("container not running: {0}")]
    NotRunning(String),

    #[error("container is running, stop it before removal: {0}")]
    StillRunning(String),

    #[error("port already allocated: {0}")]
    PortConflict(String),

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl ContainerError {
    /// The container no longer exists.
    pub fn is_gone(&self) -> bool {
        matches!(self, ContainerError::NotFound(_))
    }

    /// The container was already stopped.
    pub fn is_not_running(&self) -> bool {
        matches!(self, ContainerError::NotRunning(_))
    }
}

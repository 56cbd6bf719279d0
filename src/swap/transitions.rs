// ABOUTME: State transition methods for swap orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::diagnostics::{Diagnostics, Warning};
use crate::runtime::{ContainerOps, ImageOps, RegistryAuth};
use crate::types::ContainerId;

use super::Swap;
use super::error::{CallError, SwapError};
use super::report::RetirementReport;
use super::state::{Completed, Pending, Pulled, Retired, Stabilized, Started, SwapPhase};
use super::template::ContainerTemplate;

/// Run one runtime call, giving up after `limit`.
pub async fn within<T, E>(
    limit: Duration,
    call: impl Future<Output = Result<T, E>>,
) -> Result<T, CallError<E>> {
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(CallError::Failed(e)),
        Err(_) => Err(CallError::TimedOut(limit)),
    }
}

impl<S> Swap<S> {
    fn fail(&self, phase: SwapPhase, message: impl Into<String>) -> SwapError {
        SwapError::new(&self.image, phase, message)
    }
}

// =============================================================================
// Pending -> Pulled
// =============================================================================

impl Swap<Pending> {
    /// Pull the image from its registry.
    ///
    /// # Errors
    ///
    /// `Failed(Pulling)` if the image cannot be pulled within `limit`.
    #[must_use = "swap state must be used"]
    pub async fn pull<R: ImageOps + ?Sized>(
        self,
        runtime: &R,
        auth: Option<&RegistryAuth>,
        limit: Duration,
    ) -> Result<Swap<Pulled>, SwapError> {
        tracing::info!(image = %self.image, base_name = %self.base_name, "pulling image");

        within(limit, runtime.pull_image(&self.image, auth))
            .await
            .map_err(|e| self.fail(SwapPhase::Pulling, format!("pull of {}: {}", self.image, e)))?;

        Ok(self.transition(Pulled))
    }
}

// =============================================================================
// Pulled -> Started
// =============================================================================

impl Swap<Pulled> {
    /// Start the new instance under the temporary name.
    ///
    /// # Errors
    ///
    /// `Failed(Starting)` if the runtime refuses or the call times out. The
    /// old instance is left untouched.
    #[must_use = "swap state must be used"]
    pub async fn start<R: ContainerOps + ?Sized>(
        self,
        runtime: &R,
        template: &ContainerTemplate,
        limit: Duration,
    ) -> Result<Swap<Started>, SwapError> {
        tracing::info!(
            image = %self.image,
            base_name = %self.base_name,
            temporary = %self.temporary,
            "starting new instance"
        );

        let spec = template.spec(&self.temporary, &self.image, &self.base_name);
        let container = within(limit, runtime.run_detached(&spec))
            .await
            .map_err(|e| {
                self.fail(
                    SwapPhase::Starting,
                    format!("start of {} as {}: {}", self.image, self.temporary, e),
                )
            })?;

        tracing::debug!(container = %container.short(), "new instance running");
        Ok(self.transition(Started { container }))
    }
}

// =============================================================================
// Started -> Stabilized
// =============================================================================

impl Swap<Started> {
    /// Let the new instance run alongside the old one for `wait`.
    #[must_use = "swap state must be used"]
    pub async fn stabilize(self, wait: Duration) -> Swap<Stabilized> {
        tracing::info!(
            base_name = %self.base_name,
            temporary = %self.temporary,
            wait_secs = wait.as_secs(),
            "waiting for new instance to stabilize"
        );

        tokio::time::sleep(wait).await;

        let container = self.state.container.clone();
        self.transition(Stabilized { container })
    }
}

// =============================================================================
// Stabilized -> Retired
// =============================================================================

impl Swap<Stabilized> {
    /// Stop and remove every instance currently named as the base name.
    ///
    /// Never fails: listing, stop and remove failures are recorded in the
    /// report and the swap moves on. An instance that was already stopped
    /// or already gone does not count as a failure.
    #[must_use = "swap state must be used"]
    pub async fn retire_old<R: ContainerOps + ?Sized>(
        self,
        runtime: &R,
        grace: Duration,
        limit: Duration,
    ) -> Swap<Retired> {
        tracing::info!(base_name = %self.base_name, "retiring old instances");

        let mut diagnostics = Diagnostics::default();
        let mut retired = Vec::new();

        match within(limit, runtime.list_by_name(&self.base_name)).await {
            Ok(ids) => {
                for id in ids.into_iter().filter(|id| id != &self.state.container) {
                    if retire_one(runtime, &id, grace, limit, &mut diagnostics).await {
                        retired.push(id);
                    }
                }
            }
            Err(e) => diagnostics.warn(Warning::list_failed(format!(
                "listing instances named {}: {}",
                self.base_name, e
            ))),
        }

        let container = self.state.container.clone();
        let report = RetirementReport::new(retired, diagnostics);
        self.transition(Retired { container, report })
    }
}

/// Stop then remove `id`. Returns whether it is gone afterwards.
async fn retire_one<R: ContainerOps + ?Sized>(
    runtime: &R,
    id: &ContainerId,
    grace: Duration,
    limit: Duration,
    diagnostics: &mut Diagnostics,
) -> bool {
    // The runtime may legitimately take the full grace period.
    match within(limit.saturating_add(grace), runtime.stop_container(id, grace)).await {
        Ok(()) => {}
        Err(CallError::Failed(e)) if e.is_not_running() => {}
        Err(CallError::Failed(e)) if e.is_gone() => {
            tracing::debug!(container = %id.short(), "old instance already gone");
            return true;
        }
        Err(e) => diagnostics.warn(Warning::stop_failed(format!("stopping {}: {}", id.short(), e))),
    }

    match within(limit, runtime.remove_container(id)).await {
        Ok(()) => {
            tracing::debug!(container = %id.short(), "old instance removed");
            true
        }
        Err(CallError::Failed(e)) if e.is_gone() => true,
        Err(e) => {
            diagnostics.warn(Warning::remove_failed(format!("removing {}: {}", id.short(), e)));
            false
        }
    }
}

// =============================================================================
// Retired -> Completed
// =============================================================================

impl Swap<Retired> {
    /// Rename the new instance to the base name.
    ///
    /// # Errors
    ///
    /// `Failed(Promoting)` if the rename fails. The new instance keeps
    /// running under its temporary name.
    #[must_use = "swap state must be used"]
    pub async fn promote<R: ContainerOps + ?Sized>(
        self,
        runtime: &R,
        limit: Duration,
    ) -> Result<Swap<Completed>, SwapError> {
        tracing::info!(
            base_name = %self.base_name,
            temporary = %self.temporary,
            "promoting new instance"
        );

        within(
            limit,
            runtime.rename_container(&self.state.container, &self.base_name),
        )
        .await
        .map_err(|e| {
            self.fail(
                SwapPhase::Promoting,
                format!(
                    "rename of {} to {}: {}; new instance left running as {}",
                    self.temporary, self.base_name, e, self.temporary
                ),
            )
        })?;

        let Retired { container, report } = self.state.clone();
        Ok(self.transition(Completed { container, report }))
    }

    pub fn report(&self) -> &RetirementReport {
        &self.state.report
    }
}

// =============================================================================
// Completed - Terminal State
// =============================================================================

/// What a successful swap did.
#[derive(Debug, Clone, Serialize)]
pub struct SwapSummary {
    pub image: String,
    pub base_name: String,
    pub container: ContainerId,
    pub retired: Vec<ContainerId>,
    pub warnings: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Swap<Completed> {
    /// Consume the swap and summarize it.
    pub fn finish(self) -> SwapSummary {
        SwapSummary {
            image: self.image.to_string(),
            base_name: self.base_name.to_string(),
            container: self.state.container,
            retired: self.state.report.retired,
            warnings: self
                .state
                .report
                .warnings
                .into_iter()
                .map(|w| w.message)
                .collect(),
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

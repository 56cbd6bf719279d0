// ABOUTME: Runs a swap end to end and reports failures.
// ABOUTME: Also schedules swaps as detached tasks for the trigger.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::notify::Notifier;
use crate::runtime::{FullRuntime, RegistryAuth};
use crate::store::SettingsStore;
use crate::trigger::{SwapJob, SwapScheduler};
use crate::types::{ImageRef, InstanceName};

use super::attempt::Swap;
use super::error::SwapError;
use super::state::{Pending, SwapPhase};
use super::template::ContainerTemplate;
use super::transitions::SwapSummary;

/// Bounds on runtime calls.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub pull: Duration,
    pub call: Duration,
    /// Grace period handed to `stop` before the runtime kills an old instance.
    pub stop_grace: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            pull: Duration::from_secs(600),
            call: Duration::from_secs(60),
            stop_grace: Duration::from_secs(10),
        }
    }
}

/// Everything a swap run needs, shared by all runs.
pub struct Orchestrator {
    runtime: Arc<dyn FullRuntime>,
    store: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
    template: ContainerTemplate,
    timeouts: Timeouts,
    auth: Option<RegistryAuth>,
}

impl Orchestrator {
    pub fn new(
        runtime: Arc<dyn FullRuntime>,
        store: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
        template: ContainerTemplate,
    ) -> Self {
        Self {
            runtime,
            store,
            notifier,
            template,
            timeouts: Timeouts::default(),
            auth: None,
        }
    }

    /// Build from loaded config around already-connected collaborators.
    pub fn from_config(
        config: &Config,
        runtime: Arc<dyn FullRuntime>,
        store: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let template = ContainerTemplate::from_config(config)?;
        let timeouts = Timeouts {
            pull: config.runtime.pull_timeout,
            call: config.runtime.call_timeout,
            stop_grace: config.runtime.stop_timeout,
        };
        Ok(Self::new(runtime, store, notifier, template)
            .with_timeouts(timeouts)
            .with_auth(config.registry_auth()?))
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_auth(mut self, auth: Option<RegistryAuth>) -> Self {
        self.auth = auth;
        self
    }

    /// Swap the instance named `base_name` over to `image`.
    ///
    /// A failure is logged and sent to the notifier exactly once before it
    /// is returned. Nothing is rolled back.
    pub async fn run(
        &self,
        image: ImageRef,
        base_name: InstanceName,
    ) -> std::result::Result<SwapSummary, SwapError> {
        let swap = Swap::new(image, base_name);
        let image = swap.image().to_string();
        let base_name = swap.base_name().to_string();

        match self.execute(swap).await {
            Ok(summary) => {
                tracing::info!(
                    %image,
                    %base_name,
                    container = %summary.container.short(),
                    retired = summary.retired.len(),
                    "swap completed"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!(%image, %base_name, phase = %e.phase, "{}", e);
                self.notifier.notify(&e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn execute(&self, swap: Swap<Pending>) -> std::result::Result<SwapSummary, SwapError> {
        let runtime = self.runtime.as_ref();

        // Read before touching the runtime so a broken store changes nothing.
        let settings = self.store.get().await.map_err(|e| {
            SwapError::new(
                swap.image(),
                SwapPhase::Stabilizing,
                format!("reading swap settings: {}", e),
            )
        })?;

        let swap = swap
            .pull(runtime, self.auth.as_ref(), self.timeouts.pull)
            .await?;
        let swap = swap
            .start(runtime, &self.template, self.timeouts.call)
            .await?;
        let swap = swap.stabilize(settings.wait()).await;
        let swap = swap
            .retire_old(runtime, self.timeouts.stop_grace, self.timeouts.call)
            .await;
        if !swap.report().is_clean() {
            tracing::warn!(
                base_name = %swap.base_name(),
                failures = swap.report().warnings.len(),
                "old instances not fully retired"
            );
        }
        let swap = swap.promote(runtime, self.timeouts.call).await?;

        Ok(swap.finish())
    }
}

/// Runs each scheduled swap as its own tokio task.
#[derive(Clone)]
pub struct SpawnScheduler {
    orchestrator: Arc<Orchestrator>,
}

impl SpawnScheduler {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

impl SwapScheduler for SpawnScheduler {
    fn schedule(&self, job: SwapJob) {
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move {
            let SwapJob {
                image,
                base_name,
                claim,
            } = job;
            // Held until the run ends, however it ends.
            let _claim = claim;
            let _ = orchestrator.run(image, base_name).await;
        });
    }
}

// ABOUTME: Shared helpers for loading config and building the swap collaborators.
// ABOUTME: Used by serve and swap, which both need a config, a runtime, a notifier and locks.

use std::path::Path;
use std::sync::Arc;

use swapd::config::Config;
use swapd::diagnostics::Diagnostics;
use swapd::error::Result;
use swapd::notify::{self, Notifier};
use swapd::output::Output;
use swapd::runtime::{self, FullRuntime, RuntimeErrorKind};
use swapd::swap::InFlight;

/// Load and validate the config, printing any warnings.
pub fn load_config(path: Option<&Path>, output: &Output) -> Result<Config> {
    let config = Config::locate(path)?;

    let mut diag = Diagnostics::default();
    config.validate(&mut diag)?;
    for warning in diag.warnings() {
        output.progress(&format!("Warning: {}", warning.message));
    }

    Ok(config)
}

/// Connect to the runtime the config selects.
pub async fn connect_to_runtime(config: &Config, output: &Output) -> Result<Arc<dyn FullRuntime>> {
    output.progress(&format!(
        "  → Connecting to container runtime ({:?} backend)...",
        config.runtime.backend
    ));

    runtime::connect(
        config.runtime.backend,
        &config.runtime.runtime_config(),
        config.runtime.binary.as_deref(),
    )
    .await
    .map_err(|e| {
        match e.kind() {
            RuntimeErrorKind::NoRuntimeFound => output.progress(
                "  hint: set runtime.socket, or use `backend: cli` where only the executable exists",
            ),
            RuntimeErrorKind::ExecutableFailed => {
                output.progress("  hint: set runtime.binary to the docker or podman executable")
            }
            RuntimeErrorKind::ConnectionFailed => {}
        }
        e.into()
    })
}

/// Build the failure notifier the config names.
pub fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    Ok(notify::from_url(config.notify_url()?, config.notify_timeout())?)
}

/// In-flight registry whose claims also lock out other swapd processes.
pub fn build_inflight(config: &Config, output: &Output) -> InFlight {
    match config.lock_dir() {
        Some(dir) => InFlight::new().with_lock_dir(dir),
        None => {
            output.progress(
                "Warning: no state_file configured; swaps are not coordinated with other swapd processes",
            );
            InFlight::new()
        }
    }
}

// ABOUTME: Serve command implementation.
// ABOUTME: Wires runtime, store, notifier, orchestrator and trigger into the HTTP daemon.

use super::runtime_connection::{build_inflight, build_notifier, connect_to_runtime, load_config};
use std::path::Path;
use std::sync::Arc;
use swapd::api::{self, AppState};
use swapd::error::Result;
use swapd::output::{Output, OutputMode};
use swapd::store::{self, SettingsStore};
use swapd::swap::{Orchestrator, SpawnScheduler};
use swapd::trigger::{SharedSecret, Trigger};
use tokio::net::TcpListener;

pub async fn serve(config_path: Option<&Path>) -> Result<()> {
    let output = Output::new(OutputMode::Normal);
    let config = load_config(config_path, &output)?;

    let runtime = connect_to_runtime(&config, &output).await?;
    let store = store::open(config.state_file.as_deref());
    let notifier = build_notifier(&config)?;

    // Fail at startup rather than on the first swap.
    let settings = store.get().await?;
    tracing::info!(
        swap_wait_seconds = settings.swap_wait_seconds(),
        "swap settings loaded"
    );

    let orchestrator = Orchestrator::from_config(&config, runtime, Arc::clone(&store), notifier)?;
    let scheduler = SpawnScheduler::new(Arc::new(orchestrator));
    let trigger = Trigger::new(
        SharedSecret::new(&config.secret()?),
        config.allowed_prefixes.iter().cloned(),
        build_inflight(&config, &output),
        Arc::new(scheduler),
    );

    let listener = TcpListener::bind(config.listen).await?;
    api::serve(listener, AppState::new(Arc::new(trigger), store)).await?;

    Ok(())
}

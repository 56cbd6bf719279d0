// ABOUTME: One-shot swap command implementation.
// ABOUTME: Runs a single swap in the foreground, bypassing secret and whitelist checks.

use super::runtime_connection::{build_inflight, build_notifier, connect_to_runtime, load_config};
use std::path::Path;
use std::sync::Arc;
use swapd::error::{Error, Result};
use swapd::output::Output;
use swapd::store;
use swapd::swap::Orchestrator;
use swapd::types::{ImageRef, InstanceName};

pub async fn swap(config_path: Option<&Path>, image: &str, mut output: Output) -> Result<()> {
    let image = ImageRef::parse(image).map_err(|e| Error::InvalidImage(e.to_string()))?;
    let base_name =
        InstanceName::base_of(&image).map_err(|e| Error::InvalidImage(e.to_string()))?;

    output.start_timer();
    let config = load_config(config_path, &output)?;

    let claim = build_inflight(&config, &output).claim(&base_name)?;

    let runtime = connect_to_runtime(&config, &output).await?;
    let store = store::open(config.state_file.as_deref());
    let notifier = build_notifier(&config)?;
    let orchestrator = Orchestrator::from_config(&config, runtime, Arc::clone(&store), notifier)?;

    output.progress(&format!("Swapping {} to {}", base_name, image));

    let result = orchestrator.run(image, base_name).await;
    drop(claim);

    match result {
        Ok(summary) => {
            output.swap_succeeded(&summary);
            Ok(())
        }
        Err(e) => {
            output.swap_failed(&e);
            Err(Error::Swap(e))
        }
    }
}

// ABOUTME: Settings command implementation.
// ABOUTME: Reads or writes the swap wait directly in the configured store.

use std::path::Path;
use swapd::config::Config;
use swapd::error::Result;
use swapd::store::{self, SettingsStore};

pub async fn settings_get(config_path: Option<&Path>) -> Result<()> {
    let store = open(config_path)?;
    let settings = store.get().await?;
    println!("{}", settings.swap_wait_seconds());
    Ok(())
}

pub async fn settings_set(config_path: Option<&Path>, seconds: i64) -> Result<()> {
    let store = open(config_path)?;
    let settings = store.set(seconds).await?;
    println!("swap_wait_seconds = {}", settings.swap_wait_seconds());
    Ok(())
}

fn open(config_path: Option<&Path>) -> Result<std::sync::Arc<dyn SettingsStore>> {
    let config = Config::locate(config_path)?;
    if config.state_file.is_none() {
        eprintln!("Warning: no state_file configured; settings live only inside a running daemon");
    }
    Ok(store::open(config.state_file.as_deref()))
}

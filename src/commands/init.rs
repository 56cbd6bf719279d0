// ABOUTME: Init command implementation.
// ABOUTME: Writes a template swapd.yml into the working directory.

use std::env;
use swapd::config;
use swapd::error::Result;

pub fn init(force: bool) -> Result<()> {
    let cwd = env::current_dir()?;
    let path = config::init_config(&cwd, force)?;
    println!("Created {}", path.display());
    println!("Set SWAPD_SECRET and adjust allowed_prefixes before running `swapd serve`.");
    Ok(())
}

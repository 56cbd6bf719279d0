// ABOUTME: Command module aggregator for the swapd CLI.
// ABOUTME: Re-exports serve, swap, settings and init command handlers.

mod init;
mod runtime_connection;
mod serve;
mod settings;
mod swap;

pub use init::init;
pub use serve::serve;
pub use settings::{settings_get, settings_set};
pub use swap::swap;

// ABOUTME: Library root for swapd - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod api;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod notify;
pub mod output;
pub mod runtime;
pub mod store;
pub mod swap;
pub mod trigger;
pub mod types;

// ABOUTME: Runtime type definitions for Docker and Podman.
// ABOUTME: Includes RuntimeType enum, RuntimeInfo and the explicit override config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine client timeout when the config does not derive one.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(120);

/// The container runtime type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Docker,
    Podman,
}

impl RuntimeType {
    /// Executable name used by the CLI backend.
    pub fn binary(&self) -> &'static str {
        match self {
            RuntimeType::Docker => "docker",
            RuntimeType::Podman => "podman",
        }
    }
}

impl std::fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

/// Detected runtime information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub runtime_type: RuntimeType,
    /// Path to the runtime's API socket.
    pub socket_path: String,
}

/// Explicit runtime override.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Explicit runtime type (overrides auto-detection).
    pub runtime: Option<RuntimeType>,
    /// Explicit socket path (overrides the runtime's default).
    pub socket: Option<String>,
    /// Longest single exchange with the engine API.
    pub client_timeout: Option<Duration>,
}

impl RuntimeConfig {
    pub fn client_timeout(&self) -> Duration {
        self.client_timeout.unwrap_or(DEFAULT_CLIENT_TIMEOUT)
    }
}

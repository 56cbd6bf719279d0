// ABOUTME: Container runtime abstraction: detection, API and CLI backends.
// ABOUTME: connect() picks and verifies the backend the daemon runs swaps against.

mod bollard;
mod cli;
mod detection;
mod error;
pub mod traits;
mod types;

pub use self::bollard::BollardRuntime;
pub use cli::CliRuntime;
pub use detection::{DetectionError, detect_local};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::{
    ContainerError, ContainerOps, ContainerSpec, FullRuntime, ImageError, ImageOps, PortMapping,
    Protocol, RegistryAuth, RestartPolicyConfig, VolumeMount,
};
pub use types::{RuntimeConfig, RuntimeInfo, RuntimeType};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How the daemon talks to the container runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Engine API over the runtime's Unix socket.
    #[default]
    Api,
    /// The runtime's command-line executable.
    Cli,
}

/// Connect to the configured runtime and check that it answers.
///
/// For the API backend the socket is detected (or taken from `config`) and
/// pinged. For the CLI backend the executable must report a version.
pub async fn connect(
    backend: Backend,
    config: &RuntimeConfig,
    binary: Option<&str>,
) -> Result<Arc<dyn FullRuntime>, RuntimeError> {
    match backend {
        Backend::Api => {
            let info = detect_local(config)?;
            let runtime = BollardRuntime::connect_with_timeout(&info, config.client_timeout())
                .map_err(|e| RuntimeError::Connection {
                    message: e.to_string(),
                })?;
            runtime.ping().await.map_err(|e| RuntimeError::Connection {
                message: format!("{} at {}: {}", info.runtime_type, info.socket_path, e),
            })?;
            tracing::info!(
                runtime = %info.runtime_type,
                socket = %info.socket_path,
                "connected to container runtime"
            );
            Ok(Arc::new(runtime))
        }
        Backend::Cli => {
            let binary = binary
                .map(str::to_string)
                .unwrap_or_else(|| config.runtime.unwrap_or(RuntimeType::Docker).binary().to_string());
            let runtime = CliRuntime::new(binary.clone());
            let version = runtime
                .version()
                .await
                .map_err(|message| RuntimeError::Executable {
                    binary: binary.clone(),
                    message,
                })?;
            tracing::info!(%binary, %version, "using container runtime executable");
            Ok(Arc::new(runtime))
        }
    }
}

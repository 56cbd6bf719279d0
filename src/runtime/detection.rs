// ABOUTME: Runtime detection logic for the local host.
// ABOUTME: Honours explicit config, then checks Podman sockets, then Docker.

use super::types::{RuntimeConfig, RuntimeInfo, RuntimeType};
use std::path::Path;

/// Error during runtime detection.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked Podman and Docker sockets)")]
    NoRuntimeFound,

    #[error("configured socket does not exist: {0}")]
    SocketMissing(String),
}

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Detect the container runtime on this host.
///
/// Detection order (when not explicitly configured):
/// 1. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 2. Rootful Podman socket (`/run/podman/podman.sock`)
/// 3. Docker socket (`/var/run/docker.sock`)
///
/// An explicit socket without a runtime type is assumed to speak the Docker API.
pub fn detect_local(config: &RuntimeConfig) -> Result<RuntimeInfo, DetectionError> {
    if config.runtime.is_some() || config.socket.is_some() {
        let runtime_type = config.runtime.unwrap_or(RuntimeType::Docker);
        let socket_path = config
            .socket
            .clone()
            .unwrap_or_else(|| default_socket_path(runtime_type));
        if !Path::new(&socket_path).exists() {
            return Err(DetectionError::SocketMissing(socket_path));
        }
        return Ok(RuntimeInfo {
            runtime_type,
            socket_path,
        });
    }

    if let Some(uid) = get_uid() {
        let rootless_socket = format!("/run/user/{}/podman/podman.sock", uid);
        if Path::new(&rootless_socket).exists() {
            return Ok(RuntimeInfo {
                runtime_type: RuntimeType::Podman,
                socket_path: rootless_socket,
            });
        }
    }

    if Path::new(ROOTFUL_PODMAN).exists() {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Podman,
            socket_path: ROOTFUL_PODMAN.to_string(),
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(RuntimeInfo {
            runtime_type: RuntimeType::Docker,
            socket_path: DOCKER_SOCKET.to_string(),
        });
    }

    Err(DetectionError::NoRuntimeFound)
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}

fn default_socket_path(runtime: RuntimeType) -> String {
    match runtime {
        RuntimeType::Docker => DOCKER_SOCKET.to_string(),
        RuntimeType::Podman => ROOTFUL_PODMAN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_socket_must_exist() {
        let config = RuntimeConfig {
            runtime: Some(RuntimeType::Podman),
            socket: Some("/nonexistent/podman.sock".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            detect_local(&config),
            Err(DetectionError::SocketMissing(path)) if path == "/nonexistent/podman.sock"
        ));
    }

    #[test]
    fn explicit_socket_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("engine.sock");
        std::fs::write(&socket, b"").unwrap();
        let config = RuntimeConfig {
            runtime: None,
            socket: Some(socket.to_string_lossy().into_owned()),
            ..Default::default()
        };
        let info = detect_local(&config).unwrap();
        assert_eq!(info.runtime_type, RuntimeType::Docker);
        assert_eq!(info.socket_path, socket.to_string_lossy());
    }
}

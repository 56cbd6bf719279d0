// ABOUTME: Bollard-based container runtime implementation.
// ABOUTME: Supports both Docker and Podman via the Docker-compatible Engine API.

use crate::runtime::traits::{
    ContainerError, ContainerOps, ContainerSpec, ImageError, ImageOps, RegistryAuth,
    RestartPolicyConfig,
};
use crate::runtime::types::{DEFAULT_CLIENT_TIMEOUT, RuntimeInfo, RuntimeType};
use crate::types::{ContainerId, ImageRef, InstanceName};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{
    ContainerCreateBody, HostConfig, Mount, MountTypeEnum, PortBinding, RestartPolicy,
    RestartPolicyNameEnum,
};
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, ListContainersOptions, RemoveContainerOptions,
    RenameContainerOptions, StopContainerOptions,
};
use futures::StreamExt;
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::UnixStream;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_image_pull_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            ImageError::NotFound(format!("{}: {}", image_name, e))
        }
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 401 || *status_code == 403 =>
        {
            ImageError::AuthenticationFailed(format!("{}: {}", image_name, e))
        }
        _ => ImageError::PullFailed(format!("{}: {}", image_name, e)),
    }
}

fn map_container_create_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::ImageNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::NameInUse(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_start_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError { message, .. }
            if is_port_conflict(message) =>
        {
            ContainerError::PortConflict(message.clone())
        }
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_stop_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::NotRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_remove_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::StillRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_rename_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::NameInUse(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

pub(crate) fn is_port_conflict(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("port is already allocated") || message.contains("address already in use")
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Container runtime implementation using bollard.
///
/// Supports both Docker and Podman via the Docker-compatible API.
/// For Podman, pulls go through the native libpod API so that plain-HTTP
/// registries work.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
    socket_path: String,
}

impl BollardRuntime {
    /// Connect to a container runtime using detected runtime info.
    pub fn connect(info: &RuntimeInfo) -> Result<Self, bollard::errors::Error> {
        Self::connect_with_timeout(info, DEFAULT_CLIENT_TIMEOUT)
    }

    /// Connect, allowing each engine exchange up to `timeout`.
    ///
    /// This must cover the longest call the swap makes, or bollard abandons
    /// a stop that is still inside its grace period.
    pub fn connect_with_timeout(
        info: &RuntimeInfo,
        timeout: Duration,
    ) -> Result<Self, bollard::errors::Error> {
        let client = Docker::connect_with_unix(
            &info.socket_path,
            timeout.as_secs().max(1),
            bollard::API_DEFAULT_VERSION,
        )?;
        Ok(Self {
            client,
            runtime_type: info.runtime_type,
            socket_path: info.socket_path.clone(),
        })
    }

    /// Check that the engine answers.
    pub async fn ping(&self) -> Result<(), bollard::errors::Error> {
        self.client.ping().await.map(|_| ())
    }

    /// Pull image using Podman's native libpod API with tlsVerify=false.
    async fn pull_image_libpod(&self, image_name: &str) -> Result<(), ImageError> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| ImageError::Runtime(format!("failed to connect to socket: {}", e)))?;

        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| ImageError::Runtime(format!("HTTP handshake failed: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!("libpod connection error: {}", e);
            }
        });

        let uri = format!(
            "/v4.0.0/libpod/images/pull?reference={}&tlsVerify=false",
            urlencoding::encode(image_name)
        );

        let req = hyper::Request::builder()
            .method("POST")
            .uri(&uri)
            .header("Host", "localhost")
            .body(http_body_util::Empty::<bytes::Bytes>::new())
            .map_err(|e| ImageError::Runtime(format!("failed to build request: {}", e)))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ImageError::PullFailed(format!("request failed: {}", e)))?;

        use http_body_util::BodyExt;

        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| ImageError::PullFailed(format!("failed to read response: {}", e)))?
            .to_bytes();
        let body_text = String::from_utf8_lossy(&body);

        if status.as_u16() == 404 {
            return Err(ImageError::NotFound(format!("{}: {}", image_name, body_text)));
        }
        if !status.is_success() {
            return Err(ImageError::PullFailed(format!(
                "{}: libpod API error: {}",
                image_name, body_text
            )));
        }

        // The body is a stream of progress objects; a failure shows up in-band.
        if body_text.contains("\"error\"") && !body_text.contains("\"error\":null") {
            return Err(ImageError::PullFailed(format!("{}: {}", image_name, body_text)));
        }

        Ok(())
    }

    fn host_config(spec: &ContainerSpec) -> HostConfig {
        let mut host_config = HostConfig {
            restart_policy: Some(RestartPolicy {
                name: Some(match &spec.restart_policy {
                    RestartPolicyConfig::No => RestartPolicyNameEnum::NO,
                    RestartPolicyConfig::Always => RestartPolicyNameEnum::ALWAYS,
                    RestartPolicyConfig::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
                    RestartPolicyConfig::OnFailure { .. } => RestartPolicyNameEnum::ON_FAILURE,
                }),
                maximum_retry_count: match &spec.restart_policy {
                    RestartPolicyConfig::OnFailure { max_retries } => max_retries.map(i64::from),
                    _ => None,
                },
            }),
            ..Default::default()
        };

        let mounts: Vec<Mount> = spec
            .volumes
            .iter()
            .map(|m| Mount {
                source: Some(m.source.clone()),
                target: Some(m.target.clone()),
                typ: Some(MountTypeEnum::BIND),
                read_only: Some(m.read_only),
                ..Default::default()
            })
            .collect();
        if !mounts.is_empty() {
            host_config.mounts = Some(mounts);
        }

        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
        for port in &spec.ports {
            port_bindings
                .entry(port.container_key())
                .or_insert_with(|| Some(Vec::new()))
                .get_or_insert_with(Vec::new)
                .push(PortBinding {
                    host_ip: port.host_ip.clone(),
                    host_port: port.host_port.map(|p| p.to_string()),
                });
        }
        if !port_bindings.is_empty() {
            host_config.port_bindings = Some(port_bindings);
        }

        host_config
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        let env: Vec<String> = spec
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let exposed_ports: Vec<String> = spec.ports.iter().map(|p| p.container_key()).collect();

        let body = ContainerCreateBody {
            image: Some(spec.image.to_string()),
            env: if env.is_empty() { None } else { Some(env) },
            labels: if spec.labels.is_empty() {
                None
            } else {
                Some(spec.labels.clone())
            },
            cmd: spec.command.clone(),
            host_config: Some(Self::host_config(spec)),
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: Some(spec.name.to_string()),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), body)
            .await
            .map_err(map_container_create_error)?;

        Ok(ContainerId::new(response.id))
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        let image_name = reference.to_string();

        if self.runtime_type == RuntimeType::Podman && auth.is_none() {
            return self.pull_image_libpod(&image_name).await;
        }

        let opts = CreateImageOptions {
            from_image: Some(image_name.clone()),
            ..Default::default()
        };

        let credentials = auth.map(|a| bollard::auth::DockerCredentials {
            username: Some(a.username.clone()),
            password: Some(a.password.clone()),
            serveraddress: a.server.clone(),
            ..Default::default()
        });

        // Pull returns a stream of progress updates; drain it.
        let mut stream = self.client.create_image(Some(opts), None, credentials);
        while let Some(result) = stream.next().await {
            result.map_err(|e| map_image_pull_error(e, &image_name))?;
        }

        Ok(())
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn run_detached(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        let id = self.create(spec).await?;

        if let Err(e) = self
            .client
            .start_container(
                id.as_str(),
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
        {
            let err = map_container_start_error(e);
            let opts = RemoveContainerOptions {
                force: true,
                ..Default::default()
            };
            if let Err(cleanup) = self.client.remove_container(id.as_str(), Some(opts)).await {
                tracing::warn!(
                    container = %id.short(),
                    "failed to remove container that never started: {}",
                    cleanup
                );
            }
            return Err(err);
        }

        Ok(id)
    }

    async fn list_by_name(&self, name: &InstanceName) -> Result<Vec<ContainerId>, ContainerError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();
        // The engine's name filter is a regex over "/name"; anchor it, then
        // re-check exactly since '.' in the name is a wildcard there.
        filter_map.insert("name".to_string(), vec![format!("^/?{}$", name)]);

        let opts = ListContainersOptions {
            all: true,
            filters: Some(filter_map),
            ..Default::default()
        };

        // Podman reports "stopping" as a container state during shutdown, but bollard
        // doesn't recognize it and fails deserialization. Retry after a short delay
        // since "stopping" is a transient state.
        let mut last_error = None;
        for attempt in 0..3 {
            match self.client.list_containers(Some(opts.clone())).await {
                Ok(containers) => {
                    return Ok(containers
                        .into_iter()
                        .filter(|c| {
                            c.names.as_ref().is_some_and(|names| {
                                names
                                    .iter()
                                    .any(|n| n.trim_start_matches('/') == name.as_str())
                            })
                        })
                        .filter_map(|c| c.id.map(ContainerId::new))
                        .collect());
                }
                Err(e) => {
                    let err_str = e.to_string();
                    if (err_str.contains("unknown variant `stopping`")
                        || err_str.contains("unknown variant `stopped`"))
                        && attempt < 2
                    {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        last_error = Some(err_str);
                        continue;
                    }
                    return Err(ContainerError::Runtime(err_str));
                }
            }
        }

        Err(ContainerError::Runtime(
            last_error.unwrap_or_else(|| "list_containers failed".to_string()),
        ))
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        grace: Duration,
    ) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(i32::try_from(grace.as_secs()).unwrap_or(i32::MAX)),
            signal: None,
        };

        self.client
            .stop_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_stop_error)
    }

    async fn remove_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force: false,
            ..Default::default()
        };

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_remove_error)
    }

    async fn rename_container(
        &self,
        id: &ContainerId,
        new_name: &InstanceName,
    ) -> Result<(), ContainerError> {
        self.client
            .rename_container(
                id.as_str(),
                RenameContainerOptions {
                    name: new_name.to_string(),
                },
            )
            .await
            .map_err(map_container_rename_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::traits::{PortMapping, Protocol};

    fn server_error(status_code: u16, message: &str) -> bollard::errors::Error {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message: message.to_string(),
        }
    }

    #[test]
    fn create_conflict_means_name_in_use() {
        let err = map_container_create_error(server_error(409, "name \"/app\" is in use"));
        assert!(matches!(err, ContainerError::NameInUse(_)));
    }

    #[test]
    fn start_port_conflict_is_classified() {
        let err = map_container_start_error(server_error(
            500,
            "driver failed programming external connectivity: Bind for 0.0.0.0:8080 failed: port is already allocated",
        ));
        assert!(matches!(err, ContainerError::PortConflict(_)));
    }

    #[test]
    fn stop_of_stopped_container_is_not_running() {
        let err = map_container_stop_error(server_error(304, ""));
        assert!(err.is_not_running());
    }

    #[test]
    fn remove_of_running_container_is_still_running() {
        let err = map_container_remove_error(server_error(409, "cannot remove running container"));
        assert!(matches!(err, ContainerError::StillRunning(_)));
        let err = map_container_remove_error(server_error(404, "no such container"));
        assert!(err.is_gone());
    }

    #[test]
    fn host_config_groups_bindings_by_container_port() {
        let spec = ContainerSpec {
            name: InstanceName::new("app").unwrap(),
            image: ImageRef::parse("app:v1").unwrap(),
            env: HashMap::new(),
            labels: HashMap::new(),
            ports: vec![
                PortMapping {
                    host_port: Some(8080),
                    container_port: 80,
                    protocol: Protocol::Tcp,
                    host_ip: None,
                },
                PortMapping {
                    host_port: Some(8081),
                    container_port: 80,
                    protocol: Protocol::Tcp,
                    host_ip: Some("127.0.0.1".to_string()),
                },
            ],
            volumes: vec![],
            command: None,
            restart_policy: RestartPolicyConfig::OnFailure {
                max_retries: Some(3),
            },
        };

        let host_config = BollardRuntime::host_config(&spec);
        let bindings = host_config.port_bindings.unwrap();
        let tcp80 = bindings.get("80/tcp").unwrap().as_ref().unwrap();
        assert_eq!(tcp80.len(), 2);
        let restart = host_config.restart_policy.unwrap();
        assert_eq!(restart.name, Some(RestartPolicyNameEnum::ON_FAILURE));
        assert_eq!(restart.maximum_retry_count, Some(3));
    }
}

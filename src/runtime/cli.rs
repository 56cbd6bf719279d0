// ABOUTME: Container runtime backend that drives the docker/podman executable.
// ABOUTME: Used where no API socket is reachable; maps stderr text to typed errors.

use crate::runtime::traits::{
    ContainerError, ContainerOps, ContainerSpec, ImageError, ImageOps, RegistryAuth,
};
use crate::types::{ContainerId, ImageRef, InstanceName};
use async_trait::async_trait;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Runtime backend that shells out to a container CLI.
///
/// Child processes are killed when the future awaiting them is dropped, so a
/// caller-side timeout never leaves a stray `docker pull` behind.
#[derive(Debug, Clone)]
pub struct CliRuntime {
    binary: String,
}

impl CliRuntime {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run `<binary> version` to prove the executable works.
    pub async fn version(&self) -> Result<String, String> {
        let output = self
            .run(&["version".to_string(), "--format".to_string(), "{{.Client.Version}}".to_string()])
            .await?;
        if !output.status.success() {
            return Err(stderr_of(&output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn run(&self, args: &[String]) -> Result<Output, String> {
        tracing::debug!(binary = %self.binary, ?args, "running container cli");
        Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to execute {}: {}", self.binary, e))
    }

    async fn login(&self, auth: &RegistryAuth) -> Result<(), ImageError> {
        let mut args = vec![
            "login".to_string(),
            "--username".to_string(),
            auth.username.clone(),
            "--password-stdin".to_string(),
        ];
        if let Some(ref server) = auth.server {
            args.push(server.clone());
        }

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ImageError::Runtime(format!("failed to execute {}: {}", self.binary, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(auth.password.as_bytes())
                .await
                .map_err(|e| ImageError::Runtime(format!("failed to send password: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ImageError::Runtime(e.to_string()))?;
        if !output.status.success() {
            return Err(ImageError::AuthenticationFailed(stderr_of(&output)));
        }
        Ok(())
    }

    async fn remove_forced(&self, id: &ContainerId) {
        let args = vec!["rm".to_string(), "--force".to_string(), id.to_string()];
        match self.run(&args).await {
            Ok(output) if output.status.success() => {}
            Ok(output) => tracing::warn!(
                container = %id.short(),
                "failed to remove container that never started: {}",
                stderr_of(&output)
            ),
            Err(e) => tracing::warn!(
                container = %id.short(),
                "failed to remove container that never started: {}",
                e
            ),
        }
    }
}

fn stderr_of(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}

/// Arguments for `create`, everything but the binary itself.
pub(crate) fn create_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        "--name".to_string(),
        spec.name.to_string(),
        "--restart".to_string(),
        spec.restart_policy.to_string(),
    ];

    for port in &spec.ports {
        args.push("--publish".to_string());
        args.push(publish_arg(port));
    }

    let mut env: Vec<_> = spec.env.iter().collect();
    env.sort();
    for (key, value) in env {
        args.push("--env".to_string());
        args.push(format!("{}={}", key, value));
    }

    let mut labels: Vec<_> = spec.labels.iter().collect();
    labels.sort();
    for (key, value) in labels {
        args.push("--label".to_string());
        args.push(format!("{}={}", key, value));
    }

    for volume in &spec.volumes {
        args.push("--volume".to_string());
        args.push(volume.to_string());
    }

    args.push(spec.image.to_string());

    if let Some(ref command) = spec.command {
        args.extend(command.iter().cloned());
    }

    args
}

fn publish_arg(port: &crate::runtime::traits::PortMapping) -> String {
    let mut out = String::new();
    if let Some(ref ip) = port.host_ip {
        out.push_str(ip);
        out.push(':');
    }
    match port.host_port {
        Some(host_port) => out.push_str(&format!("{}:", host_port)),
        None if port.host_ip.is_some() => out.push(':'),
        None => {}
    }
    out.push_str(&port.container_key());
    out
}

/// Arguments listing every container named exactly `name`.
pub(crate) fn list_args(name: &InstanceName) -> Vec<String> {
    vec![
        "ps".to_string(),
        "--all".to_string(),
        "--no-trunc".to_string(),
        "--filter".to_string(),
        format!("name=^{}$", name),
        "--format".to_string(),
        "{{.ID}}\t{{.Names}}".to_string(),
    ]
}

/// Parse `ps` output, keeping only exact name matches.
pub(crate) fn parse_list_output(stdout: &str, name: &InstanceName) -> Vec<ContainerId> {
    stdout
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .filter(|(_, names)| {
            names
                .split(',')
                .any(|n| n.trim().trim_start_matches('/') == name.as_str())
        })
        .map(|(id, _)| ContainerId::new(id.trim()))
        .collect()
}

/// Classify a failed container command by its stderr.
pub(crate) fn classify_container_error(stderr: &str) -> ContainerError {
    let lower = stderr.to_lowercase();
    if lower.contains("no such container") || lower.contains("no container with name or id") {
        ContainerError::NotFound(stderr.to_string())
    } else if lower.contains("is already in use") {
        ContainerError::NameInUse(stderr.to_string())
    } else if lower.contains("port is already allocated")
        || lower.contains("address already in use")
    {
        ContainerError::PortConflict(stderr.to_string())
    } else if lower.contains("running container") || lower.contains("container is running") {
        ContainerError::StillRunning(stderr.to_string())
    } else if lower.contains("no such image") || lower.contains("image not known") {
        ContainerError::ImageNotFound(stderr.to_string())
    } else if lower.contains("is not running") {
        ContainerError::NotRunning(stderr.to_string())
    } else {
        ContainerError::Runtime(stderr.to_string())
    }
}

/// Classify a failed pull by its stderr.
pub(crate) fn classify_pull_error(stderr: &str) -> ImageError {
    let lower = stderr.to_lowercase();
    if lower.contains("unauthorized")
        || lower.contains("authentication required")
        || lower.contains("denied")
    {
        ImageError::AuthenticationFailed(stderr.to_string())
    } else if lower.contains("not found") || lower.contains("manifest unknown") {
        ImageError::NotFound(stderr.to_string())
    } else {
        ImageError::PullFailed(stderr.to_string())
    }
}

#[async_trait]
impl ImageOps for CliRuntime {
    async fn pull_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), ImageError> {
        if let Some(auth) = auth {
            self.login(auth).await?;
        }

        let output = self
            .run(&["pull".to_string(), reference.to_string()])
            .await
            .map_err(ImageError::Runtime)?;
        if !output.status.success() {
            return Err(classify_pull_error(&stderr_of(&output)));
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerOps for CliRuntime {
    async fn run_detached(&self, spec: &ContainerSpec) -> Result<ContainerId, ContainerError> {
        let output = self
            .run(&create_args(spec))
            .await
            .map_err(ContainerError::Runtime)?;
        if !output.status.success() {
            return Err(classify_container_error(&stderr_of(&output)));
        }

        let id = String::from_utf8_lossy(&output.stdout)
            .lines()
            .last()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ContainerError::Runtime("create printed no container id".to_string()))?;
        let id = ContainerId::new(id);

        let started = self.run(&["start".to_string(), id.to_string()]).await;
        let failure = match started {
            Ok(output) if output.status.success() => return Ok(id),
            Ok(output) => classify_container_error(&stderr_of(&output)),
            Err(e) => ContainerError::Runtime(e),
        };

        self.remove_forced(&id).await;
        Err(failure)
    }

    async fn list_by_name(&self, name: &InstanceName) -> Result<Vec<ContainerId>, ContainerError> {
        let output = self
            .run(&list_args(name))
            .await
            .map_err(ContainerError::Runtime)?;
        if !output.status.success() {
            return Err(ContainerError::Runtime(stderr_of(&output)));
        }
        Ok(parse_list_output(
            &String::from_utf8_lossy(&output.stdout),
            name,
        ))
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        grace: Duration,
    ) -> Result<(), ContainerError> {
        let args = vec![
            "stop".to_string(),
            "--time".to_string(),
            grace.as_secs().to_string(),
            id.to_string(),
        ];
        let output = self.run(&args).await.map_err(ContainerError::Runtime)?;
        if !output.status.success() {
            return Err(classify_container_error(&stderr_of(&output)));
        }
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let output = self
            .run(&["rm".to_string(), id.to_string()])
            .await
            .map_err(ContainerError::Runtime)?;
        if !output.status.success() {
            return Err(classify_container_error(&stderr_of(&output)));
        }
        Ok(())
    }

    async fn rename_container(
        &self,
        id: &ContainerId,
        new_name: &InstanceName,
    ) -> Result<(), ContainerError> {
        let output = self
            .run(&["rename".to_string(), id.to_string(), new_name.to_string()])
            .await
            .map_err(ContainerError::Runtime)?;
        if !output.status.success() {
            return Err(classify_container_error(&stderr_of(&output)));
        }
        Ok(())
    }
}

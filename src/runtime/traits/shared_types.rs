// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ContainerSpec, PortMapping, VolumeMount, RestartPolicyConfig, RegistryAuth.

use crate::types::{ImageRef, InstanceName};
use std::collections::HashMap;
use std::fmt;

/// Everything needed to start one detached instance.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    /// Name for the container.
    pub name: InstanceName,
    /// Image to run.
    pub image: ImageRef,
    /// Environment variables.
    pub env: HashMap<String, String>,
    /// Labels to apply.
    pub labels: HashMap<String, String>,
    /// Published ports.
    pub ports: Vec<PortMapping>,
    /// Bind mounts.
    pub volumes: Vec<VolumeMount>,
    /// Command to run (overrides image CMD).
    pub command: Option<Vec<String>>,
    /// Restart policy.
    pub restart_policy: RestartPolicyConfig,
}

/// Port mapping configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    /// Host port; `None` publishes on an ephemeral port.
    pub host_port: Option<u16>,
    /// Container port.
    pub container_port: u16,
    pub protocol: Protocol,
    /// Host IP to bind to.
    pub host_ip: Option<String>,
}

impl PortMapping {
    /// `80/tcp` style key used by the Engine API.
    pub fn container_key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol)
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref ip) = self.host_ip {
            write!(f, "{}:", ip)?;
        }
        if let Some(host_port) = self.host_port {
            write!(f, "{}:", host_port)?;
        }
        write!(f, "{}/{}", self.container_port, self.protocol)
    }
}

/// Network protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

/// Volume mount configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    /// Source path or volume name.
    pub source: String,
    /// Target path in container.
    pub target: String,
    pub read_only: bool,
}

impl fmt::Display for VolumeMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.target)?;
        if self.read_only {
            write!(f, ":ro")?;
        }
        Ok(())
    }
}

/// Restart policy as the runtime understands it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RestartPolicyConfig {
    No,
    Always,
    #[default]
    UnlessStopped,
    OnFailure { max_retries: Option<u32> },
}

impl fmt::Display for RestartPolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartPolicyConfig::No => write!(f, "no"),
            RestartPolicyConfig::Always => write!(f, "always"),
            RestartPolicyConfig::UnlessStopped => write!(f, "unless-stopped"),
            RestartPolicyConfig::OnFailure { max_retries: None } => write!(f, "on-failure"),
            RestartPolicyConfig::OnFailure {
                max_retries: Some(n),
            } => write!(f, "on-failure:{}", n),
        }
    }
}

/// Registry authentication credentials.
#[derive(Clone)]
pub struct RegistryAuth {
    pub username: String,
    pub password: String,
    /// Registry server (e.g., "ghcr.io").
    pub server: Option<String>,
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("server", &self.server)
            .finish()
    }
}

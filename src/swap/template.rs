// ABOUTME: Blueprint for the instances a swap starts.
// ABOUTME: Resolved once from config; stamped with name, image and ownership labels per swap.

use crate::config::{Config, resolve_env_map};
use crate::error::Result;
use crate::runtime::{ContainerSpec, PortMapping, RestartPolicyConfig, VolumeMount};
use crate::types::{ImageRef, InstanceName};
use std::collections::HashMap;

pub const LABEL_MANAGED: &str = "swapd.managed";
pub const LABEL_BASE: &str = "swapd.base";

#[derive(Debug, Clone, Default)]
pub struct ContainerTemplate {
    pub restart_policy: RestartPolicyConfig,
    pub ports: Vec<PortMapping>,
    pub volumes: Vec<VolumeMount>,
    pub env: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub command: Option<Vec<String>>,
}

impl ContainerTemplate {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            restart_policy: config.container.restart.clone(),
            ports: config.port_mappings()?,
            volumes: config.volume_mounts()?,
            env: resolve_env_map(&config.container.env)?,
            labels: config.container.labels.clone(),
            command: config.container.command.clone(),
        })
    }

    /// Spec for an instance of `image` named `name`, owned by `base_name`.
    pub fn spec(&self, name: &InstanceName, image: &ImageRef, base_name: &InstanceName) -> ContainerSpec {
        let mut labels = self.labels.clone();
        labels.insert(LABEL_MANAGED.to_string(), "true".to_string());
        labels.insert(LABEL_BASE.to_string(), base_name.to_string());

        ContainerSpec {
            name: name.clone(),
            image: image.clone(),
            env: self.env.clone(),
            labels,
            ports: self.ports.clone(),
            volumes: self.volumes.clone(),
            command: self.command.clone(),
            restart_policy: self.restart_policy.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_carries_ownership_labels() {
        let mut template = ContainerTemplate::default();
        template
            .labels
            .insert(LABEL_MANAGED.to_string(), "false".to_string());
        template.labels.insert("team".to_string(), "web".to_string());

        let base = InstanceName::new("app").unwrap();
        let tmp = InstanceName::new("app_20240101120000000000_a1b2c3").unwrap();
        let image = ImageRef::parse("registry.example.com/team/app:v2").unwrap();
        let spec = template.spec(&tmp, &image, &base);

        assert_eq!(spec.name, tmp);
        assert_eq!(spec.labels.get(LABEL_MANAGED).map(String::as_str), Some("true"));
        assert_eq!(spec.labels.get(LABEL_BASE).map(String::as_str), Some("app"));
        assert_eq!(spec.labels.get("team").map(String::as_str), Some("web"));
    }
}

// ABOUTME: Nested sections of the daemon config: notify, runtime and container.
// ABOUTME: Each section carries its own defaults so it can be omitted entirely.

use super::deserialize::deserialize_runtime_type;
use super::env_value::EnvValue;
use super::restart_policy::deserialize_restart_policy;
use crate::runtime::{Backend, RestartPolicyConfig, RuntimeConfig, RuntimeType};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const CLIENT_TIMEOUT_SLACK: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    pub url: EnvValue,

    #[serde(default = "default_notify_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

pub(crate) fn default_notify_timeout() -> Duration {
    Duration::from_secs(5)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeSection {
    #[serde(default)]
    pub backend: Backend,

    #[serde(default, deserialize_with = "deserialize_runtime_type")]
    pub runtime: Option<RuntimeType>,

    #[serde(default)]
    pub socket: Option<String>,

    /// Executable for the cli backend; defaults to the runtime's name.
    #[serde(default)]
    pub binary: Option<String>,

    #[serde(default = "default_pull_timeout", with = "humantime_serde")]
    pub pull_timeout: Duration,

    #[serde(default = "default_call_timeout", with = "humantime_serde")]
    pub call_timeout: Duration,

    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,

    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            runtime: None,
            socket: None,
            binary: None,
            pull_timeout: default_pull_timeout(),
            call_timeout: default_call_timeout(),
            stop_timeout: default_stop_timeout(),
            auth: None,
        }
    }
}

impl RuntimeSection {
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            runtime: self.runtime,
            socket: self.socket.clone(),
            client_timeout: Some(self.client_timeout()),
        }
    }

    /// Longest single exchange the engine client must allow: a whole pull,
    /// or a stop that uses its full grace period, plus slack.
    pub fn client_timeout(&self) -> Duration {
        self.pull_timeout
            .max(self.call_timeout.saturating_add(self.stop_timeout))
            .saturating_add(CLIENT_TIMEOUT_SLACK)
    }
}

fn default_pull_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_call_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Registry credentials used for pulls.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: EnvValue,
    #[serde(default)]
    pub server: Option<String>,
}

/// How new instances are created.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerSection {
    #[serde(default, deserialize_with = "deserialize_restart_policy")]
    pub restart: RestartPolicyConfig,

    #[serde(default)]
    pub ports: Vec<String>,

    #[serde(default)]
    pub volumes: Vec<String>,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    #[serde(default)]
    pub command: Option<Vec<String>>,
}

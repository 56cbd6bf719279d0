// ABOUTME: Configuration types and parsing for swapd.yml.
// ABOUTME: Handles YAML parsing, env var interpolation, discovery and validation.

mod deserialize;
mod env_value;
mod init;
mod ports;
mod restart_policy;
mod sections;

pub use env_value::{EnvValue, resolve_env_map};
pub use init::init_config;
pub use ports::{parse_port_mapping, parse_volume_mount};
pub use restart_policy::parse_restart_policy;
pub use sections::{AuthConfig, ContainerSection, NotifyConfig, RuntimeSection};

use sections::default_notify_timeout;

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::runtime::{PortMapping, RegistryAuth, VolumeMount};
use deserialize::deserialize_prefixes;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "swapd.yml";
pub const CONFIG_FILENAME_ALT: &str = "swapd.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".swapd/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Shared secret every trigger must present.
    pub secret: EnvValue,

    /// Image references must start with one of these.
    #[serde(deserialize_with = "deserialize_prefixes")]
    pub allowed_prefixes: NonEmpty<String>,

    /// Where the swap settings persist; in memory when absent.
    #[serde(default)]
    pub state_file: Option<PathBuf>,

    #[serde(default)]
    pub notify: Option<NotifyConfig>,

    #[serde(default)]
    pub runtime: RuntimeSection,

    #[serde(default)]
    pub container: ContainerSection,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9000))
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "using config file");
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Load `path` when given, otherwise discover in the working directory.
    pub fn locate(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::discover(&std::env::current_dir()?),
        }
    }

    /// Check everything serde cannot, collecting non-fatal findings.
    pub fn validate(&self, diagnostics: &mut Diagnostics) -> Result<()> {
        self.secret()?;
        self.port_mappings()?;
        self.volume_mounts()?;
        self.registry_auth()?;
        self.notify_url()?;
        resolve_env_map(&self.container.env)?;

        if self.runtime.call_timeout.is_zero() || self.runtime.pull_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "runtime timeouts must be greater than zero".to_string(),
            ));
        }

        if self.has_host_port_bindings() {
            diagnostics.warn(Warning::host_port_binding(format!(
                "container ports {:?} bind fixed host ports; the old and new instance both \
                 claim them while the swap stabilizes, so starting the new one may fail",
                self.container.ports
            )));
        }

        Ok(())
    }

    pub fn secret(&self) -> Result<String> {
        self.secret.resolve_non_empty("secret")
    }

    pub fn notify_url(&self) -> Result<Option<String>> {
        self.notify
            .as_ref()
            .map(|n| n.url.resolve_non_empty("notify.url"))
            .transpose()
    }

    pub fn notify_timeout(&self) -> Duration {
        self.notify
            .as_ref()
            .map(|n| n.timeout)
            .unwrap_or_else(default_notify_timeout)
    }

    /// Directory holding per-base-name swap locks, beside the state file.
    ///
    /// Without a state file there is no shared place for them.
    pub fn lock_dir(&self) -> Option<PathBuf> {
        self.state_file
            .as_deref()
            .map(|file| file.parent().unwrap_or(Path::new("")).join("locks"))
    }

    pub fn registry_auth(&self) -> Result<Option<RegistryAuth>> {
        self.runtime
            .auth
            .as_ref()
            .map(|a| {
                Ok(RegistryAuth {
                    username: a.username.clone(),
                    password: a.password.resolve()?,
                    server: a.server.clone(),
                })
            })
            .transpose()
    }

    pub fn port_mappings(&self) -> Result<Vec<PortMapping>> {
        self.container
            .ports
            .iter()
            .map(|p| parse_port_mapping(p))
            .collect()
    }

    pub fn volume_mounts(&self) -> Result<Vec<VolumeMount>> {
        self.container
            .volumes
            .iter()
            .map(|v| parse_volume_mount(v))
            .collect()
    }

    /// Whether any published port names a fixed host port.
    pub fn has_host_port_bindings(&self) -> bool {
        self.container
            .ports
            .iter()
            .filter_map(|p| parse_port_mapping(p).ok())
            .any(|p| p.host_port.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::WarningKind;

    const MINIMAL: &str = r#"
secret: abc
allowed_prefixes:
  - registry.example.com/team/
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.listen, "0.0.0.0:9000".parse().unwrap());
        assert!(config.state_file.is_none());
        assert!(config.notify.is_none());
        assert_eq!(config.runtime.call_timeout.as_secs(), 60);
        assert_eq!(config.runtime.pull_timeout.as_secs(), 600);
        assert_eq!(config.runtime.stop_timeout.as_secs(), 10);
        assert_eq!(config.allowed_prefixes.first(), "registry.example.com/team/");
    }

    #[test]
    fn lock_dir_sits_beside_the_state_file() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert!(config.lock_dir().is_none());

        let yaml = format!("{}state_file: /var/lib/swapd/settings.json\n", MINIMAL);
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(
            config.lock_dir(),
            Some(PathBuf::from("/var/lib/swapd/locks"))
        );
    }

    #[test]
    fn notify_timeout_defaults_without_a_notify_section() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.notify_timeout(), Duration::from_secs(5));

        let yaml = format!("{}notify:\n  url: https://hooks.example.com/x\n  timeout: 12s\n", MINIMAL);
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.notify_timeout(), Duration::from_secs(12));
    }

    #[test]
    fn engine_client_outlasts_a_full_stop_grace_period() {
        let yaml = format!("{}runtime:\n  call_timeout: 60s\n  stop_timeout: 5m\n", MINIMAL);
        let config = Config::from_yaml(&yaml).unwrap();

        let timeout = config.runtime.runtime_config().client_timeout();
        assert!(timeout > Duration::from_secs(360), "{:?}", timeout);
        assert!(timeout >= config.runtime.pull_timeout);
    }

    #[test]
    fn empty_prefix_list_is_rejected() {
        let yaml = "secret: abc\nallowed_prefixes: []\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn blank_secret_fails_validation() {
        let yaml = "secret: ''\nallowed_prefixes: [registry.example.com/]\n";
        let config = Config::from_yaml(yaml).unwrap();
        let mut diag = Diagnostics::default();
        assert!(matches!(
            config.validate(&mut diag),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn host_port_binding_warns() {
        let yaml = format!("{}container:\n  ports: [\"8080:80\"]\n", MINIMAL);
        let config = Config::from_yaml(&yaml).unwrap();
        let mut diag = Diagnostics::default();
        config.validate(&mut diag).unwrap();
        assert_eq!(diag.warnings().len(), 1);
        assert_eq!(diag.warnings()[0].kind, WarningKind::HostPortBinding);
    }

    #[test]
    fn ephemeral_ports_do_not_warn() {
        let yaml = format!("{}container:\n  ports: [\"80\"]\n", MINIMAL);
        let config = Config::from_yaml(&yaml).unwrap();
        let mut diag = Diagnostics::default();
        config.validate(&mut diag).unwrap();
        assert!(!diag.has_warnings());
    }

    #[test]
    fn bad_port_fails_validation() {
        let yaml = format!("{}container:\n  ports: [\"eighty\"]\n", MINIMAL);
        let config = Config::from_yaml(&yaml).unwrap();
        let mut diag = Diagnostics::default();
        assert!(config.validate(&mut diag).is_err());
    }

    #[test]
    fn unknown_runtime_is_rejected() {
        let yaml = format!("{}runtime:\n  runtime: containerd\n", MINIMAL);
        assert!(Config::from_yaml(&yaml).is_err());
    }
}

// ABOUTME: Config scaffolding for a new host.
// ABOUTME: Writes a commented swapd.yml template.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

const TEMPLATE: &str = r#"# Address the trigger API listens on.
listen: 0.0.0.0:9000

# Shared secret every deploy request must carry.
secret:
  env: SWAPD_SECRET

# Only images starting with one of these may be deployed.
allowed_prefixes:
  - registry.example.com/team/

# Persist the swap wait across restarts (in memory when omitted).
# state_file: /var/lib/swapd/settings.json

# Alert sink for failed swaps.
# notify:
#   url:
#     env: SWAPD_NOTIFY_URL
#   timeout: 5s

runtime:
  backend: api            # api (engine socket) or cli (docker/podman executable)
  # runtime: docker
  # socket: /var/run/docker.sock
  pull_timeout: 10m
  call_timeout: 60s
  stop_timeout: 10s

container:
  restart: unless-stopped
  # Fixed host ports are bound by both instances during a swap.
  ports:
    - "80"
  env: {}
  labels: {}
"#;

/// Write the template into `dir`, returning the path written.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, TEMPLATE)?;

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn template_parses() {
        temp_env::with_var("SWAPD_SECRET", Some("s3cret"), || {
            let config = Config::from_yaml(TEMPLATE).unwrap();
            assert_eq!(config.secret().unwrap(), "s3cret");
            assert!(!config.has_host_port_bindings());
        });
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), false).unwrap();
        assert!(matches!(
            init_config(dir.path(), false),
            Err(Error::AlreadyExists(_))
        ));
        init_config(dir.path(), true).unwrap();
    }
}

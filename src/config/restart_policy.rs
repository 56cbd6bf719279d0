// ABOUTME: Restart policy parsing for the container section.
// ABOUTME: Accepts no, always, unless-stopped and on-failure[:max-retries].

use crate::runtime::RestartPolicyConfig;
use serde::de::{self, Deserialize, Deserializer};

pub fn parse_restart_policy(s: &str) -> Result<RestartPolicyConfig, String> {
    match s {
        "no" => Ok(RestartPolicyConfig::No),
        "always" => Ok(RestartPolicyConfig::Always),
        "unless-stopped" => Ok(RestartPolicyConfig::UnlessStopped),
        "on-failure" => Ok(RestartPolicyConfig::OnFailure { max_retries: None }),
        s if s.starts_with("on-failure:") => {
            let retries_str = &s["on-failure:".len()..];
            let retries = retries_str
                .parse::<u32>()
                .map_err(|_| format!("invalid max retries: {}", retries_str))?;
            Ok(RestartPolicyConfig::OnFailure {
                max_retries: Some(retries),
            })
        }
        _ => Err(format!("unknown restart policy: {}", s)),
    }
}

pub fn deserialize_restart_policy<'de, D>(deserializer: D) -> Result<RestartPolicyConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_restart_policy(&s).map_err(de::Error::custom)
}

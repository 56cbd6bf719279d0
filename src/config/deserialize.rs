// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles the allowed-prefix list and optional runtime overrides.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::runtime::RuntimeType;

pub fn deserialize_prefixes<'de, D>(deserializer: D) -> Result<NonEmpty<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    if let Some(blank) = values.iter().find(|p| p.trim().is_empty()) {
        return Err(serde::de::Error::custom(format!(
            "allowed prefix cannot be blank: {:?}",
            blank
        )));
    }

    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one allowed prefix is required"))
}

pub fn deserialize_runtime_type<'de, D>(deserializer: D) -> Result<Option<RuntimeType>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref() {
        None => Ok(None),
        Some("docker") => Ok(Some(RuntimeType::Docker)),
        Some("podman") => Ok(Some(RuntimeType::Podman)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "unknown runtime: {} (expected docker or podman)",
            other
        ))),
    }
}

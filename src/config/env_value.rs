// ABOUTME: Configuration values that may be read from the environment.
// ABOUTME: Either a literal string or {env: VAR, default: ...}, resolved at load time.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }

    /// Resolve, rejecting a value that is empty after trimming.
    pub fn resolve_non_empty(&self, field: &str) -> Result<String> {
        let value = self.resolve()?;
        if value.trim().is_empty() {
            return Err(Error::InvalidConfig(format!("{} cannot be empty", field)));
        }
        Ok(value)
    }
}

// Values here are often secrets; only the variable name is printed.
impl fmt::Debug for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Literal(_) => f.write_str("EnvValue::Literal(<redacted>)"),
            EnvValue::FromEnv { var, .. } => write!(f, "EnvValue::FromEnv({})", var),
        }
    }
}

pub fn resolve_env_map(map: &HashMap<String, EnvValue>) -> Result<HashMap<String, String>> {
    map.iter()
        .map(|(k, v)| v.resolve().map(|resolved| (k.clone(), resolved)))
        .collect()
}

// ABOUTME: Runtime-assigned container identifier.
// ABOUTME: Kept distinct from container names so the two cannot be swapped by accident.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the container runtime assigned to an instance.
///
/// Names are mutable (a rename moves them between instances), ids are not.
/// The orchestrator always addresses instances by id once it has one.
#[must_use = "IDs reference resources and should not be ignored"]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First twelve characters, the form `docker ps` prints.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

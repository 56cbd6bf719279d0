// ABOUTME: Diagnostics accumulator for non-fatal warnings.
// ABOUTME: Config findings at startup and retirement failures during a swap.

/// Collects non-fatal warnings.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn host_port_binding(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::HostPortBinding,
            message: message.into(),
        }
    }

    pub fn list_failed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ListFailed,
            message: message.into(),
        }
    }

    pub fn stop_failed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::StopFailed,
            message: message.into(),
        }
    }

    pub fn remove_failed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RemoveFailed,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A fixed host port is published; both instances claim it mid-swap.
    HostPortBinding,
    /// Listing the instances to retire failed.
    ListFailed,
    /// An old instance could not be stopped.
    StopFailed,
    /// An old instance could not be removed.
    RemoveFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings_in_order() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::stop_failed("abc: timed out"));
        diag.warn(Warning::remove_failed("abc: still running"));

        let kinds: Vec<_> = diag.into_warnings().into_iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![WarningKind::StopFailed, WarningKind::RemoveFailed]);
    }
}

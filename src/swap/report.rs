// ABOUTME: What happened to the old instances during retirement.
// ABOUTME: Individual failures are recorded here instead of aborting the swap.

use crate::diagnostics::{Diagnostics, Warning};
use crate::types::ContainerId;

#[derive(Debug, Clone, Default)]
pub struct RetirementReport {
    /// Instances stopped and removed (or found already gone).
    pub retired: Vec<ContainerId>,
    /// Failures that did not stop the swap.
    pub warnings: Vec<Warning>,
}

impl RetirementReport {
    pub(crate) fn new(retired: Vec<ContainerId>, diagnostics: Diagnostics) -> Self {
        Self {
            retired,
            warnings: diagnostics.into_warnings(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

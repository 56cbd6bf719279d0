// ABOUTME: Swap state marker types for the type state pattern.
// ABOUTME: States carry the data that exists only once the swap has reached them.

use super::report::RetirementReport;
use crate::types::ContainerId;
use serde::Serialize;
use std::fmt;

/// Nothing done yet.
/// Available actions: `pull()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Pending;

/// Image present locally.
/// Available actions: `start()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Pulled;

/// New instance running under its temporary name.
/// Available actions: `stabilize()`
#[derive(Debug, Clone)]
pub struct Started {
    pub(crate) container: ContainerId,
}

/// Stabilization wait over; old and new instance both running.
/// Available actions: `retire_old()`
#[derive(Debug, Clone)]
pub struct Stabilized {
    pub(crate) container: ContainerId,
}

/// Old instances stopped and removed, as far as that succeeded.
/// Available actions: `promote()`
#[derive(Debug, Clone)]
pub struct Retired {
    pub(crate) container: ContainerId,
    pub(crate) report: RetirementReport,
}

/// New instance holds the production name.
/// Available actions: `finish()`
#[derive(Debug, Clone)]
pub struct Completed {
    pub(crate) container: ContainerId,
    pub(crate) report: RetirementReport,
}

/// Where a swap is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapPhase {
    Pulling,
    Starting,
    Stabilizing,
    RetiringOld,
    Promoting,
    Completed,
}

impl fmt::Display for SwapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwapPhase::Pulling => "pulling",
            SwapPhase::Starting => "starting",
            SwapPhase::Stabilizing => "stabilizing",
            SwapPhase::RetiringOld => "retiring old",
            SwapPhase::Promoting => "promoting",
            SwapPhase::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// How a swap ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    Succeeded,
    Failed(SwapPhase),
}

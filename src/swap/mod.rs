// ABOUTME: Swap orchestration using the type state pattern.
// ABOUTME: Pull, start under a temporary name, wait, retire the old instance, promote.

mod attempt;
mod error;
mod inflight;
mod orchestrator;
mod report;
mod state;
mod template;
mod transitions;

pub use attempt::Swap;
pub use error::{CallError, SwapError};
pub use inflight::{ClaimError, InFlight, InFlightClaim, LockInfo, SwapInProgress};
pub use orchestrator::{Orchestrator, SpawnScheduler, Timeouts};
pub use report::RetirementReport;
pub use state::{Completed, Pending, Pulled, Retired, Stabilized, Started, SwapOutcome, SwapPhase};
pub use template::{ContainerTemplate, LABEL_BASE, LABEL_MANAGED};
pub use transitions::{SwapSummary, within};

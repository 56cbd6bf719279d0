// ABOUTME: Error types for swap runs.
// ABOUTME: A swap failure names the image, the phase it stopped in and why.

use super::state::{SwapOutcome, SwapPhase};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A swap that ended in `Failed(phase)`.
#[derive(Debug, Clone, Error)]
#[error("swap to {image} failed while {phase}: {message}")]
pub struct SwapError {
    pub image: String,
    pub phase: SwapPhase,
    pub message: String,
}

impl SwapError {
    pub fn new(image: impl fmt::Display, phase: SwapPhase, message: impl Into<String>) -> Self {
        Self {
            image: image.to_string(),
            phase,
            message: message.into(),
        }
    }

    pub fn outcome(&self) -> SwapOutcome {
        SwapOutcome::Failed(self.phase)
    }
}

/// Failure of one bounded runtime call.
#[derive(Debug, Error)]
pub enum CallError<E> {
    #[error("{0}")]
    Failed(E),

    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

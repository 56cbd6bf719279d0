// ABOUTME: Output formatting for one-shot CLI commands.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use crate::swap::{SwapError, SwapOutcome, SwapPhase, SwapSummary};
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// One JSON object per event, for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration_secs(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Report a finished swap.
    pub fn swap_succeeded(&self, summary: &SwapSummary) {
        match self.mode {
            OutputMode::Normal => {
                println!(
                    "Swapped {} to {} (container {}, {} old instance(s) retired) ({:.1}s)",
                    summary.base_name,
                    summary.image,
                    summary.container.short(),
                    summary.retired.len(),
                    self.elapsed_secs()
                );
                for warning in &summary.warnings {
                    println!("  warning: {warning}");
                }
            }
            OutputMode::Quiet => println!("{}", summary.container),
            OutputMode::Json => emit(&SwapEvent::new(
                SwapOutcome::Succeeded,
                None,
                Some(summary),
                self.duration_secs(),
            )),
        }
    }

    /// Report a failed swap.
    pub fn swap_failed(&self, error: &SwapError) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {error}"),
            OutputMode::Json => emit(&SwapEvent::new(
                error.outcome(),
                Some(error.to_string()),
                None,
                self.duration_secs(),
            )),
        }
    }
}

fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

#[derive(Serialize)]
struct SwapEvent<'a> {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phase: Option<SwapPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a SwapSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

impl<'a> SwapEvent<'a> {
    fn new(
        outcome: SwapOutcome,
        message: Option<String>,
        summary: Option<&'a SwapSummary>,
        duration_secs: Option<f64>,
    ) -> Self {
        let (outcome, phase) = match outcome {
            SwapOutcome::Succeeded => ("succeeded", None),
            SwapOutcome::Failed(phase) => ("failed", Some(phase)),
        };
        Self {
            outcome,
            phase,
            message,
            summary,
            duration_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_event_names_phase() {
        let event = SwapEvent::new(
            SwapOutcome::Failed(SwapPhase::Promoting),
            Some("rename failed".to_string()),
            None,
            None,
        );
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["phase"], "promoting");
        assert_eq!(json["message"], "rename failed");
    }

    #[test]
    fn succeeded_event_has_no_phase() {
        let event = SwapEvent::new(SwapOutcome::Succeeded, None, None, Some(1.5));
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["outcome"], "succeeded");
        assert!(json.get("phase").is_none());
    }
}

// ABOUTME: Best-effort alerts for failed swaps.
// ABOUTME: A notifier never fails its caller; delivery problems are only logged.

mod webhook;

pub use webhook::WebhookNotifier;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a notification did not arrive. Logged, never returned to callers.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("notification sink answered {0}")]
    Rejected(reqwest::StatusCode),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message`, swallowing any failure.
    async fn notify(&self, message: &str);
}

/// Writes alerts to the log only; used when no sink is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) {
        tracing::error!(target: "swapd::notify", "{}", message);
    }
}

/// Webhook notifier for `url`, or the log-only one when there is none.
pub fn from_url(url: Option<String>, timeout: Duration) -> Result<Arc<dyn Notifier>, NotifyError> {
    match url {
        Some(url) => Ok(Arc::new(WebhookNotifier::new(url, timeout)?)),
        None => Ok(Arc::new(LogNotifier)),
    }
}

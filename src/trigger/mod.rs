// ABOUTME: Deployment trigger: authenticate, check the whitelist, schedule a swap.
// ABOUTME: Validation is synchronous; the swap itself runs detached.

mod secret;

pub use secret::SharedSecret;

use crate::swap::{ClaimError, InFlight, InFlightClaim, SwapInProgress};
use crate::types::{ImageRef, InstanceName};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Body of a deploy request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    pub secret: String,
    pub image_reference: String,
}

/// Returned as soon as a swap is scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Acknowledgment {
    pub status: &'static str,
    pub image_reference: String,
    pub base_name: String,
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("authentication failed")]
    Authentication,

    #[error("image {0} is not in an allowed registry path")]
    ImageNotAllowed(String),

    #[error("invalid image reference {reference}: {reason}")]
    InvalidImage { reference: String, reason: String },

    #[error(transparent)]
    InProgress(#[from] SwapInProgress),

    #[error("{0}")]
    Lock(String),
}

impl From<ClaimError> for TriggerError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::InProgress(e) => TriggerError::InProgress(e),
            other @ ClaimError::Lock { .. } => TriggerError::Lock(other.to_string()),
        }
    }
}

/// A swap ready to run, holding its base name's claim.
#[derive(Debug)]
pub struct SwapJob {
    pub image: ImageRef,
    pub base_name: InstanceName,
    pub claim: InFlightClaim,
}

/// Hands accepted swaps to whatever runs them.
///
/// `schedule` must return without waiting for the swap.
pub trait SwapScheduler: Send + Sync {
    fn schedule(&self, job: SwapJob);
}

pub struct Trigger {
    secret: SharedSecret,
    allowed_prefixes: Vec<String>,
    inflight: InFlight,
    scheduler: Arc<dyn SwapScheduler>,
}

impl Trigger {
    pub fn new(
        secret: SharedSecret,
        allowed_prefixes: impl IntoIterator<Item = String>,
        inflight: InFlight,
        scheduler: Arc<dyn SwapScheduler>,
    ) -> Self {
        Self {
            secret,
            allowed_prefixes: allowed_prefixes.into_iter().collect(),
            inflight,
            scheduler,
        }
    }

    pub fn verify_secret(&self, candidate: &str) -> Result<(), TriggerError> {
        if self.secret.verify(candidate) {
            Ok(())
        } else {
            Err(TriggerError::Authentication)
        }
    }

    pub fn is_allowed(&self, reference: &str) -> bool {
        self.allowed_prefixes
            .iter()
            .any(|prefix| reference.starts_with(prefix.as_str()))
    }

    /// Validate `request` and schedule its swap.
    ///
    /// Checks run in order: secret, whitelist, reference syntax, in-flight
    /// claim. Nothing is scheduled unless all pass.
    pub fn accept(&self, request: TriggerRequest) -> Result<Acknowledgment, TriggerError> {
        self.verify_secret(&request.secret)?;

        let reference = request.image_reference.trim();
        if !self.is_allowed(reference) {
            tracing::warn!(image = %reference, "rejected image outside allowed prefixes");
            return Err(TriggerError::ImageNotAllowed(reference.to_string()));
        }

        let invalid = |reason: String| TriggerError::InvalidImage {
            reference: reference.to_string(),
            reason,
        };
        let image = ImageRef::parse(reference).map_err(|e| invalid(e.to_string()))?;
        let base_name = InstanceName::base_of(&image).map_err(|e| invalid(e.to_string()))?;

        let claim = self.inflight.claim(&base_name)?;

        let ack = Acknowledgment {
            status: "accepted",
            image_reference: image.to_string(),
            base_name: base_name.to_string(),
        };

        tracing::info!(image = %image, base_name = %base_name, "swap scheduled");
        self.scheduler.schedule(SwapJob {
            image,
            base_name,
            claim,
        });

        Ok(ack)
    }
}

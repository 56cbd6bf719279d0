// ABOUTME: Generic swap struct parameterized by state marker.
// ABOUTME: Holds what every phase needs: image, base name, temporary name and start time.

use super::state::Pending;
use crate::types::{ImageRef, InstanceName};
use chrono::{DateTime, Utc};

/// One swap in progress, parameterized by its current state.
///
/// Transitions consume the swap and return it in the next state, so a step
/// cannot be skipped or repeated. State-specific data (the new container's
/// id, the retirement report) lives in the state type.
#[derive(Debug)]
pub struct Swap<S> {
    pub(crate) image: ImageRef,
    pub(crate) base_name: InstanceName,
    pub(crate) temporary: InstanceName,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) state: S,
}

impl Swap<Pending> {
    /// Begin a swap of `base_name` to `image` with a fresh temporary name.
    pub fn new(image: ImageRef, base_name: InstanceName) -> Self {
        let temporary = base_name.temporary();
        Self::with_temporary(image, base_name, temporary)
    }

    pub fn with_temporary(image: ImageRef, base_name: InstanceName, temporary: InstanceName) -> Self {
        Swap {
            image,
            base_name,
            temporary,
            started_at: Utc::now(),
            state: Pending,
        }
    }
}

impl<S> Swap<S> {
    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn base_name(&self) -> &InstanceName {
        &self.base_name
    }

    pub fn temporary(&self) -> &InstanceName {
        &self.temporary
    }

    pub(crate) fn transition<T>(self, state: T) -> Swap<T> {
        Swap {
            image: self.image,
            base_name: self.base_name,
            temporary: self.temporary,
            started_at: self.started_at,
            state,
        }
    }
}

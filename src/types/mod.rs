// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: Image references, instance names and runtime-assigned ids.

mod id;
mod image_ref;
mod instance_name;

pub use id::ContainerId;
pub use image_ref::{ImageRef, ParseImageRefError};
pub use instance_name::{InstanceName, InstanceNameError};

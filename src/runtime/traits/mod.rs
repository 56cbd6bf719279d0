// ABOUTME: Composable capability traits for container runtimes.
// ABOUTME: Defines ImageOps and ContainerOps plus the FullRuntime union.

mod container;
mod image;
mod shared_types;

pub use container::{ContainerError, ContainerOps};
pub use image::{ImageError, ImageOps};
pub use shared_types::*;

/// A runtime offering every capability the swap needs.
///
/// Implemented automatically for anything that implements the parts, so the
/// daemon can hold a backend chosen at startup as `Arc<dyn FullRuntime>`.
pub trait FullRuntime: ImageOps + ContainerOps {}

impl<T: ImageOps + ContainerOps + ?Sized> FullRuntime for T {}

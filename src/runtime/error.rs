// ABOUTME: Runtime connection error types with SNAFU pattern.
// ABOUTME: Unifies detection and connection errors for programmatic handling.

use snafu::Snafu;

use super::detection::DetectionError;

/// Failure to obtain a usable runtime backend at startup.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RuntimeError {
    #[snafu(display("runtime detection failed: {source}"))]
    Detection { source: DetectionError },

    #[snafu(display("runtime connection failed: {message}"))]
    Connection { message: String },

    #[snafu(display("runtime executable {binary} unusable: {message}"))]
    Executable { binary: String, message: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// No container runtime found on the system.
    NoRuntimeFound,
    /// Failed to connect to the runtime socket.
    ConnectionFailed,
    /// The CLI backend's executable is missing or broken.
    ExecutableFailed,
}

impl RuntimeError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::Detection { .. } => RuntimeErrorKind::NoRuntimeFound,
            RuntimeError::Connection { .. } => RuntimeErrorKind::ConnectionFailed,
            RuntimeError::Executable { .. } => RuntimeErrorKind::ExecutableFailed,
        }
    }
}

impl From<DetectionError> for RuntimeError {
    fn from(source: DetectionError) -> Self {
        RuntimeError::Detection { source }
    }
}

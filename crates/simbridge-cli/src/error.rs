//! Shim-side error taxonomy and exit-code mapping.

use simbridge_core::merge::ConfigError;
use simbridge_core::outputs::CollectError;
use simbridge_core::process::LaunchError;
use simbridge_core::toolchain::ToolchainError;
use simbridge_core::unpack::ResourceError;
use thiserror::Error;

/// Any failure of the shim itself, as opposed to a test failure reported by
/// the engine (which is passed through as the exit code, not an error).
#[derive(Error, Debug)]
pub enum ShimError {
    /// A required input was missing or invalid.
    #[error("{0}")]
    Usage(String),

    /// A configuration source was missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An embedded engine payload was missing (packaging defect).
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// The engine process could not be started or supervised.
    #[error(transparent)]
    Launch(#[from] LaunchError),

    /// Result artifacts were missing or could not be relocated.
    #[error(transparent)]
    Collect(#[from] CollectError),

    /// The host toolchain could not be located.
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    /// Some other I/O failure in the shim.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShimError {
    /// Exit codes reserved for shim failures, distinct per failure class and
    /// disjoint from the small codes the engine uses for test results.
    pub fn exit_code(&self) -> i32 {
        match self {
            ShimError::Usage(_) => 64,
            ShimError::Config(_) => 65,
            ShimError::Resource(_) => 66,
            ShimError::Launch(_) => 67,
            ShimError::Collect(_) => 68,
            ShimError::Toolchain(_) => 69,
            ShimError::Io(_) => 70,
        }
    }
}

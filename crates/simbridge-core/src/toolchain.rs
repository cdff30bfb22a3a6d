//! Discovering the host Xcode Developer directory.
//!
//! The engine needs the toolchain root, and that value cannot come from any
//! config source: it is a property of the host. `DEVELOPER_DIR` is honored
//! when set, matching `xcode-select` behavior; otherwise `xcrun --find
//! simctl` reports the simctl binary inside the active Developer directory,
//! and stripping the known `/usr/bin/simctl` suffix recovers the root.

use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

const SIMCTL_SUFFIX: &str = "/usr/bin/simctl";

/// Errors from querying the host toolchain.
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// `xcrun` could not be executed at all.
    #[error("failed to run xcrun: {0}")]
    Io(#[from] std::io::Error),

    /// `xcrun --find simctl` returned a non-zero exit code.
    #[error("xcrun --find simctl failed: {0}")]
    CommandFailed(String),

    /// The reported simctl path did not have the expected shape.
    #[error("unexpected simctl path: {0}")]
    UnexpectedPath(String),
}

/// Resolve the active Developer directory: `DEVELOPER_DIR` when set,
/// otherwise the host toolchain locator.
pub fn developer_dir() -> Result<PathBuf, ToolchainError> {
    if let Some(dir) = std::env::var_os("DEVELOPER_DIR") {
        return Ok(PathBuf::from(dir));
    }

    let output = Command::new("xcrun").args(["--find", "simctl"]).output()?;

    if !output.status.success() {
        return Err(ToolchainError::CommandFailed(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }

    parse_simctl_path(&output.stdout)
}

/// Recover the Developer directory from `xcrun --find simctl` output.
/// Exposed for testing.
pub fn parse_simctl_path(raw: &[u8]) -> Result<PathBuf, ToolchainError> {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    trimmed
        .strip_suffix(SIMCTL_SUFFIX)
        .map(PathBuf::from)
        .ok_or_else(|| ToolchainError::UnexpectedPath(trimmed.to_string()))
}

//! Materializing embedded engine payloads onto disk.
//!
//! The engine binaries ship inside the shim executable (see the CLI crate's
//! payload registry). Before a run they are written to a freshly created,
//! exclusively owned temporary directory with owner-executable permissions.
//! [`UnpackedTools`] owns that directory; dropping it removes the directory
//! on every exit path, including when the engine itself fails.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;

/// Errors from unpacking embedded payloads.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// No payload with the requested name is embedded. Indicates a
    /// packaging defect, not a user error.
    #[error("no embedded payload named {0:?}")]
    Missing(String),

    /// The scoped temporary directory could not be created.
    #[error("failed to create unpack directory: {0}")]
    TempDir(std::io::Error),

    /// Writing or chmodding a payload failed.
    #[error("failed to unpack {name}: {source}")]
    Io {
        name: String,
        source: std::io::Error,
    },
}

/// Registry of embedded payloads by name.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    entries: BTreeMap<&'static str, &'static [u8]>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, bytes: &'static [u8]) {
        self.entries.insert(name, bytes);
    }

    pub fn bytes(&self, name: &str) -> Option<&'static [u8]> {
        self.entries.get(name).copied()
    }
}

/// Unpacked payloads in their scoped directory.
///
/// The directory and everything in it are removed when this value is
/// dropped.
#[derive(Debug)]
pub struct UnpackedTools {
    dir: TempDir,
}

impl UnpackedTools {
    /// Path of the unpacked payload with the given name.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// The scoped directory holding the payloads.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Write each named payload into a fresh temporary directory and mark it
/// owner-executable (mode 0755).
pub fn unpack(registry: &ToolRegistry, names: &[&str]) -> Result<UnpackedTools, ResourceError> {
    let dir = TempDir::with_prefix("simbridge-tools-").map_err(ResourceError::TempDir)?;

    for &name in names {
        let bytes = registry
            .bytes(name)
            .ok_or_else(|| ResourceError::Missing(name.to_string()))?;
        let path = dir.path().join(name);
        write_executable(&path, bytes).map_err(|source| ResourceError::Io {
            name: name.to_string(),
            source,
        })?;
        tracing::debug!(name, path = %path.display(), size = bytes.len(), "unpacked payload");
    }

    Ok(UnpackedTools { dir })
}

fn write_executable(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

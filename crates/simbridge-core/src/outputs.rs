//! Locating and relocating the engine's result artifacts.
//!
//! After a run the engine's output directory holds one or more XML report
//! files and, optionally, profiling output. [`collect`] picks the canonical
//! report, copies it to the build system's declared XML destination and into
//! the declared outputs directory, and copies profiling data (if any) under
//! its canonical name. Files are copied, never moved; the engine's own
//! output directory is left intact.
//!
//! Selection policy: candidates are considered in lexicographic filename
//! order (raw directory order is not stable across platforms, so it is
//! never relied on). The canonical report is the first candidate whose file
//! name contains `FINAL`, matching the engine's naming convention for its
//! aggregated report; if no candidate matches, the first candidate is used.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Canonical name for relocated profiling output.
pub const PROFILE_FILE_NAME: &str = "trace-profile.json";

/// Errors from collecting result artifacts.
#[derive(Error, Debug)]
pub enum CollectError {
    /// The engine produced no XML report at all. The engine is expected to
    /// always write at least one, so this is surfaced instead of silently
    /// reporting an empty run.
    #[error("no XML test reports found in {0}")]
    NoReports(PathBuf),

    /// Listing candidate files failed.
    #[error("failed to list {pattern}: {source}")]
    List {
        pattern: String,
        source: glob::PatternError,
    },

    /// Copying an artifact to its destination failed.
    #[error("failed to copy {src} to {dst}: {source}")]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        source: std::io::Error,
    },
}

/// What [`collect`] copied, for logging.
#[derive(Debug)]
pub struct CollectedOutputs {
    /// The selected canonical report in the source directory.
    pub report: PathBuf,
    /// The selected profiling file in the source directory, if any.
    pub profile: Option<PathBuf>,
}

/// Relocate the engine's artifacts from `source_dir`: the canonical XML
/// report goes to `xml_dest` (overwriting) and into `dest_dir` under its
/// original name; profiling output, when present, goes into `dest_dir` as
/// [`PROFILE_FILE_NAME`]. Missing profiling output is not an error.
pub fn collect(
    source_dir: &Path,
    dest_dir: &Path,
    xml_dest: &Path,
) -> Result<CollectedOutputs, CollectError> {
    let reports = glob_sorted(source_dir, "*.xml")?;
    if reports.is_empty() {
        return Err(CollectError::NoReports(source_dir.to_path_buf()));
    }

    let report = select_report(&reports).clone();
    tracing::debug!(report = %report.display(), "selected canonical report");

    copy(&report, xml_dest)?;
    if let Some(name) = report.file_name() {
        copy(&report, &dest_dir.join(name))?;
    }

    let profile = find_profile(source_dir)?;
    if let Some(profile) = &profile {
        tracing::debug!(profile = %profile.display(), "selected profiling output");
        copy(profile, &dest_dir.join(PROFILE_FILE_NAME))?;
    }

    Ok(CollectedOutputs { report, profile })
}

/// Pick the canonical report from the candidates: the first whose file name
/// contains `FINAL`, else the first candidate. Exposed for testing.
///
/// # Panics
///
/// Panics if `candidates` is empty.
pub fn select_report(candidates: &[PathBuf]) -> &PathBuf {
    candidates
        .iter()
        .find(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().contains("FINAL"))
                .unwrap_or(false)
        })
        .unwrap_or(&candidates[0])
}

fn find_profile(source_dir: &Path) -> Result<Option<PathBuf>, CollectError> {
    let canonical = source_dir.join(PROFILE_FILE_NAME);
    if canonical.exists() {
        return Ok(Some(canonical));
    }
    let stats = glob_sorted(source_dir, "*-stats.json")?;
    Ok(stats.into_iter().next())
}

/// List files matching `pattern` under `dir`, in lexicographic order.
fn glob_sorted(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, CollectError> {
    let pattern = dir.join(pattern).to_string_lossy().into_owned();
    let mut paths: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|source| CollectError::List {
            pattern: pattern.clone(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .collect();
    paths.sort();
    Ok(paths)
}

fn copy(src: &Path, dst: &Path) -> Result<(), CollectError> {
    std::fs::copy(src, dst)
        .map(|_| ())
        .map_err(|source| CollectError::Copy {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            source,
        })
}

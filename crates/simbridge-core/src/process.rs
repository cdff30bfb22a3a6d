//! Running the engine and streaming its output.
//!
//! The engine can run for many minutes; if its output only appeared at
//! process exit, the invoking build system would see silence and assume a
//! hang. [`run`] therefore gives the child's stdout and stderr one shared
//! anonymous pipe (so the merged stream preserves the child's emission
//! order) and forwards each line to our own stdout as it arrives.
//!
//! A non-zero exit code is not an error at this layer: it is returned as
//! data for the caller to interpret. Only a failure to start the child or
//! to read its output is a [`LaunchError`].
//!
//! No timeout is applied here; a hang in the engine propagates as a hang in
//! the shim, and the invoking build system enforces its own deadline.

use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;

/// Errors from launching or supervising the engine process.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The executable could not be started (missing, not executable).
    #[error("failed to launch {path}: {source}")]
    Spawn {
        path: PathBuf,
        source: io::Error,
    },

    /// The merged output pipe could not be set up.
    #[error("failed to set up output pipe: {0}")]
    Pipe(io::Error),

    /// Reading the child's output or waiting for it failed.
    #[error("failed to read engine output: {0}")]
    Stream(io::Error),
}

/// Run `executable` with `args`, echoing each line of its merged
/// stdout/stderr to our stdout as it arrives, and return its exit code.
pub fn run<S: AsRef<OsStr>>(executable: &Path, args: &[S]) -> Result<i32, LaunchError> {
    run_with(executable, args, |line| println!("{line}"))
}

/// [`run`] with a caller-supplied line sink. Exposed so tests can observe
/// forwarding incrementally instead of capturing stdout.
pub fn run_with<S: AsRef<OsStr>>(
    executable: &Path,
    args: &[S],
    mut sink: impl FnMut(&str),
) -> Result<i32, LaunchError> {
    let (reader, writer) = io::pipe().map_err(LaunchError::Pipe)?;
    let writer_clone = writer.try_clone().map_err(LaunchError::Pipe)?;

    tracing::debug!(
        cmd = %executable.display(),
        args = ?args.iter().map(|a| a.as_ref().to_string_lossy().into_owned()).collect::<Vec<_>>(),
        "launching engine"
    );

    let mut child = Command::new(executable)
        .args(args)
        .stdout(writer)
        .stderr(writer_clone)
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            path: executable.to_path_buf(),
            source,
        })?;

    // The child now holds the only write ends; the loop below ends when the
    // child closes them (normally at exit).
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(LaunchError::Stream)?;
        if n == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        sink(line.trim_end_matches(['\r', '\n']));
    }

    let status = child.wait().map_err(LaunchError::Stream)?;
    Ok(exit_code(status))
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    // Terminated by a signal; report it shell-style.
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

//! Errors that can stop the launcher before or while starting the target.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

/// Exit code used when the target script is missing or the launcher cannot
/// locate itself.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code a shell uses when a command exists but cannot be executed.
pub const EXIT_CANNOT_EXECUTE: i32 = 126;

/// Exit code a shell uses when a command cannot be found.
pub const EXIT_NOT_FOUND: i32 = 127;

/// Error returned when launching the target script fails.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// No regular file exists at the expected target path.
    #[error("focus.py not found at {}", path.display())]
    MissingTargetScript {
        /// The path that was checked.
        path: PathBuf,
    },
    /// The path of the running executable could not be determined.
    #[error("could not determine the launcher's own location: {0}")]
    ResolveSelf(#[source] io::Error),
    /// The interpreter process could not be started.
    #[error("could not run {}: {source}", program.to_string_lossy())]
    Spawn {
        /// The interpreter program that was attempted.
        program: OsString,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    /// The process exit code the launcher terminates with for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingTargetScript { .. } | Self::ResolveSelf(_) => EXIT_FAILURE,
            Self::Spawn { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => EXIT_NOT_FOUND,
                io::ErrorKind::PermissionDenied => EXIT_CANNOT_EXECUTE,
                _ => EXIT_FAILURE,
            },
        }
    }
}

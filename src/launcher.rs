//! Locating the target script next to the launcher and running it.

use std::env;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{LaunchError, EXIT_FAILURE};
use crate::interpreter::Interpreter;

/// File name of the script the launcher runs.
pub const TARGET_SCRIPT_NAME: &str = "focus.py";

/// Offset added to a terminating signal number to form an exit code.
#[cfg(unix)]
const SIGNAL_EXIT_OFFSET: i32 = 128;

/// Runs `focus.py` from a fixed directory with a given interpreter.
#[derive(Clone, Debug)]
pub struct Launcher {
    dir: PathBuf,
    target: PathBuf,
    interpreter: Interpreter,
}

impl Launcher {
    /// Create a launcher for the directory containing the running executable.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::ResolveSelf`] if the executable's location
    /// cannot be determined.
    pub fn resolve(interpreter: Interpreter) -> Result<Self, LaunchError> {
        let dir = script_dir()?;
        Ok(Self::from_dir(dir, interpreter))
    }

    /// Create a launcher for an explicit directory.
    #[must_use]
    pub fn from_dir(dir: impl Into<PathBuf>, interpreter: Interpreter) -> Self {
        let dir = dir.into();
        let target = dir.join(TARGET_SCRIPT_NAME);
        log::debug!("Target script path is {}", target.display());
        Self {
            dir,
            target,
            interpreter,
        }
    }

    /// Directory the launcher looks in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the target script.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Interpreter the target is run with.
    #[must_use]
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Whether a regular file exists at the target path.
    #[must_use]
    pub fn target_exists(&self) -> bool {
        self.target.is_file()
    }

    /// Build the interpreter command for the target with `args` appended.
    ///
    /// Standard streams are left at their default, which is inherited.
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(self.interpreter.program());
        command.arg(&self.target).args(args);
        command
    }

    /// Run the target and wait for it, returning its exit code.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Spawn`] if the interpreter cannot be started.
    pub fn invoke<I, S>(&self, args: I) -> Result<i32, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = self.command(args);
        log::debug!(
            "Running {} with {} argument(s)...",
            self.interpreter,
            command.get_args().len()
        );
        log::trace!("Command: {command:?}");

        let interrupted = ignore_terminal_interrupts();
        let status = command.status().map_err(|source| LaunchError::Spawn {
            program: self.interpreter().program().to_os_string(),
            source,
        })?;
        if interrupted.load(Ordering::Relaxed) {
            log::debug!("Interrupted while waiting, left to the target");
        }
        log::debug!("Target exited with {status}");
        Ok(exit_code(status))
    }

    /// Check that the target exists, then run it.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::MissingTargetScript`] without starting anything
    /// if the target is absent, or [`LaunchError::Spawn`] if the interpreter
    /// cannot be started.
    pub fn run<I, S>(&self, args: I) -> Result<i32, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        if !self.target_exists() {
            log::warn!("No target script at {}", self.target.display());
            return Err(LaunchError::MissingTargetScript {
                path: self.target.clone(),
            });
        }
        self.invoke(args)
    }
}

/// Keep `Ctrl+C` and `Ctrl+\` from killing the launcher while the target runs.
///
/// The terminal delivers these to the whole foreground process group, so the
/// target receives them itself. Handlers are installed rather than `SIG_IGN`
/// so the target starts with the default dispositions after `exec`. The
/// returned flag is set once either signal has arrived.
#[cfg(unix)]
fn ignore_terminal_interrupts() -> Arc<AtomicBool> {
    use signal_hook::consts::{SIGINT, SIGQUIT};

    let interrupted = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGQUIT] {
        if let Err(err) = signal_hook::flag::register(signal, Arc::clone(&interrupted)) {
            log::warn!("Could not install handler for signal {signal}: {err}");
        }
    }
    interrupted
}

#[cfg(not(unix))]
fn ignore_terminal_interrupts() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

/// Directory containing the running executable, with symlinks resolved.
///
/// # Errors
///
/// Returns [`LaunchError::ResolveSelf`] if the executable path is unavailable
/// or cannot be canonicalized.
pub fn script_dir() -> Result<PathBuf, LaunchError> {
    let exe = env::current_exe().map_err(LaunchError::ResolveSelf)?;
    log::debug!("Running executable is {}", exe.display());
    let exe = exe.canonicalize().map_err(LaunchError::ResolveSelf)?;
    let dir = exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        LaunchError::ResolveSelf(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} has no parent directory", exe.display()),
        ))
    })?;
    log::debug!("Resolved launcher directory to {}", dir.display());
    Ok(dir)
}

/// Exit code to report for a finished child.
///
/// A child killed by a signal maps to `128 + signal`, as a shell reports it.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_OFFSET + signal;
        }
    }
    EXIT_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs;

    fn missing_interpreter() -> Interpreter {
        Interpreter::new("focus-launcher-test-no-such-interpreter")
    }

    #[test]
    fn target_is_dir_joined_with_script_name() {
        let launcher = Launcher::from_dir("/opt/tool", Interpreter::default());
        assert_eq!(launcher.dir(), Path::new("/opt/tool"));
        assert_eq!(launcher.target(), Path::new("/opt/tool/focus.py"));
    }

    #[test]
    fn target_exists_only_for_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher::from_dir(dir.path(), Interpreter::default());
        assert!(!launcher.target_exists());

        fs::create_dir(dir.path().join(TARGET_SCRIPT_NAME)).unwrap();
        assert!(!launcher.target_exists());

        fs::remove_dir(dir.path().join(TARGET_SCRIPT_NAME)).unwrap();
        fs::write(dir.path().join(TARGET_SCRIPT_NAME), "").unwrap();
        assert!(launcher.target_exists());
    }

    #[test]
    fn command_passes_target_then_args_in_order() {
        let launcher = Launcher::from_dir("/opt/tool", Interpreter::new("python"));
        let command = launcher.command(["--verbose", "input.txt", "--"]);

        assert_eq!(launcher.interpreter(), &Interpreter::new("python"));
        assert_eq!(command.get_program(), OsStr::new("python"));
        let args: Vec<&OsStr> = command.get_args().collect();
        assert_eq!(
            args,
            [
                OsStr::new("/opt/tool/focus.py"),
                OsStr::new("--verbose"),
                OsStr::new("input.txt"),
                OsStr::new("--"),
            ]
        );
    }

    #[test]
    fn run_reports_missing_target_without_invoking() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = Launcher::from_dir(dir.path(), missing_interpreter());

        let err = launcher.run(Vec::<OsString>::new()).unwrap_err();
        match err {
            LaunchError::MissingTargetScript { path } => {
                assert_eq!(path, dir.path().join("focus.py"));
            }
            other => panic!("expected missing target, got {other:?}"),
        }
    }

    #[test]
    fn unknown_interpreter_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TARGET_SCRIPT_NAME), "").unwrap();
        let launcher = Launcher::from_dir(dir.path(), missing_interpreter());

        let err = launcher.run(["arg"]).unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }), "{err:?}");
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn script_dir_contains_test_executable() {
        let dir = script_dir().unwrap();
        let exe = env::current_exe().unwrap().canonicalize().unwrap();
        assert_eq!(exe.parent(), Some(dir.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_passes_through_status() {
        use std::os::unix::process::ExitStatusExt as _;

        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_maps_signals_like_a_shell() {
        use std::os::unix::process::ExitStatusExt as _;

        // Raw wait status for a process killed by SIGTERM.
        assert_eq!(exit_code(ExitStatus::from_raw(15)), 143);
    }

    #[cfg(unix)]
    #[test]
    fn invoke_returns_child_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TARGET_SCRIPT_NAME), "exit 7\n").unwrap();
        let launcher = Launcher::from_dir(dir.path(), Interpreter::new("sh"));

        assert_eq!(launcher.run(Vec::<OsString>::new()).unwrap(), 7);
    }
}

//! Selection of the program used to run the target script.

use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt::{self, Display};

/// Interpreter used when no override is set.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Environment variable that overrides the interpreter program.
pub const INTERPRETER_ENV_VAR: &str = "FOCUS_PYTHON";

/// The program the target script is handed to.
///
/// The name is looked up on the search path when the process is spawned, the
/// same way a shell would resolve it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interpreter(OsString);

impl Interpreter {
    /// Create an interpreter from an explicit program name or path.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self(program.into())
    }

    /// Read the interpreter from `FOCUS_PYTHON`, falling back to `python3`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_override(env::var_os(INTERPRETER_ENV_VAR))
    }

    /// Pick the override if it is set and non-empty, otherwise the default.
    #[must_use]
    pub fn from_override(value: Option<OsString>) -> Self {
        match value {
            Some(program) if !program.is_empty() => {
                log::debug!(
                    "Using interpreter {} from {INTERPRETER_ENV_VAR}",
                    program.to_string_lossy()
                );
                Self(program)
            }
            _ => Self::default(),
        }
    }

    /// The program name or path.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.0
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER)
    }
}

impl Display for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_python3() {
        assert_eq!(Interpreter::default().program(), OsStr::new("python3"));
        assert_eq!(Interpreter::from_override(None), Interpreter::default());
    }

    #[test]
    fn empty_override_is_ignored() {
        let interpreter = Interpreter::from_override(Some(OsString::new()));
        assert_eq!(interpreter, Interpreter::default());
    }

    #[test]
    fn override_replaces_default() {
        let interpreter = Interpreter::from_override(Some(OsString::from("python")));
        assert_eq!(interpreter.program(), OsStr::new("python"));
        assert_eq!(interpreter.to_string(), "python");
    }
}

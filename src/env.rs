use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Snapshot of the process environment used by the shell.
///
/// The environment contains:
/// - `vars`: environment variables visible to built-ins and spawned commands.
/// - `current_dir`: the working directory as last observed by the shell.
///
/// Variables are read from `vars` only, never from the live process
/// environment, so a shell (or a test) can shadow or hide a variable without
/// touching global state.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// This copies variables from `std::env::vars()` and initializes `current_dir`
    /// from `std::env::current_dir()`.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// An environment with no variables, rooted at the process working directory.
    pub fn empty() -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Get the value of a variable that is set to a non-empty string.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get_var(key).filter(|v| !v.is_empty())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn unset_var(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

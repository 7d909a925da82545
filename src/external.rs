use crate::argv::Argv;
use crate::command::ExitCode;
use crate::env::Environment;
use crate::session::JOB_CONTROL_SIGNALS;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, sigaction};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Exit code reported when the command cannot be found.
pub const NOT_FOUND: ExitCode = 127;
/// Exit code reported when the command was found but could not be started.
pub const NOT_EXECUTABLE: ExitCode = 126;

/// Why a command could not be run.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("{0}: command not found")]
    NotFound(String),
    #[error("{name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl SpawnError {
    /// The exit code a shell reports for this failure.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SpawnError::NotFound(_) => NOT_FOUND,
            SpawnError::Io { .. } => NOT_EXECUTABLE,
        }
    }
}

/// Runs argument vectors that are not built-ins.
pub trait Spawn {
    /// Run `argv` to completion and return its exit code.
    fn spawn(&mut self, argv: &Argv, env: &Environment) -> Result<ExitCode, SpawnError>;
}

/// Runs commands as child processes, waiting for each to finish.
///
/// The command is resolved through `PATH` from `env`, and the child sees
/// exactly the variables and working directory recorded in `env`. Signals
/// the shell ignores are reset to their defaults in the child.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessSpawner;

impl Spawn for ProcessSpawner {
    fn spawn(&mut self, argv: &Argv, env: &Environment) -> Result<ExitCode, SpawnError> {
        let Some(name) = argv.first() else {
            return Ok(0);
        };
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let executable = find_command_path(OsStr::new(search_paths), Path::new(name))
            .ok_or_else(|| SpawnError::NotFound(name.to_owned()))?;

        let mut cmd = Command::new(executable.as_ref());
        cmd.arg0(name)
            .args(argv.iter().skip(1))
            .env_clear()
            .envs(&env.vars)
            .current_dir(&env.current_dir);
        // SAFETY: the hook only calls sigaction, which is async-signal-safe.
        unsafe {
            cmd.pre_exec(reset_signal_dispositions);
        }

        let io_err = |source| SpawnError::Io {
            name: name.to_owned(),
            source,
        };
        let mut child = cmd.spawn().map_err(io_err)?;
        let exit_status = child.wait().map_err(io_err)?;
        match exit_status.code() {
            Some(x) => Ok(x),
            None => Ok(terminated_by_signal(exit_status)),
        }
    }
}

fn reset_signal_dispositions() -> io::Result<()> {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for signal in JOB_CONTROL_SIGNALS {
        // SAFETY: restoring SIG_DFL installs no handler code.
        unsafe { sigaction(signal, &default) }?;
    }
    Ok(())
}

fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`) or `./foo`: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    if path.starts_with("./") && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| path.is_file())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::lock_current_dir;
    use std::fs;
    use std::fs::File;

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    /// Process environment rooted at `/`, independent of tests that `cd`.
    fn shell_env() -> Environment {
        let mut env = Environment::new();
        env.current_dir = PathBuf::from("/");
        env
    }

    fn run(words: &[&str], env: &Environment) -> Result<ExitCode, SpawnError> {
        let argv: Argv = words.iter().copied().collect();
        ProcessSpawner.spawn(&argv, env)
    }

    #[test]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let res = find_command_path(osstr("/bin"), path);
        assert!(res.is_some(), "Expected to find /bin/sh via absolute path");
        assert_eq!(res.unwrap().as_ref(), path);
    }

    #[test]
    fn absolute_nonexisting() {
        let path = Path::new("/bin/nonexisting");
        let res = find_command_path(osstr("/bin"), path);
        assert!(res.is_none());
    }

    #[test]
    fn single_component_found_in_path() {
        let res = find_command_path(osstr("/nonexistent:/bin"), Path::new("sh"));
        let found = res.expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("nonexisting"));
        assert!(res.is_none(), "Expected not to find 'nonexisting' in PATH");
    }

    #[test]
    fn multiple_components_relative_existing() {
        let _lock = lock_current_dir();
        let cwd_before = std::env::current_dir().expect("cwd");
        let tmp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(tmp.path().join("bin")).expect("create temp bin dir");
        File::create(tmp.path().join("bin").join("sh")).expect("touch bin/sh");

        std::env::set_current_dir(tmp.path()).expect("set cwd");
        let res = find_command_path(osstr("/does/not/matter"), Path::new("bin/sh"))
            .map(Cow::into_owned);
        std::env::set_current_dir(&cwd_before).expect("restore cwd");

        let found = res.expect("Expected to find relative 'bin/sh' in current dir");
        assert!(found.ends_with("bin/sh"));
    }

    #[test]
    fn current_dir_with_dot_prefix() {
        let _lock = lock_current_dir();
        let cwd_before = std::env::current_dir().expect("cwd");
        let tmp = tempfile::tempdir().expect("create temp dir");
        File::create(tmp.path().join("foo")).expect("touch foo");

        std::env::set_current_dir(tmp.path()).expect("set cwd");
        let res = find_command_path(osstr("/bin"), Path::new("./foo")).map(Cow::into_owned);
        std::env::set_current_dir(&cwd_before).expect("restore cwd");

        assert_eq!(res.as_deref(), Some(Path::new("./foo")));
    }

    #[test]
    fn empty_path_is_none() {
        let res = find_command_path(osstr("/bin"), Path::new(""));
        assert!(res.is_none(), "Empty path should not resolve to anything");
    }

    #[test]
    fn spawn_reports_exit_codes() {
        let env = shell_env();
        assert_eq!(run(&["true"], &env).unwrap(), 0);
        assert_eq!(run(&["false"], &env).unwrap(), 1);
        assert_eq!(run(&["sh", "-c", "exit 7"], &env).unwrap(), 7);
    }

    #[test]
    fn spawn_unknown_command_is_not_found() {
        let env = shell_env();
        let err = run(&["definitely-not-a-command-4242"], &env).unwrap_err();
        assert!(matches!(err, SpawnError::NotFound(_)));
        assert_eq!(err.exit_code(), NOT_FOUND);
        assert_eq!(err.to_string(), "definitely-not-a-command-4242: command not found");
    }

    #[test]
    fn spawn_empty_argv_is_noop() {
        assert_eq!(run(&[], &Environment::empty()).unwrap(), 0);
    }

    #[test]
    fn spawn_passes_environment_and_directory() {
        let tmp = tempfile::tempdir().unwrap();
        File::create(tmp.path().join("marker")).unwrap();

        let mut env = shell_env();
        env.set_var("TINYSH_MARKER", "bar");
        env.current_dir = tmp.path().to_path_buf();

        let script = r#"test "$TINYSH_MARKER" = bar && test -f marker"#;
        assert_eq!(run(&["sh", "-c", script], &env).unwrap(), 0);

        env.unset_var("TINYSH_MARKER");
        assert_eq!(run(&["sh", "-c", script], &env).unwrap(), 1);
    }

    #[test]
    fn spawn_signal_death_maps_to_128_plus_signal() {
        let env = shell_env();
        assert_eq!(run(&["sh", "-c", "kill -TERM $$"], &env).unwrap(), 128 + 15);
    }
}

use crate::argv::Argv;
use crate::command::{BuiltinContext, CommandFactory, Dispatch, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::Result;
use nix::unistd::{User, getuid};
use std::env;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are matched on the exact first word of the line and executed
/// directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "cd" or "exit".
    fn name() -> &'static str;

    /// Builds the command from the full argument vector, name included.
    fn from_argv(argv: &Argv) -> Self;

    /// Executes the command.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, ctx: &mut BuiltinContext<'_>) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, ctx: &mut BuiltinContext<'_>) -> ExitCode {
        match T::execute(*self, ctx) {
            Ok(x) => x,
            Err(e) => {
                if let Err(io) = writeln!(ctx.stderr, "{}: {:#}", T::name(), e) {
                    log::warn!("failed to report {} error: {}", T::name(), io);
                }
                1
            }
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, argv: &Argv) -> Option<Box<dyn ExecutableCommand>> {
        if argv.first()? == T::name() {
            Some(Box::new(T::from_argv(argv)))
        } else {
            None
        }
    }
}

/// Routes an argument vector to the built-in named by its first word.
pub struct Dispatcher {
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Dispatcher {
    /// Create a dispatcher with a custom set of built-in factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { commands }
    }

    /// Run `argv` if it names a built-in.
    ///
    /// Only the first word is inspected. A failing built-in is still reported
    /// as [`Dispatch::Builtin`], with a non-zero code; `exit` does not return.
    pub fn dispatch(&self, argv: &Argv, ctx: &mut BuiltinContext<'_>) -> Dispatch {
        if argv.is_empty() {
            return Dispatch::NotBuiltin;
        }
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(argv) {
                return Dispatch::Builtin(cmd.execute(ctx));
            }
        }
        Dispatch::NotBuiltin
    }
}

impl Default for Dispatcher {
    /// A dispatcher with `exit`, `cd` and `history`.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<History>::default()),
        ])
    }
}

/// Exit the shell. Arguments are ignored and the status is always 0.
pub struct Exit;

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn from_argv(_argv: &Argv) -> Self {
        Exit
    }

    fn execute(self, ctx: &mut BuiltinContext<'_>) -> Result<ExitCode> {
        ctx.session.destroy()
    }
}

/// Why `cd` failed.
#[derive(Debug, thiserror::Error)]
pub enum CdError {
    #[error("cannot find home directory")]
    NoHome,
    #[error("{}: {source}", .path.display())]
    Chdir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Change the current working directory.
/// If no target is provided, changes to `$HOME`, or to the home directory
/// recorded for the current user in the password database.
pub struct Cd {
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn from_argv(argv: &Argv) -> Self {
        Cd {
            target: argv.get(1).map(str::to_owned),
        }
    }

    fn execute(self, ctx: &mut BuiltinContext<'_>) -> Result<ExitCode> {
        change_dir_with(self.target.as_deref(), ctx.env, passwd_home)?;
        Ok(0)
    }
}

/// Change directory to `argv[1]`, or to the home directory when it is absent.
///
/// On success, `env.current_dir` and `PWD` are updated and the new directory
/// returned. On failure the working directory is left unchanged.
pub fn change_dir(argv: &Argv, env: &mut Environment) -> Result<PathBuf, CdError> {
    change_dir_with(argv.get(1), env, passwd_home)
}

fn change_dir_with(
    target: Option<&str>,
    env: &mut Environment,
    home_lookup: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf, CdError> {
    let path = match target {
        Some(t) => PathBuf::from(t),
        None => resolve_home(env, home_lookup).ok_or(CdError::NoHome)?,
    };
    log::debug!("cd: target {}", path.display());

    env::set_current_dir(&path).map_err(|source| CdError::Chdir {
        path: path.clone(),
        source,
    })?;

    let new_dir = env::current_dir().unwrap_or_else(|_| env.current_dir.join(&path));
    env.set_var("PWD", new_dir.to_string_lossy());
    env.current_dir = new_dir.clone();
    Ok(new_dir)
}

fn resolve_home(
    env: &Environment,
    home_lookup: impl FnOnce() -> Option<PathBuf>,
) -> Option<PathBuf> {
    match env.get_non_empty("HOME") {
        Some(home) => Some(PathBuf::from(home)),
        None => home_lookup(),
    }
}

/// Home directory of the real user id according to the password database.
fn passwd_home() -> Option<PathBuf> {
    match User::from_uid(getuid()) {
        Ok(user) => user.map(|u| u.dir),
        Err(e) => {
            log::debug!("password database lookup failed: {}", e);
            None
        }
    }
}

/// List the lines entered so far, numbered from the log's base index.
pub struct History;

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn from_argv(_argv: &Argv) -> Self {
        History
    }

    fn execute(self, ctx: &mut BuiltinContext<'_>) -> Result<ExitCode> {
        if let Some(log) = ctx.history {
            let base = log.base();
            for (i, line) in log.entries().enumerate() {
                writeln!(ctx.stdout, "{}: {}", i + base, line)?;
            }
        }
        Ok(0)
    }
}

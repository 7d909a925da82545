use crate::argv::Argv;
use crate::env::Environment;
use crate::history::HistoryLog;
use crate::session::Session;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Outcome of offering an argument vector to the built-in dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The line was a built-in; carries its exit code.
    Builtin(ExitCode),
    /// The line names something else and should be spawned.
    NotBuiltin,
}

/// Everything a built-in may read or change while it runs.
pub struct BuiltinContext<'a> {
    pub session: &'a mut Session,
    pub env: &'a mut Environment,
    /// Lines entered so far, when a line editor is attached.
    pub history: Option<&'a dyn HistoryLog>,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

/// Object-safe trait for any built-in the dispatcher can run.
///
/// Implemented for every [`BuiltinCommand`](crate::builtin) via a blanket impl.
pub trait ExecutableCommand {
    /// Executes the command, reporting failures on `ctx.stderr`.
    fn execute(self: Box<Self>, ctx: &mut BuiltinContext<'_>) -> ExitCode;
}

/// Factory that tries to create a command from an argument vector.
///
/// Returns `None` when the factory doesn't recognize the command name.
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided arguments.
    fn try_create(&self, argv: &Argv) -> Option<Box<dyn ExecutableCommand>>;
}

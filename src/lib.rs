//! A small interactive shell front-end.
//!
//! The crate reads lines with a line editor, splits them into an [`Argv`],
//! runs the built-ins `exit`, `cd` and `history` in-process, and spawns every
//! other command as a child process. At startup a [`Session`] takes over the
//! controlling terminal: it moves the shell into its own process group, makes
//! that group the foreground group, and ignores the interactive job-control
//! signals for as long as the shell runs.
//!
//! The main entry point is [`Interpreter`]. The public modules expose the
//! pieces it is made of, so they can be driven and tested on their own.

pub mod argv;
pub mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod external;
pub mod history;
mod interpreter;
pub mod parser;
pub mod prompt;
pub mod session;

pub use argv::Argv;
pub use config::Config;
pub use env::Environment;
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
pub use session::Session;

/// Version components printed by `-v`.
pub const VERSION_MAJOR: &str = env!("CARGO_PKG_VERSION_MAJOR");
pub const VERSION_MINOR: &str = env!("CARGO_PKG_VERSION_MINOR");

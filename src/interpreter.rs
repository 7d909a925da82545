use crate::builtin::Dispatcher;
use crate::command::{BuiltinContext, Dispatch, ExitCode};
use crate::config::Config;
use crate::env::Environment;
use crate::external::{ProcessSpawner, Spawn};
use crate::history::{AddedLines, HistoryLog};
use crate::parser::{Tokenizer, trim_white};
use crate::session::Session;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports built-ins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The interactive shell: reads lines, runs built-ins, spawns everything else.
///
/// The interpreter owns the [`Session`] and an [`Environment`] snapshot. Lines
/// are trimmed and tokenized, offered to the built-in [`Dispatcher`], and
/// otherwise handed to a [`Spawn`] implementation.
pub struct Interpreter {
    session: Session,
    env: Environment,
    config: Config,
    builtins: Dispatcher,
    spawner: Box<dyn Spawn>,
}

impl Interpreter {
    /// Create an interpreter that spawns child processes for non-built-ins.
    pub fn new(session: Session, env: Environment, config: Config) -> Self {
        Self::with_spawner(session, env, config, Box::new(ProcessSpawner))
    }

    /// Create an interpreter with a custom spawner.
    pub fn with_spawner(
        session: Session,
        env: Environment,
        config: Config,
        spawner: Box<dyn Spawn>,
    ) -> Self {
        Self {
            session,
            env,
            config,
            builtins: Dispatcher::default(),
            spawner,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Run one input line.
    ///
    /// Blank lines do nothing and report 0. Built-ins run in-process; any
    /// other command goes to the spawner, and a spawn failure is reported on
    /// `stderr` with the conventional 126/127 code.
    pub fn execute_line(
        &mut self,
        line: &str,
        history: Option<&dyn HistoryLog>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> io::Result<ExitCode> {
        let line = trim_white(line);
        if line.is_empty() {
            return Ok(0);
        }
        let argv = Tokenizer::from_system().tokenize(line);

        let mut ctx = BuiltinContext {
            session: &mut self.session,
            env: &mut self.env,
            history,
            stdout: &mut *stdout,
            stderr: &mut *stderr,
        };
        if let Dispatch::Builtin(code) = self.builtins.dispatch(&argv, &mut ctx) {
            return Ok(code);
        }

        let code = match self.spawner.spawn(&argv, &self.env) {
            Ok(code) => code,
            Err(e) => {
                writeln!(stderr, "{}", e)?;
                e.exit_code()
            }
        };
        if let Err(e) = self.session.restore_terminal_modes() {
            log::warn!("failed to restore terminal modes: {}", e);
        }
        Ok(code)
    }

    /// Read-eval loop over a line editor.
    ///
    /// Ctrl-C discards the current line. End of input ends the session and the
    /// process, like the `exit` built-in.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let editor_config = rustyline::Config::builder()
            .max_history_size(self.config.history_size)?
            .auto_add_history(false)
            .build();
        let mut rl = DefaultEditor::with_config(editor_config)?;
        let mut added = AddedLines::default();

        loop {
            let prompt = self.session.prompt().to_owned();
            match rl.readline(&prompt) {
                Ok(line) => {
                    if !trim_white(&line).is_empty() {
                        added.record(rl.add_history_entry(line.as_str())?);
                    }
                    let numbered = added.numbered(rl.history());
                    let history: &dyn HistoryLog = &numbered;
                    let code = self.execute_line(
                        &line,
                        Some(history),
                        &mut io::stdout(),
                        &mut io::stderr(),
                    )?;
                    log::debug!("exit code {}", code);
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => self.session.destroy(),
                Err(err) => return Err(err.into()),
            }
        }
    }
}

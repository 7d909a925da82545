//! Interactive session state: prompt, terminal ownership and signal dispositions.

use crate::config::Config;
use crate::env::Environment;
use crate::prompt::resolve_prompt;
use nix::errno::Errno;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use nix::sys::termios::{SetArg, Termios, tcgetattr, tcsetattr};
use nix::unistd::{Pid, getpid, setpgid, tcsetpgrp};
use std::io::{self, IsTerminal};
use std::os::fd::{AsRawFd, RawFd};

/// Signals an interactive shell must not be stopped or killed by.
pub(crate) const JOB_CONTROL_SIGNALS: [Signal; 5] = [
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGTSTP,
    Signal::SIGTTIN,
    Signal::SIGTTOU,
];

/// Why an interactive session could not be started.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("not running interactively")]
    NotInteractive,
    #[error("setpgid failed: {0}")]
    SetPgid(#[source] Errno),
    #[error("tcsetpgrp failed: {0}")]
    TcSetPgrp(#[source] Errno),
    #[error("tcgetattr failed: {0}")]
    TcGetAttr(#[source] Errno),
    #[error("cannot ignore {signal}: {source}")]
    Signal { signal: Signal, source: Errno },
}

/// Shell-wide state for one interactive process.
///
/// Created once by [`Session::init`]. [`Session::teardown`] gives back
/// everything the session took (prompt storage, terminal modes, signal
/// dispositions) and runs at most once, either explicitly or on drop.
/// [`Session::destroy`] tears down and ends the process.
pub struct Session {
    prompt: Option<String>,
    terminal: RawFd,
    pgid: Pid,
    tmodes: Option<Termios>,
    saved_signals: Vec<(Signal, SigAction)>,
    released: bool,
}

impl Session {
    /// Take control of the terminal on standard input.
    ///
    /// Steps, in order: verify stdin is a terminal, resolve the prompt, ignore
    /// the job-control signals, move into a process group of our own, make it
    /// the terminal's foreground group, and save the terminal modes. Signals
    /// must already be ignored when `tcsetpgrp` runs, or a shell started in
    /// the background is stopped by `SIGTTOU`.
    pub fn init(config: &Config, env: &Environment) -> Result<Self, SessionError> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Err(SessionError::NotInteractive);
        }

        let pgid = getpid();
        let mut session = Session {
            prompt: Some(resolve_prompt(env, &config.prompt_var)),
            terminal: stdin.as_raw_fd(),
            pgid,
            tmodes: None,
            saved_signals: Vec::with_capacity(JOB_CONTROL_SIGNALS.len()),
            released: false,
        };

        session.ignore_job_control_signals()?;
        setpgid(pgid, pgid).map_err(SessionError::SetPgid)?;
        tcsetpgrp(&stdin, pgid).map_err(SessionError::TcSetPgrp)?;
        session.tmodes = Some(tcgetattr(&stdin).map_err(SessionError::TcGetAttr)?);

        log::info!(
            "shell initialized: pgid={}, terminal fd={}",
            session.pgid,
            session.terminal
        );
        Ok(session)
    }

    /// A session that does not own the terminal or touch signal dispositions.
    #[cfg(test)]
    pub(crate) fn detached(prompt: &str) -> Self {
        Session {
            prompt: Some(prompt.to_owned()),
            terminal: io::stdin().as_raw_fd(),
            pgid: nix::unistd::getpgrp(),
            tmodes: None,
            saved_signals: Vec::new(),
            released: false,
        }
    }

    fn ignore_job_control_signals(&mut self) -> Result<(), SessionError> {
        let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        for signal in JOB_CONTROL_SIGNALS {
            // SAFETY: installing SIG_IGN does not run any code in signal context.
            let old = unsafe { sigaction(signal, &ignore) }
                .map_err(|source| SessionError::Signal { signal, source })?;
            self.saved_signals.push((signal, old));
        }
        Ok(())
    }

    /// The prompt, or an empty string once the session has been torn down.
    pub fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or("")
    }

    pub fn terminal(&self) -> RawFd {
        self.terminal
    }

    pub fn pgid(&self) -> Pid {
        self.pgid
    }

    /// Terminal modes as they were when the session started.
    pub fn saved_modes(&self) -> Option<&Termios> {
        self.tmodes.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Put the terminal back into the modes saved at startup.
    ///
    /// Called after a child process returns, since the child may have left
    /// the terminal in raw or non-echoing mode.
    pub fn restore_terminal_modes(&self) -> nix::Result<()> {
        match &self.tmodes {
            Some(modes) => tcsetattr(io::stdin(), SetArg::TCSADRAIN, modes),
            None => Ok(()),
        }
    }

    /// Release everything the session holds. A second call does nothing.
    pub fn teardown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.prompt = None;

        if let Err(e) = self.restore_terminal_modes() {
            log::warn!("failed to restore terminal modes: {}", e);
        }
        for (signal, action) in self.saved_signals.drain(..).rev() {
            // SAFETY: `action` was returned by `sigaction` for this signal.
            if let Err(e) = unsafe { sigaction(signal, &action) } {
                log::warn!("failed to restore disposition of {}: {}", signal, e);
            }
        }
        self.tmodes = None;
    }

    /// Tear down and terminate the process with status 0.
    pub fn destroy(&mut self) -> ! {
        self.teardown();
        std::process::exit(0)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argv::Argv;
    use crate::external::{ProcessSpawner, Spawn};
    use std::path::PathBuf;
    use std::process::Command;

    const SIGNALS_CHILD_VAR: &str = "TINYSH_TEST_SIGNALS_CHILD";

    /// Current disposition of `signal`, read by swapping an action in and back out.
    fn current_handler(signal: Signal) -> SigHandler {
        let dfl = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        let old = unsafe { sigaction(signal, &dfl) }.unwrap();
        unsafe { sigaction(signal, &old) }.unwrap();
        old.handler()
    }

    fn set_default(signal: Signal) {
        let dfl = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        unsafe { sigaction(signal, &dfl) }.unwrap();
    }

    #[test]
    fn test_detached_session_holds_prompt() {
        let session = Session::detached("myshell$ ");
        assert_eq!(session.prompt(), "myshell$ ");
        assert!(!session.is_released());
        assert!(session.saved_modes().is_none());
        assert_eq!(session.terminal(), 0);
        assert_eq!(session.pgid(), nix::unistd::getpgrp());
    }

    #[test]
    fn test_teardown_releases_prompt() {
        let mut session = Session::detached("shell>");
        session.teardown();
        assert!(session.is_released());
        assert_eq!(session.prompt(), "");
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut session = Session::detached("shell>");
        session.teardown();
        session.teardown();
        assert!(session.is_released());
    }

    #[test]
    fn test_restore_without_saved_modes_is_noop() {
        let session = Session::detached("shell>");
        assert!(session.restore_terminal_modes().is_ok());
    }

    #[test]
    fn test_init_requires_terminal() {
        // only checkable when the test runner has no terminal on stdin
        if io::stdin().is_terminal() {
            return;
        }
        let res = Session::init(&Config::default(), &Environment::empty());
        assert!(matches!(res, Err(SessionError::NotInteractive)));
    }

    fn run_signal_checks() {
        for signal in JOB_CONTROL_SIGNALS {
            set_default(signal);
        }

        let mut session = Session::detached("shell>");
        session.ignore_job_control_signals().unwrap();
        for signal in JOB_CONTROL_SIGNALS {
            assert_eq!(current_handler(signal), SigHandler::SigIgn, "{}", signal);
        }

        // the child must die from SIGINT even though the shell ignores it
        let mut env = Environment::new();
        env.current_dir = PathBuf::from("/");
        let argv: Argv = ["sh", "-c", "kill -INT $$"].into_iter().collect();
        assert_eq!(ProcessSpawner.spawn(&argv, &env).unwrap(), 128 + 2);

        session.teardown();
        for signal in JOB_CONTROL_SIGNALS {
            assert_eq!(current_handler(signal), SigHandler::SigDfl, "{}", signal);
        }
    }

    #[test]
    fn test_signal_dispositions_are_ignored_reset_and_restored() {
        if std::env::var_os(SIGNALS_CHILD_VAR).is_some() {
            run_signal_checks();
            return;
        }

        // dispositions are process-wide, so the checks run in a fresh process
        let output = Command::new(std::env::current_exe().unwrap())
            .args([
                "session::tests::test_signal_dispositions_are_ignored_reset_and_restored",
                "--exact",
                "--nocapture",
                "--test-threads=1",
            ])
            .env(SIGNALS_CHILD_VAR, "1")
            .output()
            .expect("failed to re-run test binary");
        assert!(
            output.status.success(),
            "{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

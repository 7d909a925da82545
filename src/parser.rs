//! Turning a raw input line into an [`Argv`].

use crate::argv::Argv;
use nix::unistd::{SysconfVar, sysconf};

/// Minimum value of `ARG_MAX` guaranteed by POSIX (`_POSIX_ARG_MAX`).
pub const POSIX_ARG_MAX: usize = 4096;

/// Upper bound on the storage reserved up front for a parsed line.
const CAPACITY_HINT: usize = 16;

/// Remove leading and trailing ASCII whitespace from a line.
///
/// Returns a sub-slice of `line`; nothing is allocated. A line made only of
/// whitespace yields an empty string.
pub fn trim_white(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// Splits lines on ASCII whitespace runs into at most `limit - 1` arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    limit: usize,
}

impl Tokenizer {
    /// Creates a tokenizer bounded by the platform's `ARG_MAX`.
    ///
    /// The limit is queried on every call. When the query fails or reports a
    /// non-positive value, [`POSIX_ARG_MAX`] is used instead.
    pub fn from_system() -> Self {
        let limit = match sysconf(SysconfVar::ARG_MAX) {
            Ok(Some(n)) if n > 0 => usize::try_from(n).unwrap_or(POSIX_ARG_MAX),
            _ => POSIX_ARG_MAX,
        };
        Self::with_limit(limit)
    }

    /// Creates a tokenizer with an explicit argument limit.
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Converts `line` into an argument vector.
    ///
    /// The line is trimmed first and then split on runs of ASCII whitespace. Each
    /// token is copied into the result. Tokens beyond `limit - 1` are dropped.
    ///
    /// # Arguments
    /// * `line` - The raw line as read from the user.
    pub fn tokenize(&self, line: &str) -> Argv {
        let max_args = self.limit.saturating_sub(1);
        let mut argv = Argv::with_capacity(max_args.min(CAPACITY_HINT));

        let mut tokens = trim_white(line).split_ascii_whitespace();
        for token in tokens.by_ref().take(max_args) {
            argv.push(token);
        }

        let dropped = tokens.count();
        if dropped > 0 {
            log::debug!(
                "argument limit {} reached, discarded {} trailing token(s)",
                self.limit,
                dropped
            );
        }
        argv
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::from_system()
    }
}

/// Parse `line` into an argument vector using the system argument limit.
pub fn cmd_parse(line: &str) -> Argv {
    Tokenizer::from_system().tokenize(line)
}

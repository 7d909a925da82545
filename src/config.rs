use crate::env::Environment;
use crate::prompt::PROMPT_VAR;

/// Number of lines kept in the in-memory history by default.
pub const DEFAULT_HISTORY_SIZE: usize = 1000;

/// Settings the shell reads once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name of the variable whose value becomes the prompt.
    pub prompt_var: String,
    /// Maximum number of history entries kept by the line editor.
    pub history_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt_var: PROMPT_VAR.to_owned(),
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl Config {
    /// Build the configuration from the environment.
    ///
    /// `HISTSIZE` overrides the history capacity when it holds a positive
    /// integer; anything else is logged and ignored.
    pub fn from_env(env: &Environment) -> Self {
        let mut config = Self::default();
        if let Some(raw) = env.get_non_empty("HISTSIZE") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.history_size = n,
                _ => log::warn!("ignoring invalid HISTSIZE value {:?}", raw),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_env(&Environment::empty());
        assert_eq!(config.prompt_var, "MY_PROMPT");
        assert_eq!(config.history_size, DEFAULT_HISTORY_SIZE);
    }

    #[test]
    fn test_histsize_override() {
        let mut env = Environment::empty();
        env.set_var("HISTSIZE", "50");
        assert_eq!(Config::from_env(&env).history_size, 50);
    }

    #[test]
    fn test_invalid_histsize_is_ignored() {
        let mut env = Environment::empty();
        for bad in ["abc", "0", "-3"] {
            env.set_var("HISTSIZE", bad);
            assert_eq!(Config::from_env(&env).history_size, DEFAULT_HISTORY_SIZE);
        }
    }
}

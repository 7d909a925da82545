use crate::env::Environment;

/// Prompt shown when the prompt variable is unset or empty.
pub const DEFAULT_PROMPT: &str = "shell>";

/// Variable consulted for the prompt unless configured otherwise.
pub const PROMPT_VAR: &str = "MY_PROMPT";

/// Resolve the prompt from the variable `var`, falling back to [`DEFAULT_PROMPT`].
///
/// The value is returned as-is, trailing whitespace included.
pub fn resolve_prompt(env: &Environment, var: &str) -> String {
    env.get_non_empty(var).unwrap_or(DEFAULT_PROMPT).to_owned()
}

//! Per-invocation terminal state shared by `install-zeek` and `stage-zeek`.

use anyhow::Result;

use crate::application::ports::Prompt;
use crate::output::OutputContext;

/// Environment variables that switch prompts off, as if `--yes` were given.
const NON_INTERACTIVE_ENV: &[&str] = &["CI", "ZEEK_YES"];

/// What a command handler needs from the terminal.
pub struct AppContext {
    pub output: OutputContext,
    /// Prompts answer with their default instead of asking.
    pub non_interactive: bool,
}

impl AppContext {
    /// Build the context from the global flags and the environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool, yes: bool) -> Self {
        let env_yes = NON_INTERACTIVE_ENV
            .iter()
            .any(|name| std::env::var_os(name).is_some());
        Self {
            output: OutputContext::new(no_color, quiet),
            non_interactive: yes || env_yes,
        }
    }
}

impl Prompt for AppContext {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            tracing::info!(prompt, default, "answered without asking");
            return Ok(default);
        }
        Ok(dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }
}

//! Prompts command handler.
//!
//! Lists the prompt catalog and which entries the workspace overrides.

use clap::Args;
use vetted_core::{config::AppConfig, AppResult};
use vetted_prompt::list_prompts;

/// List the prompt catalog and workspace overrides
#[derive(Args, Debug)]
pub struct PromptsCommand {}

impl PromptsCommand {
    /// Execute the prompts command.
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let entries = list_prompts(&config.workspace)?;

        for entry in entries {
            let marker = if entry.overridden { " (overridden)" } else { "" };
            println!("{:<28} {}{}", entry.id, entry.title, marker);
        }

        Ok(())
    }
}

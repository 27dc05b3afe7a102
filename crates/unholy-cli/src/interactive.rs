//! Terminal prompts and progress output
//!
//! Uses dialoguer for confirmations.

use colored::Colorize;
use dialoguer::Confirm;
use unholy_core::{Confirmation, Interaction, Step};

/// [`Interaction`] on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalInteraction;

impl Interaction for TerminalInteraction {
    fn confirm(&mut self, confirmation: &Confirmation) -> unholy_core::Result<bool> {
        Confirm::new()
            .with_prompt(confirmation.to_string())
            .default(false)
            .interact()
            .map_err(|e| {
                // No terminal to ask on; treat as a refusal.
                tracing::warn!(error = %e, "Confirmation prompt failed");
                unholy_core::Error::Aborted
            })
    }

    fn progress(&mut self, step: &Step) {
        println!("{} {}", "=>".cyan().bold(), step);
    }
}

//! Interactive input utilities for user prompts
//!
//! Confirmations, resource pickers and progress spinners for the CLI.

use crate::error::{Result, SweepError};
use dialoguer::{theme::ColorfulTheme, Confirm, FuzzySelect};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Interactive prompt utilities
pub struct InteractivePrompt {
    theme: ColorfulTheme,
}

impl Default for InteractivePrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractivePrompt {
    /// Create a new interactive prompt instance
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    /// Prompt for yes/no confirmation with a default value
    pub fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(|e| SweepError::input(format!("Failed to get user input: {e}")))
    }

    /// Fuzzy-pick one of `options`; `None` if the user escapes
    pub fn fuzzy_select(&self, message: &str, options: &[String]) -> Result<Option<usize>> {
        FuzzySelect::with_theme(&self.theme)
            .with_prompt(message)
            .items(options)
            .default(0)
            .max_length(20)
            .interact_opt()
            .map_err(|e| SweepError::input(format!("Failed to get user selection: {e}")))
    }

    /// Display an informational message
    pub fn info(&self, message: &str) {
        println!("ℹ️  {message}");
    }

    /// Display a success message
    pub fn success(&self, message: &str) {
        println!("✅ {message}");
    }

    /// Spinner shown while a storage request is outstanding
    pub fn spinner(&self, message: String) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }
}

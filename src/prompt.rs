//! Yes/no confirmation before destructive operations.
//!
//! Interactive terminals get a dialoguer prompt; piped stdin is read line by line
//! so the tool can be driven from scripts.

use std::io::{self, BufRead, IsTerminal, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Failed to read confirmation: {0}")]
    Io(#[from] io::Error),
}

/// Asks the user to confirm an action.
pub trait Confirm {
    /// Returns `true` only for an explicit "y" or "yes".
    fn confirm(&self, prompt: &str) -> Result<bool, PromptError>;
}

/// Case-insensitive `y`/`yes`; anything else, including an empty answer, declines.
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

pub struct TerminalConfirm {
    theme: dialoguer::theme::ColorfulTheme,
}

impl TerminalConfirm {
    pub fn new() -> Self {
        TerminalConfirm {
            theme: dialoguer::theme::ColorfulTheme::default(),
        }
    }

    fn read_piped_answer(prompt: &str) -> Result<String, PromptError> {
        let mut stdout = io::stdout();
        write!(stdout, "{} ", prompt)?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(answer)
    }
}

impl Default for TerminalConfirm {
    fn default() -> Self {
        Self::new()
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool, PromptError> {
        let answer = if io::stdin().is_terminal() {
            dialoguer::Input::<String>::with_theme(&self.theme)
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
                .map_err(|e| PromptError::Io(io::Error::other(e)))?
        } else {
            Self::read_piped_answer(prompt)?
        };

        Ok(is_affirmative(&answer))
    }
}

/// Skips the question, used for `--yes`.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> Result<bool, PromptError> {
        Ok(true)
    }
}

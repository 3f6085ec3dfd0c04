use crate::error::Result;
use inquire::validator::ValueRequiredValidator;
use inquire::{Confirm, Password, PasswordDisplayMode};

pub const PASSWORD_MESSAGE: &str = "Please enter in your password";
pub const TRUNCATE_MESSAGE: &str = "Truncating. Are you sure? All data will be deleted";

/// Interactive questions asked during a run.
pub trait Prompter {
    /// Masked input; an empty answer is never returned.
    fn password(&self, message: &str) -> Result<String>;

    fn confirm(&self, message: &str) -> Result<bool>;
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn password(&self, message: &str) -> Result<String> {
        let password = Password::new(message)
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .with_validator(ValueRequiredValidator::default())
            .prompt()?;
        Ok(password)
    }

    fn confirm(&self, message: &str) -> Result<bool> {
        let answer = Confirm::new(message).with_default(false).prompt()?;
        Ok(answer)
    }
}

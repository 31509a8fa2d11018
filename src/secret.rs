//! Interactive capture of the API key.

use std::io::{self, BufRead, Write};

use crate::errors::DeobfuscateError;

pub trait SecretProvider {
    /// Asks the user for the API key once.
    ///
    /// # Errors
    ///
    /// Returns `SecretPrompt` on terminal I/O failure and `MissingApiKey` when
    /// nothing was entered.
    fn api_key(&mut self) -> Result<String, DeobfuscateError>;
}

/// Prompts on stdout and reads one line from stdin.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl SecretProvider for TerminalPrompt {
    fn api_key(&mut self) -> Result<String, DeobfuscateError> {
        print!("Please enter your SiliconFlow API key: ");
        io::stdout().flush().map_err(DeobfuscateError::SecretPrompt)?;

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(DeobfuscateError::SecretPrompt)?;

        let key = line.trim();
        if key.is_empty() {
            return Err(DeobfuscateError::MissingApiKey);
        }
        Ok(key.to_string())
    }
}

/// Fixed answer, for non-interactive callers and tests.
#[derive(Debug, Clone)]
pub struct StaticSecret(pub String);

impl SecretProvider for StaticSecret {
    fn api_key(&mut self) -> Result<String, DeobfuscateError> {
        if self.0.trim().is_empty() {
            return Err(DeobfuscateError::MissingApiKey);
        }
        Ok(self.0.trim().to_string())
    }
}

//! API key resolution.
//!
//! Priority: the configured key, then the key saved in the vault, then one
//! interactive prompt whose answer is saved for later runs.

use crate::error::Result;
use crate::storage::{API_KEY_KEY, KeyValueStore};
use std::io::{self, BufRead, Write};
use tracing::{debug, warn};

/// Source of an interactively entered API key.
pub trait KeyPrompter {
    /// Ask the user for a key. `None` means the user declined.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be shown or read.
    fn prompt_key(&mut self) -> Result<Option<String>>;
}

/// Prompts on stderr and reads one line from stdin.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl KeyPrompter for StdinPrompter {
    fn prompt_key(&mut self) -> Result<Option<String>> {
        let mut stderr = io::stderr();
        writeln!(stderr, "SECURITY: API key not found in config.")?;
        write!(stderr, "Please enter your OpenRouter API key to begin: ")?;
        stderr.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Prompter that always declines. Used for non-interactive runs.
#[derive(Debug, Default)]
pub struct NoPrompt;

impl KeyPrompter for NoPrompt {
    fn prompt_key(&mut self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Resolve the API key.
///
/// A configured key is returned as-is and never written to storage. An
/// entered key is trimmed and saved under [`API_KEY_KEY`]; a blank answer
/// leaves the key unresolved.
///
/// # Errors
///
/// Returns an error if the vault cannot be read or written, or the prompt fails.
pub fn resolve_api_key(
    configured: Option<&str>,
    vault: &dyn KeyValueStore,
    prompter: &mut dyn KeyPrompter,
) -> Result<Option<String>> {
    if let Some(key) = configured.map(str::trim).filter(|k| !k.is_empty()) {
        debug!("using configured api key");
        return Ok(Some(key.to_string()));
    }

    if let Some(key) = vault.get(API_KEY_KEY)? {
        let key = key.trim();
        if !key.is_empty() {
            debug!("using stored api key");
            return Ok(Some(key.to_string()));
        }
    }

    let entered = prompter.prompt_key()?;
    match entered.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => {
            vault.set(API_KEY_KEY, key)?;
            Ok(Some(key.to_string()))
        }
        None => {
            warn!("no api key provided; sends will fail until one is configured");
            Ok(None)
        }
    }
}

//! Wiring shared by the commands: backend, store, key and client.

use crate::completion::OpenRouterClient;
use crate::config::Config;
use crate::core::{KeyPrompter, TurnOrchestrator, resolve_api_key};
use crate::error::Result;
use crate::storage::{FileBackend, SessionStore};
use std::sync::Arc;
use tracing::debug;

/// Open the file backend under the configured storage path.
///
/// # Errors
///
/// Returns an error if the storage directory cannot be created.
pub fn open_backend(config: &Config) -> Result<Arc<FileBackend>> {
    debug!(path = %config.storage.path.display(), "opening storage");
    Ok(Arc::new(FileBackend::new(config.storage.path.clone())?))
}

/// Open the session store under the configured storage path.
///
/// # Errors
///
/// Returns an error if the storage cannot be opened or the saved sessions
/// cannot be parsed.
pub fn open_store(config: &Config) -> Result<SessionStore> {
    SessionStore::open(open_backend(config)?)
}

/// Build a turn orchestrator, resolving the API key first.
///
/// # Errors
///
/// Returns an error if storage cannot be opened, key resolution fails, or
/// the HTTP client cannot be built.
pub fn build_orchestrator(
    config: &Config,
    prompter: &mut dyn KeyPrompter,
) -> Result<TurnOrchestrator> {
    let backend = open_backend(config)?;
    let api_key = resolve_api_key(config.api.key(), &*backend, prompter)?;
    let store = SessionStore::open(backend)?;
    let client = OpenRouterClient::new(&config.api.endpoint)?;
    Ok(TurnOrchestrator::new(
        store,
        Box::new(client),
        api_key,
        config.api.model.clone(),
    ))
}

//! `nova delete` command implementation.

use crate::cli::setup::open_store;
use crate::config::Config;
use crate::core::SessionId;
use crate::error::Result;

/// Run the delete command.
///
/// # Errors
///
/// Returns an error if the storage backend fails.
pub fn run(config: &Config, session_id: &str) -> Result<()> {
    let mut store = open_store(config)?;
    if store.delete(&SessionId::from(session_id))? {
        println!("Deleted {session_id}.");
    } else {
        println!("No session {session_id}; nothing deleted.");
    }
    Ok(())
}

//! `nova list` command implementation.

use crate::cli::render::format_session_list;
use crate::cli::setup::open_store;
use crate::config::Config;
use crate::error::Result;
use crate::storage::SessionSummary;

/// Default number of sessions to show.
const DEFAULT_LIMIT: usize = 20;

/// Run the list command.
///
/// Shows sessions newest first with their IDs, creation time and title.
///
/// # Errors
///
/// Returns an error if the storage backend fails.
pub fn run(config: &Config, limit: Option<usize>) -> Result<()> {
    let store = open_store(config)?;
    let sessions = limited(store.list(), limit.unwrap_or(DEFAULT_LIMIT));

    if sessions.is_empty() {
        println!("No sessions found.");
        println!("\nSessions are stored in: {}", config.storage.path.display());
        return Ok(());
    }

    print!("{}", format_session_list(&sessions, None));
    println!("{}", "─".repeat(80));
    println!("Showing {} of {} session(s)", sessions.len(), store.len());

    Ok(())
}

fn limited(mut sessions: Vec<SessionSummary>, limit: usize) -> Vec<SessionSummary> {
    sessions.truncate(limit);
    sessions
}

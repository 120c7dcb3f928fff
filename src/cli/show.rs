//! `nova show` command implementation.

use crate::cli::render::{EMPTY_SESSION, format_message};
use crate::cli::setup::open_store;
use crate::config::Config;
use crate::core::{Session, SessionId};
use crate::error::{Error, Result};

/// Run the show command.
///
/// Prints the title and transcript of one session.
///
/// # Errors
///
/// Returns an error if the storage backend fails or the session is not found.
pub fn run(config: &Config, session_id: &str) -> Result<()> {
    let store = open_store(config)?;
    let id = SessionId::from(session_id);
    let session = store
        .get(&id)
        .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

    print!("{}", format_transcript(&id, session));
    Ok(())
}

/// Render a session as printable text.
#[must_use]
pub fn format_transcript(id: &SessionId, session: &Session) -> String {
    let mut out = format!("{} ({id})\n\n", session.title);
    if session.messages.is_empty() {
        out.push_str(EMPTY_SESSION);
        out.push('\n');
    }
    for message in &session.messages {
        out.push_str(&format_message(message));
        out.push('\n');
    }
    out
}

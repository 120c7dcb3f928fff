//! `nova send` command implementation.

use crate::attachment::load_attachment;
use crate::cli::setup::build_orchestrator;
use crate::config::Config;
use crate::core::{NoPrompt, SessionId, StdinPrompter, TurnOrchestrator, TurnOutcome};
use crate::error::{Error, Result};
use std::io::IsTerminal;
use std::path::Path;

/// Run the send command.
///
/// Sends one turn and prints the reply. Without `--session` a new session
/// is started, titled from the text or file.
///
/// # Errors
///
/// Returns an error if storage fails, the session or file is missing, or
/// there is nothing to send.
pub fn run(
    config: &Config,
    session_id: Option<&str>,
    file: Option<&Path>,
    text: &str,
) -> Result<()> {
    let mut orchestrator = if std::io::stdin().is_terminal() {
        build_orchestrator(config, &mut StdinPrompter)?
    } else {
        build_orchestrator(config, &mut NoPrompt)?
    };

    let reply = send_turn(&mut orchestrator, session_id, file, text)?;
    println!("{reply}");
    Ok(())
}

/// Open the target session, attach the file and run the turn.
///
/// # Errors
///
/// Returns an error if the session or file is missing, or the turn is empty.
pub fn send_turn(
    orchestrator: &mut TurnOrchestrator,
    session_id: Option<&str>,
    file: Option<&Path>,
    text: &str,
) -> Result<String> {
    if let Some(id) = session_id {
        if !orchestrator.open_session(&SessionId::from(id)) {
            return Err(Error::SessionNotFound(id.to_string()));
        }
    }

    if let Some(path) = file {
        orchestrator.attach(load_attachment(path)?);
    }

    match orchestrator.send(text)? {
        TurnOutcome::Settled(report) => Ok(report.reply),
        TurnOutcome::Empty => Err(Error::InvalidInput(
            "nothing to send: provide a message or --file".to_string(),
        )),
    }
}

//! `nova chat` command implementation.
//!
//! Interactive loop: plain lines are sent as turns, `/` lines are commands.

use crate::attachment::load_attachment;
use crate::cli::render::{ConsoleSink, format_session_list};
use crate::cli::setup::build_orchestrator;
use crate::config::Config;
use crate::core::{SessionId, StdinPrompter, TurnOrchestrator, TurnOutcome};
use crate::error::Result;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::warn;

const HELP: &str = "\
Commands:
  /new            start a new session
  /list           list sessions
  /open <id>      open a session
  /delete <id>    delete a session
  /attach <path>  attach a file to the next message
  /detach         drop the attached file
  /about          about nova
  /help           show this help
  /quit           exit
Anything else is sent as a message.";

const ABOUT: &str = "\
Nova AI: a terminal chat client for OpenRouter models.
Sessions are stored locally; text files are inlined into the prompt,
images are recorded in the transcript but not sent to the model.";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Send the line as a turn.
    Send(String),
    /// Start a new session.
    New,
    /// Print the session list.
    List,
    /// Open a session by id.
    Open(String),
    /// Delete a session by id.
    Delete(String),
    /// Attach a file to the next turn.
    Attach(PathBuf),
    /// Drop the pending file.
    Detach,
    /// Print the about text.
    About,
    /// Print the command list.
    Help,
    /// Leave the loop.
    Quit,
    /// Unrecognized or malformed command.
    Unknown(String),
}

/// Parse one input line.
#[must_use]
pub fn parse_line(line: &str) -> ChatCommand {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return ChatCommand::Send(trimmed.to_string());
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(n, a)| (n, a.trim()));

    match (name, arg.is_empty()) {
        ("new", true) => ChatCommand::New,
        ("list", true) => ChatCommand::List,
        ("open", false) => ChatCommand::Open(arg.to_string()),
        ("delete", false) => ChatCommand::Delete(arg.to_string()),
        ("attach", false) => ChatCommand::Attach(PathBuf::from(arg)),
        ("detach", true) => ChatCommand::Detach,
        ("about", true) => ChatCommand::About,
        ("help", true) => ChatCommand::Help,
        ("quit" | "exit", true) => ChatCommand::Quit,
        _ => ChatCommand::Unknown(trimmed.to_string()),
    }
}

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Stop.
    Quit,
}

/// Run the chat command.
///
/// # Errors
///
/// Returns an error if storage cannot be opened, key resolution fails, or
/// the terminal cannot be read or written.
pub fn run(config: &Config) -> Result<()> {
    let mut orchestrator = build_orchestrator(config, &mut StdinPrompter)?
        .with_sink(Box::new(ConsoleSink::new(io::stdout())));
    orchestrator.show_introduction();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        let prompt = match orchestrator.pending_file() {
            Some(file) => format!("[{}] > ", file.name),
            None => "> ".to_string(),
        };
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            writeln!(stdout)?;
            break;
        }

        if handle(&mut orchestrator, parse_line(&line), &mut stdout)? == Flow::Quit {
            break;
        }
    }

    Ok(())
}

/// Apply one command. Failures are reported on `out` and the loop goes on.
///
/// # Errors
///
/// Returns an error only if writing to `out` fails.
pub fn handle(
    orchestrator: &mut TurnOrchestrator,
    command: ChatCommand,
    out: &mut dyn Write,
) -> io::Result<Flow> {
    match command {
        ChatCommand::Send(text) => match orchestrator.send(&text) {
            Ok(TurnOutcome::Settled(_) | TurnOutcome::Empty) => {}
            Err(e) => {
                warn!(error = %e, "turn not started");
                writeln!(out, "Could not start a session: {e}")?;
            }
        },
        ChatCommand::New => {
            if let Err(e) = orchestrator.new_session() {
                writeln!(out, "Could not create a session: {e}")?;
            }
        }
        ChatCommand::List => {
            let store = orchestrator.store();
            if store.is_empty() {
                writeln!(out, "No sessions yet.")?;
            } else {
                write!(out, "{}", format_session_list(&store.list(), store.active()))?;
            }
        }
        ChatCommand::Open(id) => {
            if !orchestrator.open_session(&SessionId::from(id.as_str())) {
                writeln!(out, "No session {id}.")?;
            }
        }
        ChatCommand::Delete(id) => match orchestrator.delete_session(&SessionId::from(id.as_str())) {
            Ok(true) => writeln!(out, "Deleted {id}.")?,
            Ok(false) => writeln!(out, "No session {id}.")?,
            Err(e) => writeln!(out, "Could not delete {id}: {e}")?,
        },
        ChatCommand::Attach(path) => match load_attachment(&path) {
            Ok(file) => {
                writeln!(out, "File ready: {}", file.name)?;
                orchestrator.attach(file);
            }
            Err(e) => writeln!(out, "Could not attach {}: {e}", path.display())?,
        },
        ChatCommand::Detach => {
            if orchestrator.detach().is_none() {
                writeln!(out, "No file attached.")?;
            }
        }
        ChatCommand::About => writeln!(out, "{ABOUT}")?,
        ChatCommand::Help => writeln!(out, "{HELP}")?,
        ChatCommand::Quit => return Ok(Flow::Quit),
        ChatCommand::Unknown(input) => writeln!(out, "Unknown command: {input} (try /help)")?,
    }
    Ok(Flow::Continue)
}

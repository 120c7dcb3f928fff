//! nova CLI - terminal chat client for OpenRouter models.

use clap::{Parser, Subcommand};
use nova::cli;
use nova::config::load_config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nova")]
#[command(author, version, about = "Terminal chat client for OpenRouter models", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat.
    Chat,

    /// Send a single message and print the reply.
    Send {
        /// Session to continue. A new session is started when omitted.
        #[arg(short, long)]
        session: Option<String>,

        /// File to attach to the message.
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Message text.
        text: Vec<String>,
    },

    /// Create an empty session and print its id.
    New,

    /// List sessions, newest first.
    List {
        /// Maximum number of sessions to show. Defaults to 20.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print a session transcript.
    Show {
        /// Session ID.
        session_id: String,
    },

    /// Delete a session.
    Delete {
        /// Session ID.
        session_id: String,
    },
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("nova: error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Chat => cli::chat::run(&config),
        Commands::Send {
            session,
            file,
            text,
        } => cli::send::run(&config, session.as_deref(), file.as_deref(), &text.join(" ")),
        Commands::New => cli::new::run(&config),
        Commands::List { limit } => cli::list::run(&config, limit),
        Commands::Show { session_id } => cli::show::run(&config, &session_id),
        Commands::Delete { session_id } => cli::delete::run(&config, &session_id),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("nova: error: {e}");
            ExitCode::FAILURE
        }
    }
}

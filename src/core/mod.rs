//! Core types and turn logic.

pub mod credentials;
pub mod orchestrator;
pub mod prompt;
pub mod state;

pub use credentials::{KeyPrompter, NoPrompt, StdinPrompter, resolve_api_key};
pub use orchestrator::{
    MISSING_KEY_REPLY, NullSink, PENDING_INDICATOR, SnapshotSink, TurnOrchestrator, TurnOutcome,
    TurnPhase, TurnReport, UNREACHABLE_REPLY,
};
pub use prompt::build_prompt;
pub use state::{AttachedFile, Message, MessageKind, Session, SessionId, first_turn_title};

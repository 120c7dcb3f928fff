//! Turn orchestration: one user submission and the model's reply.
//!
//! A turn moves `Idle → Composing → AwaitingResponse → Settled → Idle`.
//! [`TurnOrchestrator::send`] takes `&mut self`, so turns against a store are
//! serialized; a second send cannot start while one is awaiting its reply.

use crate::completion::CompletionClient;
use crate::core::prompt::build_prompt;
use crate::core::state::{AttachedFile, Message, SessionId, first_turn_title};
use crate::error::Result;
use crate::storage::{SessionStore, Snapshot};
use tracing::{debug, info, warn};

/// Reply recorded when no API key could be resolved.
pub const MISSING_KEY_REPLY: &str =
    "System Error: No API Key detected. Please refresh and provide a key.";

/// Reply recorded when the request fails or the response cannot be parsed.
pub const UNREACHABLE_REPLY: &str =
    "System Error: Unable to reach core processor. Check your connection or API key.";

/// Transient indicator shown while a reply is outstanding. Never persisted.
pub const PENDING_INDICATOR: &str = "Computing...";

/// Where a turn currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    /// No turn in progress.
    #[default]
    Idle,
    /// Input accepted, prompt being built.
    Composing,
    /// User message recorded, waiting on the completion endpoint.
    AwaitingResponse,
    /// Reply recorded.
    Settled,
}

/// Rendering collaborator fed after every mutation.
pub trait SnapshotSink {
    /// Called with the session list and active transcript after each change.
    fn on_snapshot(&mut self, snapshot: &Snapshot);

    /// Called when a reply starts being awaited.
    fn on_pending(&mut self, _session: &SessionId, _indicator: &str) {}

    /// Called on every phase transition.
    fn on_phase(&mut self, _phase: TurnPhase) {}
}

/// Sink that ignores everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn on_snapshot(&mut self, _snapshot: &Snapshot) {}
}

/// Result of a settled turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Session the turn was recorded in.
    pub session: SessionId,

    /// Prompt sent to the model.
    pub prompt: String,

    /// Reply text, or one of the fixed error replies.
    pub reply: String,

    /// Whether `reply` is an absorbed failure.
    pub failed: bool,
}

/// What [`TurnOrchestrator::send`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Neither text nor a file was supplied; nothing happened.
    Empty,
    /// The turn ran to completion.
    Settled(TurnReport),
}

/// Drives request/response cycles against a [`SessionStore`].
pub struct TurnOrchestrator {
    store: SessionStore,
    client: Box<dyn CompletionClient>,
    api_key: Option<String>,
    model: String,
    pending_file: Option<AttachedFile>,
    phase: TurnPhase,
    sink: Box<dyn SnapshotSink>,
}

impl std::fmt::Debug for TurnOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnOrchestrator")
            .field("store", &self.store)
            .field("model", &self.model)
            .field("has_key", &self.api_key.is_some())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl TurnOrchestrator {
    /// Create an orchestrator over `store`.
    #[must_use]
    pub fn new(
        store: SessionStore,
        client: Box<dyn CompletionClient>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            store,
            client,
            api_key,
            model: model.into(),
            pending_file: None,
            phase: TurnPhase::Idle,
            sink: Box::new(NullSink),
        }
    }

    /// Attach a rendering collaborator.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn SnapshotSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Current turn phase.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Model identifier sent with each request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Hold `file` for the next turn, replacing any earlier one.
    pub fn attach(&mut self, file: AttachedFile) {
        debug!(name = %file.name, mime = %file.mime_type, "file attached");
        self.pending_file = Some(file);
    }

    /// Drop the pending file, returning it.
    pub fn detach(&mut self) -> Option<AttachedFile> {
        self.pending_file.take()
    }

    /// The file waiting for the next turn.
    #[must_use]
    pub fn pending_file(&self) -> Option<&AttachedFile> {
        self.pending_file.as_ref()
    }

    /// Create a session with the placeholder title and open it.
    ///
    /// # Errors
    ///
    /// Returns an error if the new session cannot be persisted.
    pub fn new_session(&mut self) -> Result<SessionId> {
        let id = self.store.create()?;
        self.store.activate(&id);
        self.emit();
        Ok(id)
    }

    /// Open an existing session. Returns false for unknown ids.
    pub fn open_session(&mut self, id: &SessionId) -> bool {
        let opened = self.store.activate(id);
        if opened {
            self.emit();
        }
        opened
    }

    /// Delete a session. Deleting the open session returns to the introduction state.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion cannot be persisted.
    pub fn delete_session(&mut self, id: &SessionId) -> Result<bool> {
        let deleted = self.store.delete(id)?;
        if deleted {
            self.emit();
        }
        Ok(deleted)
    }

    /// Close the open session without deleting it.
    pub fn show_introduction(&mut self) {
        self.store.clear_active();
        self.emit();
    }

    /// Return the active session, creating and opening one if there is none.
    ///
    /// A created session is titled from the turn's text or file.
    ///
    /// # Errors
    ///
    /// Returns an error if a new session cannot be persisted.
    pub fn ensure_active_session(
        &mut self,
        text: &str,
        file: Option<&AttachedFile>,
    ) -> Result<SessionId> {
        if let Some(id) = self.store.active() {
            if self.store.contains(id) {
                return Ok(id.clone());
            }
        }
        let id = self.store.create_titled(&first_turn_title(text, file))?;
        self.store.activate(&id);
        info!(session = %id, "started session from first turn");
        Ok(id)
    }

    /// Run one turn with `text` and the pending file.
    ///
    /// Completion failures never surface as errors: they become the fixed
    /// error replies and are recorded like any other reply. A failure to
    /// persist a message is logged and the turn carries on.
    ///
    /// # Errors
    ///
    /// Returns an error only when no session was active and a new one could
    /// not be persisted. The pending file is kept in that case.
    pub fn send(&mut self, text: &str) -> Result<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() && self.pending_file.is_none() {
            return Ok(TurnOutcome::Empty);
        }

        self.transition(TurnPhase::Composing);
        let file = self.pending_file.take();
        let prompt = build_prompt(text, file.as_ref());

        let session = match self.ensure_active_session(text, file.as_ref()) {
            Ok(id) => id,
            Err(e) => {
                self.pending_file = file;
                self.transition(TurnPhase::Idle);
                return Err(e);
            }
        };

        self.record(&session, Message::user(text, file));
        self.emit();

        self.transition(TurnPhase::AwaitingResponse);
        self.sink.on_pending(&session, PENDING_INDICATOR);

        let (reply, failed) = self.request_reply(&prompt);

        self.record(&session, Message::ai(reply.clone()));
        self.transition(TurnPhase::Settled);
        self.emit();
        self.transition(TurnPhase::Idle);

        Ok(TurnOutcome::Settled(TurnReport {
            session,
            prompt,
            reply,
            failed,
        }))
    }

    /// Ask the completion client, absorbing every failure into a fixed reply.
    fn request_reply(&self, prompt: &str) -> (String, bool) {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("no api key; skipping completion request");
            return (MISSING_KEY_REPLY.to_string(), true);
        };

        match self.client.complete(api_key, &self.model, prompt) {
            Ok(reply) => (reply, false),
            Err(e) => {
                warn!(error = %e, "completion request failed");
                (UNREACHABLE_REPLY.to_string(), true)
            }
        }
    }

    fn record(&mut self, session: &SessionId, message: Message) {
        match self.store.append(session, message) {
            Ok(true) => {}
            Ok(false) => warn!(session = %session, "session vanished before message was recorded"),
            Err(e) => warn!(session = %session, error = %e, "failed to persist message"),
        }
    }

    fn transition(&mut self, phase: TurnPhase) {
        debug!(from = ?self.phase, to = ?phase, "turn phase");
        self.phase = phase;
        self.sink.on_phase(phase);
    }

    fn emit(&mut self) {
        let snapshot = self.store.snapshot();
        self.sink.on_snapshot(&snapshot);
    }
}

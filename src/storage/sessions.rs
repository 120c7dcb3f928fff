//! Session store: the in-memory session mapping mirrored to a key-value backend.
//!
//! Every mutating call writes the whole mapping back under [`SESSIONS_KEY`]
//! before returning. Nothing is batched. A mutation whose write fails is
//! undone, so memory never runs ahead of what was persisted.

use crate::core::state::{Message, PLACEHOLDER_TITLE, Session, SessionId};
use crate::error::Result;
use crate::storage::traits::{KeyValueStore, SESSIONS_KEY};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Listing entry for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: SessionId,

    /// Session title.
    pub title: String,

    /// Creation time decoded from the identifier.
    pub created_at: Option<DateTime<Utc>>,

    /// Number of messages in the transcript.
    pub message_count: usize,
}

/// What a renderer needs after a mutation: the sidebar and the open transcript.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// All sessions, newest first.
    pub sessions: Vec<SessionSummary>,

    /// The active session, if any.
    pub active: Option<SessionId>,

    /// Messages of the active session (empty when none is active).
    pub transcript: Vec<Message>,
}

/// Durable bookkeeping of all sessions plus the active-session pointer.
///
/// The active pointer lives only in memory; a freshly opened store starts
/// with no active session.
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    sessions: BTreeMap<SessionId, Session>,
    active: Option<SessionId>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.sessions.len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Load the session mapping from `backend`, or start empty if none was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the saved blob is not a valid
    /// session mapping.
    pub fn open(backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        let sessions = match backend.get(SESSIONS_KEY)? {
            Some(blob) if !blob.trim().is_empty() => {
                serde_json::from_str::<Option<BTreeMap<SessionId, Session>>>(&blob)?
                    .unwrap_or_default()
            }
            _ => BTreeMap::new(),
        };
        debug!(count = sessions.len(), "loaded sessions");
        Ok(Self {
            backend,
            sessions,
            active: None,
        })
    }

    /// Write the full mapping to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn flush(&self) -> Result<()> {
        let blob = serde_json::to_string(&self.sessions)?;
        self.backend.set(SESSIONS_KEY, &blob)
    }

    /// Create an empty session with the placeholder title.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the session is not created.
    pub fn create(&mut self) -> Result<SessionId> {
        self.create_titled(PLACEHOLDER_TITLE)
    }

    /// Create an empty session with the given title.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the session is not created.
    pub fn create_titled(&mut self, title: &str) -> Result<SessionId> {
        let id = self.insert_at(Utc::now().timestamp_millis(), title);
        if let Err(e) = self.flush() {
            self.sessions.remove(&id);
            return Err(e);
        }
        Ok(id)
    }

    /// Insert a session keyed by `millis`, bumping forward past any taken id.
    fn insert_at(&mut self, millis: i64, title: &str) -> SessionId {
        let mut millis = millis;
        let mut id = SessionId::from_millis(millis);
        while self.sessions.contains_key(&id) {
            millis += 1;
            id = SessionId::from_millis(millis);
        }
        self.sessions.insert(id.clone(), Session::new(title));
        debug!(session = %id, title, "created session");
        id
    }

    /// Look up a session.
    #[must_use]
    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Whether a session exists.
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Append a message to a session.
    ///
    /// Returns `Ok(false)` without touching anything when `id` is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the message is not kept.
    pub fn append(&mut self, id: &SessionId, message: Message) -> Result<bool> {
        let Some(session) = self.sessions.get_mut(id) else {
            debug!(session = %id, "append to unknown session ignored");
            return Ok(false);
        };
        session.messages.push(message);
        if let Err(e) = self.flush() {
            if let Some(session) = self.sessions.get_mut(id) {
                session.messages.pop();
            }
            return Err(e);
        }
        Ok(true)
    }

    /// Delete a session, clearing the active pointer if it pointed there.
    ///
    /// Returns `Ok(false)` when `id` is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the session and pointer are restored.
    pub fn delete(&mut self, id: &SessionId) -> Result<bool> {
        let Some(removed) = self.sessions.remove(id) else {
            return Ok(false);
        };
        if let Err(e) = self.flush() {
            self.sessions.insert(id.clone(), removed);
            return Err(e);
        }
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        debug!(session = %id, "deleted session");
        Ok(true)
    }

    /// All sessions ordered by creation time, newest first.
    ///
    /// Identifiers without a parsable time component sort last.
    #[must_use]
    pub fn list(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions
            .iter()
            .map(|(id, session)| SessionSummary {
                id: id.clone(),
                title: session.title.clone(),
                created_at: id
                    .created_millis()
                    .and_then(DateTime::<Utc>::from_timestamp_millis),
                message_count: session.messages.len(),
            })
            .collect();

        summaries.sort_by(|a, b| newest_first(&a.id, &b.id));
        summaries
    }

    /// The active session id.
    #[must_use]
    pub fn active(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    /// Make `id` the active session. Returns false for unknown ids.
    pub fn activate(&mut self, id: &SessionId) -> bool {
        if self.sessions.contains_key(id) {
            self.active = Some(id.clone());
            true
        } else {
            false
        }
    }

    /// Return to the introduction state.
    pub fn clear_active(&mut self) {
        self.active = None;
    }

    /// Session list plus the active transcript.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let transcript = self
            .active
            .as_ref()
            .and_then(|id| self.sessions.get(id))
            .map(|s| s.messages.clone())
            .unwrap_or_default();
        Snapshot {
            sessions: self.list(),
            active: self.active.clone(),
            transcript,
        }
    }

    /// Number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// The full in-memory mapping.
    #[must_use]
    pub fn sessions(&self) -> &BTreeMap<SessionId, Session> {
        &self.sessions
    }
}

fn newest_first(a: &SessionId, b: &SessionId) -> Ordering {
    match (a.created_millis(), b.created_millis()) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::MemoryBackend;
    use proptest::prelude::*;

    fn open_store() -> (SessionStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = SessionStore::open(backend.clone()).unwrap();
        (store, backend)
    }

    fn persisted(backend: &MemoryBackend) -> BTreeMap<SessionId, Session> {
        backend
            .get(SESSIONS_KEY)
            .unwrap()
            .map(|blob| serde_json::from_str(&blob).unwrap())
            .unwrap_or_default()
    }

    #[test]
    fn opens_empty_without_blob() {
        let (store, backend) = open_store();
        assert!(store.is_empty());
        assert!(store.active().is_none());
        assert!(backend.is_empty()); // Opening never writes
    }

    #[test]
    fn opens_empty_on_null_blob() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set(SESSIONS_KEY, "null").unwrap();
        let store = SessionStore::open(backend).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_blob_is_an_error() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set(SESSIONS_KEY, "{ not json").unwrap();
        let result = SessionStore::open(backend);
        assert!(matches!(result, Err(Error::Serde(_))));
    }

    #[test]
    fn create_persists_placeholder_session() {
        let (mut store, backend) = open_store();
        let id = store.create().unwrap();

        assert_eq!(store.get(&id).unwrap().title, PLACEHOLDER_TITLE);
        assert!(store.get(&id).unwrap().messages.is_empty());
        assert_eq!(&persisted(&backend), store.sessions());
    }

    #[test]
    fn create_does_not_activate() {
        let (mut store, _backend) = open_store();
        store.create().unwrap();
        assert!(store.active().is_none());
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let (mut store, _backend) = open_store();
        let a = store.insert_at(1_000, "a");
        let b = store.insert_at(1_000, "b");
        let c = store.insert_at(1_000, "c");

        assert_eq!(a.as_str(), "sn_1000");
        assert_eq!(b.as_str(), "sn_1001");
        assert_eq!(c.as_str(), "sn_1002");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn rapid_creates_are_unique() {
        let (mut store, _backend) = open_store();
        for _ in 0..50 {
            store.create().unwrap();
        }
        assert_eq!(store.len(), 50);
    }

    #[test]
    fn append_adds_in_order() {
        let (mut store, backend) = open_store();
        let id = store.create_titled("hello...").unwrap();

        assert!(store.append(&id, Message::user("hello", None)).unwrap());
        assert!(store.append(&id, Message::ai("hi")).unwrap());

        let messages = &store.get(&id).unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text(), "hello");
        assert_eq!(messages[1].text(), "hi");
        assert_eq!(&persisted(&backend), store.sessions());
    }

    #[test]
    fn append_to_unknown_session_is_ignored() {
        let (mut store, backend) = open_store();
        let id = store.create().unwrap();
        let before = backend.get(SESSIONS_KEY).unwrap();

        let appended = store
            .append(&SessionId::from("sn_42"), Message::ai("stray"))
            .unwrap();

        assert!(!appended);
        assert!(store.get(&id).unwrap().messages.is_empty());
        assert_eq!(backend.get(SESSIONS_KEY).unwrap(), before);
    }

    #[test]
    fn delete_active_clears_pointer() {
        let (mut store, _backend) = open_store();
        let id = store.create().unwrap();
        assert!(store.activate(&id));

        assert!(store.delete(&id).unwrap());
        assert!(store.active().is_none());
    }

    #[test]
    fn delete_other_keeps_pointer() {
        let (mut store, _backend) = open_store();
        let active = store.create().unwrap();
        let other = store.create().unwrap();
        store.activate(&active);

        assert!(store.delete(&other).unwrap());
        assert_eq!(store.active(), Some(&active));
    }

    #[test]
    fn delete_unknown_returns_false() {
        let (mut store, _backend) = open_store();
        assert!(!store.delete(&SessionId::from("sn_1")).unwrap());
    }

    #[test]
    fn activate_unknown_returns_false() {
        let (mut store, _backend) = open_store();
        assert!(!store.activate(&SessionId::from("sn_1")));
        assert!(store.active().is_none());
    }

    #[test]
    fn list_orders_newest_first() {
        let (mut store, _backend) = open_store();
        store.insert_at(2_000, "middle");
        store.insert_at(3_000, "newest");
        store.insert_at(1_000, "oldest");

        let titles: Vec<String> = store.list().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn list_sorts_numerically_not_lexically() {
        let (mut store, _backend) = open_store();
        store.insert_at(9, "nine");
        store.insert_at(10, "ten");

        let titles: Vec<String> = store.list().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["ten", "nine"]);
    }

    #[test]
    fn list_puts_malformed_ids_last() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set(
                SESSIONS_KEY,
                r#"{"legacy":{"title":"old","messages":[]},"sn_5":{"title":"new","messages":[]}}"#,
            )
            .unwrap();
        let store = SessionStore::open(backend).unwrap();

        let ids: Vec<String> = store.list().into_iter().map(|s| s.id.to_string()).collect();
        assert_eq!(ids, vec!["sn_5", "legacy"]);
    }

    #[test]
    fn list_decodes_creation_time() {
        let (mut store, _backend) = open_store();
        store.insert_at(1_700_000_000_000, "t");
        let summary = &store.list()[0];
        assert_eq!(
            summary.created_at.unwrap().timestamp_millis(),
            1_700_000_000_000
        );
    }

    #[test]
    fn snapshot_reflects_active_transcript() {
        let (mut store, _backend) = open_store();
        let id = store.create().unwrap();
        store.append(&id, Message::user("q", None)).unwrap();

        assert!(store.snapshot().transcript.is_empty());

        store.activate(&id);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.active, Some(id));
        assert_eq!(snapshot.transcript.len(), 1);
        assert_eq!(snapshot.sessions.len(), 1);
    }

    #[test]
    fn reload_reproduces_messages_and_title() {
        let (mut store, backend) = open_store();
        let id = store.create_titled("hello...").unwrap();
        store.append(&id, Message::user("hello", None)).unwrap();
        store.append(&id, Message::ai("hi there")).unwrap();

        let reloaded = SessionStore::open(backend).unwrap();
        assert_eq!(reloaded.get(&id), store.get(&id));
        assert!(reloaded.active().is_none());
    }

    /// Backend whose writes can be switched off.
    #[derive(Default)]
    struct FlakyBackend {
        inner: MemoryBackend,
        fail_writes: std::sync::atomic::AtomicBool,
    }

    impl FlakyBackend {
        fn set_failing(&self, failing: bool) {
            self.fail_writes
                .store(failing, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl KeyValueStore for FlakyBackend {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(Error::Storage(std::io::Error::other("disk full")));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_create_leaves_no_session() {
        let backend = Arc::new(FlakyBackend::default());
        let mut store = SessionStore::open(backend.clone()).unwrap();
        backend.set_failing(true);

        assert!(store.create().is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn failed_append_is_undone() {
        let backend = Arc::new(FlakyBackend::default());
        let mut store = SessionStore::open(backend.clone()).unwrap();
        let id = store.create().unwrap();
        backend.set_failing(true);

        assert!(store.append(&id, Message::ai("lost")).is_err());
        assert!(store.get(&id).unwrap().messages.is_empty());
    }

    #[test]
    fn failed_delete_restores_session_and_pointer() {
        let backend = Arc::new(FlakyBackend::default());
        let mut store = SessionStore::open(backend.clone()).unwrap();
        let id = store.create().unwrap();
        store.activate(&id);
        backend.set_failing(true);

        assert!(store.delete(&id).is_err());
        assert!(store.contains(&id));
        assert_eq!(store.active(), Some(&id));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create,
        Append(usize, String),
        Delete(usize),
        AppendUnknown,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Create),
            (any::<usize>(), "[a-z ]{0,12}").prop_map(|(i, t)| Op::Append(i, t)),
            any::<usize>().prop_map(Op::Delete),
            Just(Op::AppendUnknown),
        ]
    }

    proptest! {
        #[test]
        fn persisted_blob_matches_memory(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let (mut store, backend) = open_store();
            for op in ops {
                let ids: Vec<SessionId> = store.sessions().keys().cloned().collect();
                match op {
                    Op::Create => {
                        store.create().unwrap();
                    }
                    Op::Append(i, text) if !ids.is_empty() => {
                        store.append(&ids[i % ids.len()], Message::user(&text, None)).unwrap();
                    }
                    Op::Delete(i) if !ids.is_empty() => {
                        store.delete(&ids[i % ids.len()]).unwrap();
                    }
                    Op::AppendUnknown => {
                        store.append(&SessionId::from("missing"), Message::ai("x")).unwrap();
                    }
                    _ => {}
                }
                if backend.get(SESSIONS_KEY).unwrap().is_some() {
                    prop_assert_eq!(&persisted(&backend), store.sessions());
                }
            }
        }

        #[test]
        fn list_is_newest_first_for_any_insertion_order(
            stamps in prop::collection::vec(0i64..1_000_000, 0..30)
        ) {
            let (mut store, _backend) = open_store();
            for millis in stamps {
                store.insert_at(millis, "t");
            }
            let listed: Vec<i64> = store
                .list()
                .iter()
                .map(|s| s.id.created_millis().unwrap())
                .collect();
            prop_assert_eq!(listed.len(), store.len());
            prop_assert!(listed.windows(2).all(|w| w[0] > w[1]));
        }
    }
}

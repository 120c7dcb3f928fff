//! Persistence: key-value backends and the session store built on them.

pub mod file;
pub mod memory;
pub mod sessions;
pub mod traits;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use sessions::{SessionStore, SessionSummary, Snapshot};
pub use traits::{API_KEY_KEY, KeyValueStore, SESSIONS_KEY};

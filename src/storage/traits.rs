//! Storage trait definitions.

use crate::error::Result;

/// Key under which the full session mapping is stored.
pub const SESSIONS_KEY: &str = "nova_pro_data";

/// Key under which an interactively entered API key is stored.
pub const API_KEY_KEY: &str = "nova_vault_key";

/// String key-value persistence used for the session blob and the API key.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn remove(&self, key: &str) -> Result<()>;
}

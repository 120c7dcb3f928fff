//! Session and message types.
//!
//! The serialized field names (`type`, `data`) match the blob layout stored
//! under the `nova_pro_data` key, so existing histories load unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of every generated session identifier.
const ID_PREFIX: &str = "sn_";

/// Title given to sessions created explicitly (before any input exists).
pub const PLACEHOLDER_TITLE: &str = "New Inquiry";

/// Title used for an implicit session when the first turn has neither text nor file name.
pub const FALLBACK_TITLE: &str = "File Analysis";

/// Number of characters of the first input kept in an implicit session title.
const TITLE_CHARS: usize = 20;

/// Session identifier of the form `sn_<unix-millis>`.
///
/// The time component doubles as the listing sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Build an identifier from a creation timestamp in milliseconds.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        Self(format!("{ID_PREFIX}{millis}"))
    }

    /// The creation timestamp encoded in the identifier, if well-formed.
    #[must_use]
    pub fn created_millis(&self) -> Option<i64> {
        self.0.split_once('_')?.1.parse().ok()
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A named conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Display label, fixed at creation.
    pub title: String,

    /// Messages in display order. Only ever appended to.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    /// Create an empty session with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            messages: Vec::new(),
        }
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Typed (or attached) by the user.
    User,
    /// Returned by the completion endpoint, or an absorbed error string.
    Ai,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Text content, absent for file-only turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Author of the message.
    #[serde(rename = "type")]
    pub kind: MessageKind,

    /// Attachment sent with a user turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<AttachedFile>,
}

impl Message {
    /// A user turn. Empty text is stored as absent.
    #[must_use]
    pub fn user(text: &str, file: Option<AttachedFile>) -> Self {
        Self {
            text: non_empty(text),
            kind: MessageKind::User,
            file,
        }
    }

    /// A reply (or absorbed failure) from the model.
    #[must_use]
    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            kind: MessageKind::Ai,
            file: None,
        }
    }

    /// Text content, or the empty string.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// A file attached to a user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    /// Original file name.
    pub name: String,

    /// MIME type, e.g. `image/png` or `text/plain`.
    #[serde(rename = "type")]
    pub mime_type: String,

    /// Data URL for images, decoded text for everything else.
    #[serde(rename = "data")]
    pub payload: String,
}

impl AttachedFile {
    /// Whether the payload is an image data URL.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Title for a session created implicitly by its first turn.
///
/// Uses the first 20 characters of the text followed by `...`, else the
/// attached file name, else [`FALLBACK_TITLE`].
#[must_use]
pub fn first_turn_title(text: &str, file: Option<&AttachedFile>) -> String {
    let text = text.trim();
    if !text.is_empty() {
        let head: String = text.chars().take(TITLE_CHARS).collect();
        return format!("{head}...");
    }
    file.map_or_else(|| FALLBACK_TITLE.to_string(), |f| f.name.clone())
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

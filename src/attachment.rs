//! Loading local files into attachments.

use crate::core::state::AttachedFile;
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fs;
use std::path::Path;

/// Infer the MIME type from a file name, falling back to `application/octet-stream`.
#[must_use]
pub fn infer_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

/// Read a file into an [`AttachedFile`].
///
/// Images become a `data:` URL; every other type is read as text, with
/// invalid UTF-8 replaced.
///
/// # Errors
///
/// Returns an error if the path has no file name or cannot be read.
pub fn load_attachment(path: &Path) -> Result<AttachedFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidInput(format!("not a file: {}", path.display())))?;
    let mime_type = infer_mime_type(path);
    let bytes = fs::read(path)?;

    let payload = if mime_type.starts_with("image/") {
        format!("data:{mime_type};base64,{}", STANDARD.encode(&bytes))
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    Ok(AttachedFile {
        name,
        mime_type,
        payload,
    })
}

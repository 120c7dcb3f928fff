//! Outgoing prompt construction.

use crate::core::state::AttachedFile;

/// Stand-in user message when a text file is sent without any typed text.
pub const DEFAULT_FILE_REQUEST: &str = "Please analyze this file.";

/// Build the prompt sent to the model for one turn.
///
/// Text attachments are inlined ahead of the user's message. Images are not
/// transmitted, so an image turn sends only the typed text.
#[must_use]
pub fn build_prompt(text: &str, file: Option<&AttachedFile>) -> String {
    match file {
        Some(file) if !file.is_image() => {
            let request = if text.is_empty() {
                DEFAULT_FILE_REQUEST
            } else {
                text
            };
            format!(
                "[FILE ATTACHED: {}]\n{}\n\n[USER MESSAGE]: {request}",
                file.name, file.payload
            )
        }
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime_type: &str, payload: &str) -> AttachedFile {
        AttachedFile {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            payload: payload.to_string(),
        }
    }

    #[test]
    fn text_only_is_sent_verbatim() {
        assert_eq!(build_prompt("hello", None), "hello");
    }

    #[test]
    fn text_file_is_inlined() {
        let notes = file("notes.txt", "text/plain", "line1");
        assert_eq!(
            build_prompt("hello", Some(&notes)),
            "[FILE ATTACHED: notes.txt]\nline1\n\n[USER MESSAGE]: hello"
        );
    }

    #[test]
    fn text_file_without_message_asks_for_analysis() {
        let notes = file("notes.txt", "text/plain", "line1");
        assert_eq!(
            build_prompt("", Some(&notes)),
            "[FILE ATTACHED: notes.txt]\nline1\n\n[USER MESSAGE]: Please analyze this file."
        );
    }

    #[test]
    fn image_is_not_injected() {
        let cat = file("cat.png", "image/png", "data:image/png;base64,AAAA");
        assert_eq!(build_prompt("what is this?", Some(&cat)), "what is this?");
    }

    #[test]
    fn image_without_text_sends_empty_prompt() {
        let cat = file("cat.png", "image/png", "data:image/png;base64,AAAA");
        assert_eq!(build_prompt("", Some(&cat)), "");
    }
}

//! Console rendering of transcripts and session lists.

use crate::core::{Message, MessageKind, SessionId, SnapshotSink};
use crate::storage::{SessionSummary, Snapshot};
use chrono::{DateTime, Local, Utc};
use std::io::Write;

/// Shown when no session is open.
pub const INTRODUCTION: &str = "\
✦ Welcome to Nova AI
Your neural interface for advanced computation and creative synthesis.
State your objective to begin the session. Type /help for commands.";

/// Shown when an empty session is opened.
pub const EMPTY_SESSION: &str = "Neural Link Established\nAwaiting command...";

const PDF_MIME: &str = "application/pdf";

/// Maximum title width in listings.
const TITLE_PREVIEW_LEN: usize = 40;

/// Format one transcript entry.
#[must_use]
pub fn format_message(message: &Message) -> String {
    let label = match message.kind {
        MessageKind::User => "you> ",
        MessageKind::Ai => "nova> ",
    };
    let mut out = String::from(label);
    out.push_str(message.text());

    if let Some(file) = &message.file {
        if message.text.is_some() {
            out.push('\n');
            out.push_str(&" ".repeat(label.len()));
        }
        let marker = if file.is_image() {
            "image"
        } else if file.mime_type == PDF_MIME {
            "pdf"
        } else {
            "file"
        };
        out.push_str(&format!("[{marker}: {}]", file.name));
    }
    out
}

/// Format the session listing, marking the active session with `*`.
#[must_use]
pub fn format_session_list(sessions: &[SessionSummary], active: Option<&SessionId>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "  {:<18} {:<17} {:>5}  Title\n",
        "Session ID", "Created", "Msgs"
    ));
    out.push_str(&"─".repeat(80));
    out.push('\n');
    for summary in sessions {
        let marker = if Some(&summary.id) == active { '*' } else { ' ' };
        let created = summary
            .created_at
            .map_or_else(|| "-".to_string(), format_local_time);
        out.push_str(&format!(
            "{marker} {:<18} {:<17} {:>5}  {}\n",
            summary.id.as_str(),
            created,
            summary.message_count,
            truncate(&summary.title, TITLE_PREVIEW_LEN)
        ));
    }
    out
}

/// Format UTC time as local time for display.
fn format_local_time(utc: DateTime<Utc>) -> String {
    let local: DateTime<Local> = utc.into();
    local.format("%Y-%m-%d %H:%M").to_string()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars).collect();
        format!("{head}…")
    } else {
        s.to_string()
    }
}

/// Prints transcript changes as they happen.
///
/// Opening a session prints its whole transcript; later snapshots print only
/// the messages added since.
#[derive(Debug)]
pub struct ConsoleSink<W: Write> {
    out: W,
    shown_session: Option<SessionId>,
    shown_messages: usize,
}

impl<W: Write> ConsoleSink<W> {
    /// Create a sink writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            shown_session: None,
            shown_messages: 0,
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, snapshot: &Snapshot) -> std::io::Result<()> {
        if snapshot.active != self.shown_session {
            self.shown_session.clone_from(&snapshot.active);
            self.shown_messages = 0;
            match &snapshot.active {
                None => writeln!(self.out, "\n{INTRODUCTION}\n")?,
                Some(id) => {
                    writeln!(self.out, "── {id} ──")?;
                    if snapshot.transcript.is_empty() {
                        writeln!(self.out, "{EMPTY_SESSION}")?;
                    }
                }
            }
        }

        for message in snapshot.transcript.iter().skip(self.shown_messages) {
            writeln!(self.out, "{}", format_message(message))?;
        }
        self.shown_messages = snapshot.transcript.len();
        self.out.flush()
    }
}

impl<W: Write> SnapshotSink for ConsoleSink<W> {
    fn on_snapshot(&mut self, snapshot: &Snapshot) {
        if let Err(e) = self.render(snapshot) {
            tracing::warn!(error = %e, "failed to render transcript");
        }
    }

    fn on_pending(&mut self, _session: &SessionId, indicator: &str) {
        if let Err(e) = writeln!(self.out, "nova> {indicator}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "failed to render pending indicator");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AttachedFile;

    fn file(name: &str, mime_type: &str) -> AttachedFile {
        AttachedFile {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            payload: String::new(),
        }
    }

    fn snapshot(active: Option<&str>, transcript: Vec<Message>) -> Snapshot {
        Snapshot {
            sessions: Vec::new(),
            active: active.map(SessionId::from),
            transcript,
        }
    }

    fn output(sink: ConsoleSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn formats_plain_messages() {
        assert_eq!(format_message(&Message::user("hello", None)), "you> hello");
        assert_eq!(format_message(&Message::ai("hi")), "nova> hi");
    }

    #[test]
    fn formats_attachment_markers() {
        let msg = Message::user("look", Some(file("cat.png", "image/png")));
        assert_eq!(format_message(&msg), "you> look\n     [image: cat.png]");

        let msg = Message::user("", Some(file("notes.txt", "text/plain")));
        assert_eq!(format_message(&msg), "you> [file: notes.txt]");

        let msg = Message::user("", Some(file("paper.pdf", "application/pdf")));
        assert_eq!(format_message(&msg), "you> [pdf: paper.pdf]");
    }

    #[test]
    fn session_list_marks_active() {
        let sessions = vec![
            SessionSummary {
                id: SessionId::from("sn_2"),
                title: "second".to_string(),
                created_at: None,
                message_count: 2,
            },
            SessionSummary {
                id: SessionId::from("sn_1"),
                title: "first".to_string(),
                created_at: None,
                message_count: 0,
            },
        ];
        let active = SessionId::from("sn_1");
        let listing = format_session_list(&sessions, Some(&active));
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("  sn_2"));
        assert!(lines[3].starts_with("* sn_1"));
        assert!(lines[3].ends_with("first"));
    }

    #[test]
    fn truncate_long_titles() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 10), "abcdefghij…");
    }

    #[test]
    fn sink_prints_only_new_messages() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.on_snapshot(&snapshot(Some("sn_1"), vec![Message::user("q", None)]));
        sink.on_snapshot(&snapshot(
            Some("sn_1"),
            vec![Message::user("q", None), Message::ai("a")],
        ));

        let out = output(sink);
        assert_eq!(out.matches("you> q").count(), 1);
        assert!(out.contains("nova> a"));
    }

    #[test]
    fn sink_replays_transcript_on_session_switch() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.on_snapshot(&snapshot(Some("sn_1"), vec![Message::ai("one")]));
        sink.on_snapshot(&snapshot(Some("sn_2"), vec![Message::ai("two")]));
        sink.on_snapshot(&snapshot(Some("sn_1"), vec![Message::ai("one")]));

        let out = output(sink);
        assert_eq!(out.matches("nova> one").count(), 2);
        assert!(out.contains("── sn_2 ──"));
    }

    #[test]
    fn sink_shows_introduction_and_empty_session() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.on_snapshot(&snapshot(Some("sn_1"), Vec::new()));
        sink.on_snapshot(&snapshot(None, Vec::new()));

        let out = output(sink);
        assert!(out.contains("Awaiting command..."));
        assert!(out.contains("Welcome to Nova AI"));
    }

    /// Writer that rejects every write.
    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn sink_survives_closed_output() {
        let mut sink = ConsoleSink::new(Closed);
        sink.on_pending(&SessionId::from("sn_1"), "Computing...");
        sink.on_snapshot(&snapshot(Some("sn_1"), vec![Message::ai("a")]));
    }

    #[test]
    fn sink_prints_pending_indicator() {
        let mut sink = ConsoleSink::new(Vec::new());
        sink.on_pending(&SessionId::from("sn_1"), "Computing...");
        assert_eq!(output(sink), "nova> Computing...\n");
    }
}

//! # Thread Snapshots
//!
//! The assistant session owns the conversation; we only read what it writes.
//! A snapshot is a JSON file in one of two shapes:
//!
//! ```text
//! { "trace_id": "...", "title": "...", "messages": [ ... ] }
//! [ ... ]                                  // bare message list
//! ```
//!
//! The viewer polls the file's mtime and reloads when it changes.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::thread::{Message, MessageKind};

/// Max characters of a derived title before it is cut with `...`.
const TITLE_MAX_CHARS: usize = 60;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ThreadSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Full(ThreadSnapshot),
    Bare(Vec<Message>),
}

#[derive(Debug)]
pub enum SnapshotError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "snapshot I/O error: {e}"),
            SnapshotError::Parse(e) => write!(f, "snapshot parse error: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

pub fn parse_snapshot(json: &str) -> Result<ThreadSnapshot, SnapshotError> {
    let file: SnapshotFile = serde_json::from_str(json).map_err(SnapshotError::Parse)?;
    Ok(match file {
        SnapshotFile::Full(snapshot) => snapshot,
        SnapshotFile::Bare(messages) => ThreadSnapshot {
            messages,
            ..Default::default()
        },
    })
}

pub fn load_snapshot(path: &Path) -> Result<ThreadSnapshot, SnapshotError> {
    let contents = fs::read_to_string(path).map_err(SnapshotError::Io)?;
    let snapshot = parse_snapshot(&contents)?;
    debug!(
        "Loaded snapshot {} ({} messages)",
        path.display(),
        snapshot.messages.len()
    );
    Ok(snapshot)
}

/// Last modification time, or None if the file is unreadable.
pub fn snapshot_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl ThreadSnapshot {
    /// Explicit title, else one derived from the first human message.
    pub fn display_title(&self) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| derive_title(&self.messages))
    }
}

/// Derive a title from the first human message in the conversation.
/// Returns the first line, truncated to 60 chars.
pub fn derive_title(messages: &[Message]) -> String {
    let first_human = messages.iter().find_map(|m| match &m.kind {
        MessageKind::Human { content } => Some(content),
        _ => None,
    });
    let Some(content) = first_human else {
        return "Untitled".to_string();
    };

    let first_line = content.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return "Untitled".to_string();
    }
    if first_line.chars().count() > TITLE_MAX_CHARS {
        let cut: String = first_line.chars().take(TITLE_MAX_CHARS - 3).collect();
        return format!("{cut}...");
    }
    first_line.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_snapshot() {
        let snapshot = parse_snapshot(
            r#"{"trace_id":"t-9","title":"Signups","messages":[
                {"type":"human","content":"How many signups?"},
                {"type":"ai","content":"42"}]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.trace_id.as_deref(), Some("t-9"));
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.display_title(), "Signups");
    }

    #[test]
    fn parses_bare_message_list() {
        let snapshot =
            parse_snapshot(r#"[{"type":"human","content":"hi"},{"type":"ai/future"}]"#).unwrap();
        assert_eq!(snapshot.trace_id, None);
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.messages[1].kind, MessageKind::Unknown);
        assert_eq!(snapshot.display_title(), "hi");
    }

    #[test]
    fn malformed_snapshot_is_parse_error() {
        assert!(matches!(
            parse_snapshot("{not json"),
            Err(SnapshotError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_snapshot(&dir.path().join("nope.json")),
            Err(SnapshotError::Io(_))
        ));
        assert_eq!(snapshot_mtime(&dir.path().join("nope.json")), None);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"type":"human","content":"from disk"}}]"#).unwrap();
        let snapshot = load_snapshot(file.path()).unwrap();
        assert_eq!(snapshot.messages, vec![Message::human("from disk")]);
        assert!(snapshot_mtime(file.path()).is_some());
    }

    #[test]
    fn derive_title_truncates_by_chars() {
        let long = "é".repeat(80);
        let title = derive_title(&[Message::human(long)]);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn derive_title_without_human_is_untitled() {
        assert_eq!(derive_title(&[Message::assistant("hello")]), "Untitled");
        assert_eq!(derive_title(&[Message::human("   ")]), "Untitled");
    }

    #[test]
    fn derive_title_uses_first_line() {
        assert_eq!(
            derive_title(&[Message::human("first line\nsecond line")]),
            "first line"
        );
    }
}

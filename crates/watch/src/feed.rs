//! The cross-agent file-activity feed.
//!
//! Tool-call records whose tool mutates files are reshaped into
//! [`FileActivity`] entries so a single feed can show "who is changing
//! what" across every agent. Everything else is filtered out.

use chrono::{DateTime, Utc};
use hivelog_core::record::{LogRecord, RecordBody};
use serde::Serialize;

/// Tools whose invocation counts as a file mutation.
pub const FILE_MUTATING_TOOLS: &[&str] = &[
    "write_file",
    "edit_file",
    "append_file",
    "delete_file",
    "edit_page",
    "create_page",
    "generate_image",
    "commit_changes",
];

/// Argument keys checked, in order, for the affected path.
const PATH_KEYS: &[&str] = &["path", "file_path", "file", "page", "title"];

/// Line counts for a mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileChanges {
    pub added: u32,
    pub removed: u32,
}

/// One entry in the file-activity feed.
#[derive(Debug, Clone, Serialize)]
pub struct FileActivity {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub agent_id: String,
    pub file_path: String,
    pub action: String,
    pub changes: FileChanges,
    pub timestamp: DateTime<Utc>,
}

impl FileActivity {
    /// Reshape a log record, or `None` if it is not a well-formed call to
    /// a file-mutating tool.
    pub fn from_record(agent_id: &str, record: &LogRecord) -> Option<Self> {
        let RecordBody::ToolCall { tool, args, error } = &record.body else {
            return None;
        };
        if error.is_some() || !FILE_MUTATING_TOOLS.contains(&tool.as_str()) {
            return None;
        }

        let file_path = PATH_KEYS
            .iter()
            .find_map(|key| args.get(key).and_then(|v| v.as_str()))?
            .to_string();

        Some(Self {
            kind: "file_changed",
            agent_id: agent_id.to_string(),
            file_path,
            action: tool.clone(),
            changes: count_changes(args),
            timestamp: record.timestamp,
        })
    }
}

/// Estimate added/removed lines from the call arguments: a `diff` field
/// is counted by +/- prefixes, plain `content` counts as all-added.
fn count_changes(args: &serde_json::Value) -> FileChanges {
    if let Some(diff) = args.get("diff").and_then(|v| v.as_str()) {
        let mut changes = FileChanges::default();
        for line in diff.lines() {
            if line.starts_with("+++") || line.starts_with("---") {
                continue;
            }
            if line.starts_with('+') {
                changes.added += 1;
            } else if line.starts_with('-') {
                changes.removed += 1;
            }
        }
        return changes;
    }

    if let Some(content) = args.get("content").and_then(|v| v.as_str()) {
        return FileChanges {
            added: content.lines().count() as u32,
            removed: 0,
        };
    }

    FileChanges::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_mutating_tool_is_ignored() {
        let record = LogRecord::tool_call("web_search", serde_json::json!({"q": "rust"}), None);
        assert!(FileActivity::from_record("scribe", &record).is_none());
    }

    #[test]
    fn malformed_call_is_ignored() {
        let record = LogRecord::tool_call(
            "edit_file",
            serde_json::Value::String("{broken".into()),
            Some("not valid JSON".into()),
        );
        assert!(FileActivity::from_record("scribe", &record).is_none());
    }

    #[test]
    fn content_counts_as_added_lines() {
        let record = LogRecord::tool_call(
            "write_file",
            serde_json::json!({"path": "notes/today.md", "content": "one\ntwo\nthree"}),
            None,
        );
        let activity = FileActivity::from_record("scribe", &record).unwrap();
        assert_eq!(activity.kind, "file_changed");
        assert_eq!(activity.agent_id, "scribe");
        assert_eq!(activity.file_path, "notes/today.md");
        assert_eq!(activity.action, "write_file");
        assert_eq!(activity.changes, FileChanges { added: 3, removed: 0 });
    }

    #[test]
    fn diff_counts_both_directions() {
        let diff = "--- a/page\n+++ b/page\n-old line\n+new line\n+another\n context";
        let record = LogRecord::tool_call(
            "edit_page",
            serde_json::json!({"page": "Home", "diff": diff}),
            None,
        );
        let activity = FileActivity::from_record("curator", &record).unwrap();
        assert_eq!(activity.file_path, "Home");
        assert_eq!(activity.changes, FileChanges { added: 2, removed: 1 });
    }

    #[test]
    fn missing_path_is_ignored() {
        let record = LogRecord::tool_call("write_file", serde_json::json!({"content": "x"}), None);
        assert!(FileActivity::from_record("scribe", &record).is_none());
    }

    #[test]
    fn serializes_to_wire_shape() {
        let record = LogRecord::tool_call(
            "delete_file",
            serde_json::json!({"path": "old.md"}),
            None,
        );
        let activity = FileActivity::from_record("scribe", &record).unwrap();
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"].as_str(), Some("file_changed"));
        assert_eq!(json["agent_id"].as_str(), Some("scribe"));
        assert_eq!(json["changes"]["added"].as_u64(), Some(0));
    }
}

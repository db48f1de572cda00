//! Filesystem-backed append-only record store.

use hivelog_core::error::LogError;
use hivelog_core::event::AgentStatus;
use hivelog_core::record::LogRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Append-only JSONL store, one file per agent.
#[derive(Debug, Clone)]
pub struct LogStore {
    base_dir: PathBuf,
}

impl LogStore {
    /// Create a store rooted at `base_dir`. The directory is created on
    /// first append.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// The directory holding all agent logs.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of an agent's log file.
    pub fn path(&self, agent_id: &str) -> PathBuf {
        self.base_dir.join(format!("{agent_id}.jsonl"))
    }

    /// Current byte length of an agent's log (0 if it does not exist yet).
    pub fn len(&self, agent_id: &str) -> u64 {
        fs::metadata(self.path(agent_id))
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Append one record as a complete line.
    pub fn append(&self, agent_id: &str, record: &LogRecord) -> Result<(), LogError> {
        fs::create_dir_all(&self.base_dir)
            .map_err(|e| LogError::Storage(format!("create {}: {e}", self.base_dir.display())))?;

        let mut line = serde_json::to_string(record)
            .map_err(|e| LogError::Serialization(e.to_string()))?;
        line.push('\n');

        let path = self.path(agent_id);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LogError::Storage(format!("open {}: {e}", path.display())))?;

        // One write_all per record keeps the line intact under O_APPEND
        // even when an external controller appends concurrently.
        file.write_all(line.as_bytes())
            .map_err(|e| LogError::Storage(format!("append {}: {e}", path.display())))?;

        Ok(())
    }

    /// Append a control status record on behalf of `source`.
    pub fn append_control(
        &self,
        agent_id: &str,
        status: AgentStatus,
        source: &str,
    ) -> Result<(), LogError> {
        self.append(agent_id, &LogRecord::status(status, source))
    }

    /// Append a user message for a waiting agent to pick up.
    pub fn append_user_message(&self, agent_id: &str, content: &str) -> Result<(), LogError> {
        self.append(agent_id, &LogRecord::user_message(content))
    }

    /// Read every complete record starting at byte `offset`, returning the
    /// records and the offset just past the last complete line consumed.
    ///
    /// A trailing line without a terminating newline is a write in
    /// progress and is not consumed. A complete line that fails to parse
    /// is skipped with a warning, but its bytes are consumed — a corrupt
    /// record must not wedge the reader.
    pub fn read_from(
        &self,
        agent_id: &str,
        offset: u64,
    ) -> Result<(Vec<LogRecord>, u64), LogError> {
        let path = self.path(agent_id);
        let mut file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), offset)),
            Err(e) => return Err(LogError::Storage(format!("open {}: {e}", path.display()))),
        };

        file.seek(SeekFrom::Start(offset))
            .map_err(|e| LogError::Storage(format!("seek {}: {e}", path.display())))?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| LogError::Storage(format!("read {}: {e}", path.display())))?;

        let mut records = Vec::new();
        let mut consumed = 0usize;
        let mut start = 0usize;

        while let Some(rel_end) = buf[start..].iter().position(|&b| b == b'\n') {
            let end = start + rel_end;
            let line = &buf[start..end];
            consumed = end + 1;
            start = end + 1;

            if line.is_empty() {
                continue;
            }
            match serde_json::from_slice::<LogRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        agent_id,
                        error = %e,
                        "Skipping malformed log record"
                    );
                }
            }
        }

        Ok((records, offset + consumed as u64))
    }

    /// Read the full log from the start.
    pub fn read_all(&self, agent_id: &str) -> Result<Vec<LogRecord>, LogError> {
        self.read_from(agent_id, 0).map(|(records, _)| records)
    }

    /// IDs of all agents with a log file in this store.
    pub fn list_agents(&self) -> Result<Vec<String>, LogError> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(e) => e,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(LogError::Storage(format!(
                    "read_dir {}: {err}",
                    self.base_dir.display()
                )));
            }
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jsonl")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivelog_core::message::Role;
    use hivelog_core::record::RecordBody;

    fn store() -> (tempfile::TempDir, LogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn append_and_read_all() {
        let (_dir, store) = store();
        store
            .append("scribe", &LogRecord::message(Role::Assistant, "Hello"))
            .unwrap();
        store
            .append("scribe", &LogRecord::status(AgentStatus::Running, "runner"))
            .unwrap();

        let records = store.read_all("scribe").unwrap();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0].body, RecordBody::Message { .. }));
        assert_eq!(records[1].as_status(), Some(AgentStatus::Running));
    }

    #[test]
    fn read_from_offset_never_rereads() {
        let (_dir, store) = store();
        store
            .append("scribe", &LogRecord::message(Role::Assistant, "one"))
            .unwrap();
        let (first, offset) = store.read_from("scribe", 0).unwrap();
        assert_eq!(first.len(), 1);

        store
            .append("scribe", &LogRecord::message(Role::Assistant, "two"))
            .unwrap();
        let (second, offset2) = store.read_from("scribe", offset).unwrap();
        assert_eq!(second.len(), 1);
        match &second[0].body {
            RecordBody::Message { content, .. } => assert_eq!(content, "two"),
            _ => panic!("Expected message"),
        }

        // Nothing new: empty read, offset stable.
        let (third, offset3) = store.read_from("scribe", offset2).unwrap();
        assert!(third.is_empty());
        assert_eq!(offset3, offset2);
    }

    #[test]
    fn torn_trailing_line_is_not_consumed() {
        let (_dir, store) = store();
        store
            .append("scribe", &LogRecord::message(Role::Assistant, "done"))
            .unwrap();

        // Simulate a write in progress: bytes without a newline.
        let mut file = OpenOptions::new()
            .append(true)
            .open(store.path("scribe"))
            .unwrap();
        file.write_all(br#"{"timestamp":"2026-"#).unwrap();

        let (records, offset) = store.read_from("scribe", 0).unwrap();
        assert_eq!(records.len(), 1);

        // Complete the line; the next read picks it up from the offset.
        file.write_all(
            br#"08-06T12:00:00Z","type":"user_message","content":"now"}"#,
        )
        .unwrap();
        file.write_all(b"\n").unwrap();

        let (more, _) = store.read_from("scribe", offset).unwrap();
        assert_eq!(more.len(), 1);
        assert!(matches!(more[0].body, RecordBody::UserMessage { .. }));
    }

    #[test]
    fn malformed_complete_line_is_skipped() {
        let (_dir, store) = store();
        store
            .append("scribe", &LogRecord::message(Role::Assistant, "ok"))
            .unwrap();
        let mut file = OpenOptions::new()
            .append(true)
            .open(store.path("scribe"))
            .unwrap();
        file.write_all(b"this is not json\n").unwrap();
        store.append_user_message("scribe", "still works").unwrap();

        let records = store.read_all("scribe").unwrap();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[1].body, RecordBody::UserMessage { .. }));
    }

    #[test]
    fn missing_file_reads_empty() {
        let (_dir, store) = store();
        let (records, offset) = store.read_from("ghost", 0).unwrap();
        assert!(records.is_empty());
        assert_eq!(offset, 0);
        assert_eq!(store.len("ghost"), 0);
    }

    #[test]
    fn control_append_is_a_status_record() {
        let (_dir, store) = store();
        store
            .append_control("scribe", AgentStatus::Paused, "cli")
            .unwrap();
        let records = store.read_all("scribe").unwrap();
        assert_eq!(records[0].as_status(), Some(AgentStatus::Paused));
        match &records[0].body {
            RecordBody::Status { source, .. } => assert_eq!(source.as_deref(), Some("cli")),
            _ => panic!("Expected status"),
        }
    }

    #[test]
    fn list_agents_sorted() {
        let (_dir, store) = store();
        store.append_user_message("zeta", "hi").unwrap();
        store.append_user_message("alpha", "hi").unwrap();
        assert_eq!(store.list_agents().unwrap(), vec!["alpha", "zeta"]);
    }
}

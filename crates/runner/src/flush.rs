//! Line-granular flush buffering.
//!
//! Token events are too fine to persist one-per-record and whole turns
//! are too coarse to watch live. The sink buffers streamed text and
//! thinking separately and flushes:
//! - each complete line as soon as its newline arrives,
//! - both buffers (text first, then thinking) when a tool call, tool
//!   result, or status event interrupts the stream,
//! - any remainder at turn end.
//!
//! Concatenating the flushed records of a turn (joined with newlines)
//! reproduces the streamed text.

use async_trait::async_trait;
use hivelog_core::error::Error;
use hivelog_core::event::AgentEvent;
use hivelog_core::message::Role;
use hivelog_core::record::{LogRecord, RecordBody};
use hivelog_log::LogStore;
use std::sync::Arc;

/// The source tag on status records written on behalf of the engine.
pub const AGENT_SOURCE: &str = "agent";

/// An [`EventSink`](hivelog_core::sink::EventSink) that turns engine
/// events into durable log records.
pub struct RecordSink {
    store: Arc<LogStore>,
    agent_id: String,
    text_buf: String,
    thinking_buf: String,
}

impl RecordSink {
    pub fn new(store: Arc<LogStore>, agent_id: impl Into<String>) -> Self {
        Self {
            store,
            agent_id: agent_id.into(),
            text_buf: String::new(),
            thinking_buf: String::new(),
        }
    }

    /// Flush everything still buffered. Called at turn end.
    pub fn finish_turn(&mut self) -> Result<(), Error> {
        self.flush_all()
    }

    fn append(&self, record: &LogRecord) -> Result<(), Error> {
        self.store
            .append(&self.agent_id, record)
            .map_err(Error::from)
    }

    /// Flush complete lines out of a buffer, leaving the remainder.
    fn drain_lines(&mut self, thinking: bool) -> Result<(), Error> {
        loop {
            let buf = if thinking {
                &self.thinking_buf
            } else {
                &self.text_buf
            };
            let Some(pos) = buf.find('\n') else {
                break;
            };
            let line = buf[..pos].to_string();
            if thinking {
                self.thinking_buf.drain(..=pos);
            } else {
                self.text_buf.drain(..=pos);
            }
            self.write_line(&line, thinking)?;
        }
        Ok(())
    }

    /// Flush whatever remains in a buffer as one record.
    fn flush_remainder(&mut self, thinking: bool) -> Result<(), Error> {
        let line = if thinking {
            std::mem::take(&mut self.thinking_buf)
        } else {
            std::mem::take(&mut self.text_buf)
        };
        self.write_line(&line, thinking)
    }

    fn write_line(&self, line: &str, thinking: bool) -> Result<(), Error> {
        if line.is_empty() {
            return Ok(());
        }
        let record = if thinking {
            LogRecord::thinking(line)
        } else {
            LogRecord::message(Role::Assistant, line)
        };
        self.append(&record)
    }

    /// Flush text first, then thinking.
    fn flush_all(&mut self) -> Result<(), Error> {
        self.flush_remainder(false)?;
        self.flush_remainder(true)
    }
}

#[async_trait]
impl hivelog_core::sink::EventSink for RecordSink {
    async fn emit(&mut self, event: AgentEvent) -> Result<(), Error> {
        match event {
            AgentEvent::TextToken { text } => {
                self.text_buf.push_str(&text);
                self.drain_lines(false)
            }
            AgentEvent::ThinkingToken { text } => {
                self.thinking_buf.push_str(&text);
                self.drain_lines(true)
            }
            AgentEvent::ThinkingStart => Ok(()),
            AgentEvent::ThinkingEnd => self.flush_remainder(true),
            AgentEvent::ToolCall {
                name, args, error, ..
            } => {
                self.flush_all()?;
                self.append(&LogRecord::tool_call(name, args, error))
            }
            AgentEvent::ToolResult { name, result, .. } => {
                self.flush_all()?;
                self.append(&LogRecord::tool_result(
                    name,
                    serde_json::json!({
                        "success": result.success,
                        "output": result.output,
                    }),
                ))
            }
            AgentEvent::Status {
                status,
                message,
                reason,
            } => {
                self.flush_all()?;
                self.append(&LogRecord {
                    timestamp: chrono::Utc::now(),
                    body: RecordBody::Status {
                        status,
                        message,
                        reason,
                        source: Some(AGENT_SOURCE.into()),
                    },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivelog_core::event::AgentStatus;
    use hivelog_core::sink::EventSink;
    use hivelog_core::tool::ToolResult;

    fn sink() -> (tempfile::TempDir, Arc<LogStore>, RecordSink) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LogStore::new(dir.path()));
        let sink = RecordSink::new(Arc::clone(&store), "scribe");
        (dir, store, sink)
    }

    async fn feed(sink: &mut RecordSink, tokens: &[&str]) {
        for t in tokens {
            sink.emit(AgentEvent::TextToken {
                text: t.to_string(),
            })
            .await
            .unwrap();
        }
    }

    fn message_contents(records: &[LogRecord]) -> Vec<String> {
        records
            .iter()
            .filter_map(|r| match &r.body {
                RecordBody::Message { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn newline_terminated_tokens_become_one_record() {
        let (_dir, store, mut sink) = sink();
        feed(&mut sink, &["Hello", " world", "\n"]).await;
        sink.finish_turn().unwrap();

        let records = store.read_all("scribe").unwrap();
        assert_eq!(message_contents(&records), vec!["Hello world"]);
    }

    #[tokio::test]
    async fn remainder_flushes_at_turn_end() {
        let (_dir, store, mut sink) = sink();
        feed(&mut sink, &["no newline here"]).await;
        // Nothing flushed mid-turn without a newline.
        assert!(store.read_all("scribe").unwrap().is_empty());

        sink.finish_turn().unwrap();
        let records = store.read_all("scribe").unwrap();
        assert_eq!(message_contents(&records), vec!["no newline here"]);
    }

    #[tokio::test]
    async fn multi_line_stream_is_order_preserving() {
        let (_dir, store, mut sink) = sink();
        feed(&mut sink, &["first", " line\nsecond", " line\ntail"]).await;
        sink.finish_turn().unwrap();

        let records = store.read_all("scribe").unwrap();
        let contents = message_contents(&records);
        assert_eq!(contents, vec!["first line", "second line", "tail"]);
        // Concatenation reproduces the streamed text.
        assert_eq!(contents.join("\n"), "first line\nsecond line\ntail");
    }

    #[tokio::test]
    async fn thinking_flushes_on_block_end() {
        let (_dir, store, mut sink) = sink();
        sink.emit(AgentEvent::ThinkingStart).await.unwrap();
        sink.emit(AgentEvent::ThinkingToken {
            text: "weighing options".into(),
        })
        .await
        .unwrap();
        sink.emit(AgentEvent::ThinkingEnd).await.unwrap();
        feed(&mut sink, &["answer\n"]).await;
        sink.finish_turn().unwrap();

        let records = store.read_all("scribe").unwrap();
        assert!(matches!(
            &records[0].body,
            RecordBody::Thinking { content } if content == "weighing options"
        ));
        assert_eq!(message_contents(&records), vec!["answer"]);
    }

    #[tokio::test]
    async fn tool_call_flushes_buffers_first() {
        let (_dir, store, mut sink) = sink();
        feed(&mut sink, &["about to edit"]).await;
        sink.emit(AgentEvent::ToolCall {
            id: "c1".into(),
            name: "edit_page".into(),
            args: serde_json::json!({"page": "Home"}),
            error: None,
        })
        .await
        .unwrap();
        sink.emit(AgentEvent::ToolResult {
            id: "c1".into(),
            name: "edit_page".into(),
            result: ToolResult::ok("c1", "saved"),
        })
        .await
        .unwrap();
        sink.finish_turn().unwrap();

        let records = store.read_all("scribe").unwrap();
        assert_eq!(records.len(), 3);
        assert!(matches!(&records[0].body, RecordBody::Message { content, .. } if content == "about to edit"));
        assert!(matches!(&records[1].body, RecordBody::ToolCall { tool, .. } if tool == "edit_page"));
        match &records[2].body {
            RecordBody::ToolResult { tool, result } => {
                assert_eq!(tool, "edit_page");
                assert_eq!(result["success"].as_bool(), Some(true));
                assert_eq!(result["output"].as_str(), Some("saved"));
            }
            other => panic!("Expected tool_result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_record_carries_agent_source() {
        let (_dir, store, mut sink) = sink();
        sink.emit(AgentEvent::status_with_message(
            AgentStatus::WaitingForInput,
            "waiting for human input",
        ))
        .await
        .unwrap();

        let records = store.read_all("scribe").unwrap();
        match &records[0].body {
            RecordBody::Status { status, source, .. } => {
                assert_eq!(*status, AgentStatus::WaitingForInput);
                assert_eq!(source.as_deref(), Some(AGENT_SOURCE));
            }
            other => panic!("Expected status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_lines_are_not_persisted() {
        let (_dir, store, mut sink) = sink();
        feed(&mut sink, &["para one\n", "\n", "para two\n"]).await;
        sink.finish_turn().unwrap();

        let records = store.read_all("scribe").unwrap();
        assert_eq!(message_contents(&records), vec!["para one", "para two"]);
    }
}

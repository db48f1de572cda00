//! EventSink — where the conversation engine delivers its events.
//!
//! The engine calls `emit().await` for every token and every tool
//! boundary; each await is a cooperative suspension point, so the sink's
//! pace is the engine's pace. The durable logger in the runner crate is
//! the production implementation; tests use a collecting sink.

use crate::error::Error;
use crate::event::AgentEvent;
use async_trait::async_trait;

/// Receives the ordered event sequence of a run.
#[async_trait]
pub trait EventSink: Send {
    /// Consume one event. Errors are infrastructure failures (e.g. the
    /// log file became unwritable) and end the run.
    async fn emit(&mut self, event: AgentEvent) -> Result<(), Error>;
}

/// A sink that collects events in memory. Useful for tests and for
/// callers that want the raw sequence.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub events: Vec<AgentEvent>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventSink for CollectSink {
    async fn emit(&mut self, event: AgentEvent) -> Result<(), Error> {
        self.events.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collect_sink_preserves_order() {
        let mut sink = CollectSink::new();
        sink.emit(AgentEvent::TextToken { text: "a".into() })
            .await
            .unwrap();
        sink.emit(AgentEvent::TextToken { text: "b".into() })
            .await
            .unwrap();
        assert_eq!(sink.events.len(), 2);
        match &sink.events[0] {
            AgentEvent::TextToken { text } => assert_eq!(text, "a"),
            _ => panic!("Wrong variant"),
        }
    }
}

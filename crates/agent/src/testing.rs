//! Test support: a scripted provider for driving the engine without a
//! network. Public so downstream crates can use it in their own tests.

use async_trait::async_trait;
use hivelog_core::error::ProviderError;
use hivelog_core::provider::{ChatProvider, ChatRequest, StreamChunk, ToolCallDelta};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A provider that replays pre-scripted chunk sequences, one per call.
/// Calls past the end of the script return an immediately-done stream.
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<Vec<StreamChunk>>>,
}

impl ScriptedProvider {
    pub fn new(turns: Vec<Vec<StreamChunk>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
        }
    }

    /// Number of scripted calls not yet consumed.
    pub fn remaining(&self) -> usize {
        self.turns.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream(
        &self,
        _request: ChatRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError>
    {
        let mut chunks = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        if !chunks.iter().any(|c| c.done) {
            chunks.push(StreamChunk::done());
        }

        let (tx, rx) = tokio::sync::mpsc::channel(chunks.len() + 1);
        for chunk in chunks {
            // Capacity covers the whole script; this never blocks.
            let _ = tx.send(Ok(chunk)).await;
        }
        Ok(rx)
    }
}

/// A single-fragment tool call: opening delta carrying the complete
/// argument text.
pub fn tool_call_chunk(index: usize, id: &str, name: &str, args: &str) -> StreamChunk {
    StreamChunk {
        tool_deltas: vec![ToolCallDelta {
            index,
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            arguments: args.to_string(),
        }],
        ..StreamChunk::default()
    }
}

//! Built-in tools for Hivelog agents.
//!
//! Only the conversation-control tools live here — the ones whose results
//! steer the run state machine rather than act on content. Content tools
//! (page edits, image generation, commits, search) belong to the embedding
//! application and are registered against the same `Tool` trait.

pub mod control;

pub use control::{EndConversationTool, FinishTool, WaitForHumanTool};

use hivelog_core::tool::ToolRegistry;

/// Create a registry holding the three control tools.
///
/// Embedders extend this with their own content tools before handing the
/// registry to the engine.
pub fn control_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(EndConversationTool));
    registry.register(Box::new(WaitForHumanTool));
    registry.register(Box::new(FinishTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_registry_has_all_three() {
        let registry = control_registry();
        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["end_conversation", "finish", "wait_for_human"]);
    }
}

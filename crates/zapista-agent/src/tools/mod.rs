//! Tool system for the LLM fallback's tool-call loop (spec §4.3 step 5).
//!
//! Defines the `Tool` trait every tool implements, plus conversion to the
//! wire-level `ToolDefinition` list sent on each request.

pub mod cron;
pub mod event;
pub mod list;
pub mod message;
pub mod tool_loop;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use zapista_core::llm::ToolDefinition;

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Text content returned to the LLM.
    pub content: String,
    /// Whether the tool execution failed.
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: message.into(),
            is_error: true,
        }
    }
}

/// Trait every tool implements. Only the closed set the spec names —
/// cron, list, event, message — exists in this core.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn input_schema(&self) -> serde_json::Value;
    async fn execute(&self, input: serde_json::Value) -> ToolResult;
}

/// Static catalog of built-in tools (name, description) — useful for
/// logging or a future `/tools` listing.
pub fn tool_catalog() -> Vec<(&'static str, &'static str)> {
    vec![
        ("cron", "Create, list, remove or snooze a reminder job"),
        ("list", "Add, remove or show items in a named list"),
        ("event", "Schedule an event with pre-event lead reminders"),
        ("message", "Send a message to the user's channel"),
    ]
}

pub fn to_definitions(tools: &[Box<dyn Tool>]) -> Vec<ToolDefinition> {
    tools
        .iter()
        .map(|t| ToolDefinition {
            name: t.name().to_string(),
            description: t.description().to_string(),
            input_schema: t.input_schema(),
        })
        .collect()
}

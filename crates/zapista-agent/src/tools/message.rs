//! `message` tool — lets the LLM send a message outside the direct reply,
//! e.g. a follow-up to the same chat once a tool-driven task completes.

use std::sync::Arc;

use async_trait::async_trait;
use zapista_bus::MessageBus;
use zapista_core::message::OutboundMessage;
use zapista_core::types::Owner;

use super::{Tool, ToolResult};

pub struct SendMessageTool {
    bus: Arc<MessageBus>,
    owner: Owner,
}

impl SendMessageTool {
    pub fn new(bus: Arc<MessageBus>, owner: Owner) -> Self {
        Self { bus, owner }
    }
}

#[async_trait]
impl Tool for SendMessageTool {
    fn name(&self) -> &str {
        "message"
    }

    fn description(&self) -> &str {
        "Send a message to the current chat, outside the normal turn reply"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": { "type": "string" }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let Some(text) = input.get("text").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing 'text'");
        };
        let msg = OutboundMessage::new(&self.owner.channel, &self.owner.chat_id, text);
        self.bus.publish_outbound(msg).await;
        ToolResult::success("sent")
    }
}

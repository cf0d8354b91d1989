//! `event` tool — schedules an `at` job plus up to 3 pre-event lead
//! reminders via `SchedulerHandle::add_event_with_leads`.

use async_trait::async_trait;
use zapista_core::types::Owner;
use zapista_scheduler::SchedulerHandle;

use super::{Tool, ToolResult};

/// Default pre-event lead offsets, in seconds: 15 min, 1 h, 1 day.
const DEFAULT_LEADS_SECS: [i64; 3] = [900, 3600, 86_400];

pub struct EventTool {
    scheduler: SchedulerHandle,
    owner: Owner,
}

impl EventTool {
    pub fn new(scheduler: SchedulerHandle, owner: Owner) -> Self {
        Self { scheduler, owner }
    }
}

#[async_trait]
impl Tool for EventTool {
    fn name(&self) -> &str {
        "event"
    }

    fn description(&self) -> &str {
        "Schedule an event at an absolute time, with automatic pre-event lead reminders"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "message": { "type": "string" },
                "at_ms": { "type": "integer", "description": "absolute UTC epoch milliseconds" }
            },
            "required": ["name", "message", "at_ms"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let Some(name) = input.get("name").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing 'name'");
        };
        let Some(message) = input.get("message").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing 'message'");
        };
        let Some(at_ms) = input.get("at_ms").and_then(|v| v.as_i64()) else {
            return ToolResult::error("missing 'at_ms'");
        };

        match self.scheduler.add_event_with_leads(
            self.owner.clone(),
            name,
            message,
            at_ms,
            &self.owner.channel,
            &self.owner.chat_id,
            &DEFAULT_LEADS_SECS,
        ) {
            Ok(job) => ToolResult::success(format!("event scheduled (id {})", job.id)),
            Err(e) => ToolResult::error(format!("could not schedule event: {e}")),
        }
    }
}

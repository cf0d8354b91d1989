//! `cron` tool — the LLM fallback's hook into the scheduler, used when no
//! handler recognized the request but the model decides a reminder is
//! still warranted.

use async_trait::async_trait;
use chrono::Utc;
use zapista_core::reminder::CronPayload;
use zapista_core::types::Owner;
use zapista_scheduler::{CronSchedule, SchedulerHandle};

use super::{Tool, ToolResult};

pub struct CronTool {
    scheduler: SchedulerHandle,
    owner: Owner,
}

impl CronTool {
    pub fn new(scheduler: SchedulerHandle, owner: Owner) -> Self {
        Self { scheduler, owner }
    }
}

#[async_trait]
impl Tool for CronTool {
    fn name(&self) -> &str {
        "cron"
    }

    fn description(&self) -> &str {
        "Create, list, remove or snooze a reminder job for the current chat"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "action": { "type": "string", "enum": ["add", "list", "remove", "snooze"] },
                "message": { "type": "string", "description": "reminder text, required for add" },
                "in_seconds": { "type": "integer", "description": "seconds from now, required for add" },
                "job_id": { "type": "string", "description": "required for remove/snooze" }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let action = input.get("action").and_then(|v| v.as_str()).unwrap_or("");
        match action {
            "add" => {
                let Some(message) = input.get("message").and_then(|v| v.as_str()) else {
                    return ToolResult::error("missing 'message'");
                };
                let Some(secs) = input.get("in_seconds").and_then(|v| v.as_i64()) else {
                    return ToolResult::error("missing 'in_seconds'");
                };
                let at_ms = Utc::now().timestamp_millis() + secs * 1000;
                let schedule = CronSchedule::At { at_ms };
                let payload = CronPayload::agent_turn(message, &self.owner.channel, &self.owner.chat_id);
                match self
                    .scheduler
                    .add_job(self.owner.clone(), message, schedule, payload, true)
                {
                    Ok(job) => ToolResult::success(format!("scheduled {} (id {})", message, job.id)),
                    Err(e) => ToolResult::error(format!("could not schedule: {e}")),
                }
            }
            "list" => {
                let jobs = self.scheduler.list_jobs(&self.owner);
                if jobs.is_empty() {
                    return ToolResult::success("no jobs scheduled");
                }
                let lines: Vec<String> = jobs
                    .iter()
                    .map(|j| format!("{}: {} (next: {:?})", j.id, j.payload.message, j.state.next_run_at_ms))
                    .collect();
                ToolResult::success(lines.join("\n"))
            }
            "remove" => {
                let Some(id) = input.get("job_id").and_then(|v| v.as_str()) else {
                    return ToolResult::error("missing 'job_id'");
                };
                match self.scheduler.remove_job(&self.owner, id) {
                    Ok(()) => ToolResult::success(format!("removed {id}")),
                    Err(e) => ToolResult::error(format!("could not remove {id}: {e}")),
                }
            }
            "snooze" => {
                let Some(id) = input.get("job_id").and_then(|v| v.as_str()) else {
                    return ToolResult::error("missing 'job_id'");
                };
                match self.scheduler.snooze_job(&self.owner, id) {
                    Ok(job) => ToolResult::success(format!("snoozed, new job {}", job.id)),
                    Err(e) => ToolResult::error(format!("could not snooze {id}: {e}")),
                }
            }
            other => ToolResult::error(format!("unknown cron action: {other}")),
        }
    }
}

//! `list` tool — LLM-driven access to named lists, for requests that slip
//! past the `/list` slash-command handler (e.g. "adiciona leite na lista
//! do mercado" phrased as free text).

use std::sync::Arc;

use async_trait::async_trait;
use zapista_core::lists::ListStore;
use zapista_core::types::Owner;

use super::{Tool, ToolResult};

pub struct ListTool {
    store: Arc<ListStore>,
    owner: Owner,
}

impl ListTool {
    pub fn new(store: Arc<ListStore>, owner: Owner) -> Self {
        Self { store, owner }
    }
}

#[async_trait]
impl Tool for ListTool {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "Add an item to, remove an item from, or show a named list"
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "action": { "type": "string", "enum": ["add", "remove", "show"] },
                "list_name": { "type": "string" },
                "item": { "type": "string", "description": "required for add" },
                "item_id": { "type": "integer", "description": "required for remove" }
            },
            "required": ["action", "list_name"]
        })
    }

    async fn execute(&self, input: serde_json::Value) -> ToolResult {
        let action = input.get("action").and_then(|v| v.as_str()).unwrap_or("");
        let Some(name) = input.get("list_name").and_then(|v| v.as_str()) else {
            return ToolResult::error("missing 'list_name'");
        };

        match action {
            "add" => {
                let Some(item) = input.get("item").and_then(|v| v.as_str()) else {
                    return ToolResult::error("missing 'item'");
                };
                match self.store.add_item(&self.owner, name, item) {
                    Ok(added) => ToolResult::success(format!("added '{}' (id {})", added.text, added.id)),
                    Err(e) => ToolResult::error(format!("could not add item: {e}")),
                }
            }
            "remove" => {
                let Some(id) = input.get("item_id").and_then(|v| v.as_u64()) else {
                    return ToolResult::error("missing 'item_id'");
                };
                match self.store.remove_item(&self.owner, name, id as u32) {
                    Ok(true) => ToolResult::success(format!("removed item {id}")),
                    Ok(false) => ToolResult::error(format!("no item {id} in '{name}'")),
                    Err(e) => ToolResult::error(format!("could not remove item: {e}")),
                }
            }
            "show" => {
                let items = self.store.items(&self.owner, name);
                if items.is_empty() {
                    return ToolResult::success(format!("'{name}' is empty"));
                }
                let lines: Vec<String> = items.iter().map(|i| format!("[{}] {}", i.id, i.text)).collect();
                ToolResult::success(lines.join("\n"))
            }
            other => ToolResult::error(format!("unknown list action: {other}")),
        }
    }
}

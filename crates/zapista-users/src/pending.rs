//! Per-(channel, chat_id) pending confirmation state.
//!
//! Handlers never keep module-level globals for multi-step flows (spec
//! design notes, Open Question 2): everything goes through this store,
//! keyed by `Owner::key()`.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An action tag + arguments awaiting a "sim"/"nao" reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub action: String,
    pub args: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

pub struct PendingStore {
    entries: Mutex<HashMap<String, PendingConfirmation>>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// At most one pending confirmation per owner; a new prompt replaces
    /// whatever was pending before.
    pub fn set(&self, owner_key: &str, action: impl Into<String>, args: serde_json::Value) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            owner_key.to_string(),
            PendingConfirmation {
                action: action.into(),
                args,
                created_at: Utc::now(),
            },
        );
    }

    pub fn get(&self, owner_key: &str) -> Option<PendingConfirmation> {
        self.entries.lock().unwrap().get(owner_key).cloned()
    }

    /// Cleared on any terminal reply (positive confirmation, negative
    /// cancellation, or a new unrelated turn resolving it).
    pub fn clear(&self, owner_key: &str) {
        self.entries.lock().unwrap().remove(owner_key);
    }
}

impl Default for PendingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_prompt_replaces_old_pending() {
        let store = PendingStore::new();
        store.set("whatsapp:U1", "lembrete_time", serde_json::json!({"n": 1}));
        store.set("whatsapp:U1", "lembrete_recurrence", serde_json::json!({"n": 2}));
        let p = store.get("whatsapp:U1").unwrap();
        assert_eq!(p.action, "lembrete_recurrence");
    }

    #[test]
    fn clear_removes_entry() {
        let store = PendingStore::new();
        store.set("whatsapp:U1", "x", serde_json::json!(null));
        store.clear("whatsapp:U1");
        assert!(store.get("whatsapp:U1").is_none());
    }
}

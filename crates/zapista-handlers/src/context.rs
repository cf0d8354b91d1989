//! `HandlerContext` — everything a handler needs to answer one turn,
//! injected by the agent loop. Per spec §4.4, handlers never keep
//! module-level state: pending multi-step flows go through
//! `zapista_users::PendingStore`, never a static.

use std::sync::Arc;

use zapista_core::lists::ListStore;
use zapista_core::llm::LlmProvider;
use zapista_core::types::Owner;
use zapista_scheduler::SchedulerHandle;
use zapista_sessions::SessionManager;
use zapista_users::{PendingStore, ReminderHistoryStore, User};

pub struct HandlerContext {
    pub owner: Owner,
    pub user: User,
    pub scheduler: SchedulerHandle,
    pub lists: Arc<ListStore>,
    pub pending: Arc<PendingStore>,
    pub sessions: Arc<SessionManager>,
    pub reminder_history: Arc<ReminderHistoryStore>,
    pub llm: Option<Arc<dyn LlmProvider>>,
}

impl HandlerContext {
    pub fn owner_key(&self) -> String {
        self.owner.key()
    }
}

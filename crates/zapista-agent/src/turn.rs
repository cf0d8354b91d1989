//! The agent loop (spec §4.3): rate limit → structured parser → scope
//! filter → handler chain → LLM tool-call fallback → session update.

use std::sync::Arc;

use tracing::{info, warn};

use zapista_bus::MessageBus;
use zapista_core::llm::{ChatRequest, LlmProvider, Message};
use zapista_core::lists::ListStore;
use zapista_core::types::{Locale, Owner};
use zapista_handlers::{HandlerContext, HandlerRegistry};
use zapista_scheduler::SchedulerHandle;
use zapista_sessions::{SessionKey, SessionManager};
use zapista_users::{PendingStore, RateLimiter, ReminderHistoryStore, User};

use crate::circuit_breaker::CircuitBreaker;
use crate::parser;
use crate::scope_filter;
use crate::tools::{cron::CronTool, event::EventTool, list::ListTool, message::SendMessageTool, tool_loop, Tool};

const RATE_LIMIT_CAPACITY: u32 = 15;
const RATE_LIMIT_WINDOW_SECS: u64 = 60;

fn localized_rate_limit_reply(locale: Locale) -> &'static str {
    match locale {
        Locale::PtBr | Locale::PtPt => "Muitas mensagens em pouco tempo, aguarde um momento.",
        Locale::Es => "Demasiados mensajes en poco tiempo, espera un momento.",
        Locale::En => "Too many messages, please slow down.",
    }
}

fn localized_scope_reply(locale: Locale) -> &'static str {
    match locale {
        Locale::PtBr | Locale::PtPt => {
            "Eu cuido de lembretes, listas e eventos. Me diga o que precisa organizar."
        }
        Locale::Es => "Me encargo de recordatorios, listas y eventos. Dime que necesitas organizar.",
        Locale::En => "I handle reminders, lists and events. Tell me what you'd like to organize.",
    }
}

fn localized_degraded_reply(locale: Locale) -> &'static str {
    match locale {
        Locale::PtBr | Locale::PtPt => "Nao consegui processar agora, tente novamente em instantes.",
        Locale::Es => "No pude procesar eso ahora, intenta de nuevo en un momento.",
        Locale::En => "I couldn't process that right now, please try again shortly.",
    }
}

pub struct AgentLoop {
    rate_limiter: RateLimiter,
    registry: HandlerRegistry,
    breaker: CircuitBreaker,
    scheduler: SchedulerHandle,
    lists: Arc<ListStore>,
    pending: Arc<PendingStore>,
    sessions: Arc<SessionManager>,
    reminder_history: Arc<ReminderHistoryStore>,
    bus: Arc<MessageBus>,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl AgentLoop {
    pub fn new(
        scheduler: SchedulerHandle,
        lists: Arc<ListStore>,
        pending: Arc<PendingStore>,
        sessions: Arc<SessionManager>,
        reminder_history: Arc<ReminderHistoryStore>,
        bus: Arc<MessageBus>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        Self {
            rate_limiter: RateLimiter::new(RATE_LIMIT_CAPACITY, RATE_LIMIT_WINDOW_SECS),
            registry: zapista_handlers::default_registry(),
            breaker: CircuitBreaker::default_tuned(),
            scheduler,
            lists,
            pending,
            sessions,
            reminder_history,
            bus,
            llm,
        }
    }

    /// Runs one full inbound turn and returns the reply text to deliver.
    pub async fn process_turn(&self, owner: Owner, user: User, text: &str) -> String {
        let owner_key = owner.key();

        if self.rate_limiter.is_rate_limited(&owner_key) {
            info!(owner = %owner_key, "rate limited");
            return localized_rate_limit_reply(user.language).to_string();
        }

        // A recognized slash-command or NL reminder skips the scope filter
        // entirely and goes straight to the handler chain below.
        if parser::parse(text).is_none() {
            let in_scope = scope_filter::is_in_scope(text, self.llm.as_ref(), &self.breaker).await;
            if !in_scope {
                return localized_scope_reply(user.language).to_string();
            }
        }

        let ctx = HandlerContext {
            owner: owner.clone(),
            user: user.clone(),
            scheduler: self.scheduler.clone(),
            lists: Arc::clone(&self.lists),
            pending: Arc::clone(&self.pending),
            sessions: Arc::clone(&self.sessions),
            reminder_history: Arc::clone(&self.reminder_history),
            llm: self.llm.clone(),
        };

        let reply = match self.registry.run(&ctx, text).await {
            Ok(Some(reply)) => reply,
            Ok(None) => self.llm_fallback(&owner, text).await,
            Err(e) => {
                warn!(error = %e, "handler chain failed");
                localized_degraded_reply(user.language).to_string()
            }
        };

        self.update_session(&owner, text, &reply);
        reply
    }

    async fn llm_fallback(&self, owner: &Owner, text: &str) -> String {
        let Some(provider) = self.llm.clone() else {
            return "Nao tenho um modelo de linguagem configurado para isso.".to_string();
        };

        let key = SessionKey::new(owner.channel.clone(), owner.chat_id.clone());
        let history = self.sessions.history(&key).unwrap_or_default();

        let mut messages: Vec<Message> = history
            .iter()
            .map(|m| match m.role.as_str() {
                "assistant" => Message::assistant(&m.content),
                _ => Message::user(&m.content),
            })
            .collect();
        messages.push(Message::user(text));

        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(CronTool::new(self.scheduler.clone(), owner.clone())),
            Box::new(ListTool::new(Arc::clone(&self.lists), owner.clone())),
            Box::new(EventTool::new(self.scheduler.clone(), owner.clone())),
            Box::new(SendMessageTool::new(Arc::clone(&self.bus), owner.clone())),
        ];

        let request = ChatRequest {
            messages,
            tools: crate::tools::to_definitions(&tools),
            temperature: None,
            max_tokens: Some(1024),
        };

        match tool_loop::run_tool_loop(provider.as_ref(), request, &tools).await {
            Ok(response) => {
                self.breaker.record_success();
                response.content
            }
            Err(e) => {
                warn!(error = %e, "llm fallback failed");
                self.breaker.record_failure();
                localized_degraded_reply(Locale::default()).to_string()
            }
        }
    }

    fn update_session(&self, owner: &Owner, user_text: &str, reply: &str) {
        let key = SessionKey::new(owner.channel.clone(), owner.chat_id.clone());
        if let Err(e) = self.sessions.append_message(&key, "user", user_text) {
            warn!(error = %e, "failed to persist user turn");
        }
        if let Err(e) = self.sessions.append_message(&key, "assistant", reply) {
            warn!(error = %e, "failed to persist assistant turn");
        }
    }
}

pub mod context;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod time_expr;

pub use context::HandlerContext;
pub use error::{HandlerError, Result};
pub use registry::{Handler, HandlerRegistry};

/// Builds the default ordered chain (spec §4.4): pending-confirmation
/// resolution first, then reminder-history review (it must run ahead of
/// `ReminderHandler` — a review phrase like "rever lembrete" itself
/// contains "lembrete" and would otherwise be misread as a vague new
/// reminder), then reminders, then lists, with help last.
pub fn default_registry() -> HandlerRegistry {
    use std::sync::Arc;
    HandlerRegistry::new(vec![
        Arc::new(handlers::PendingConfirmationHandler::new()),
        Arc::new(handlers::ReminderHistoryHandler::new()),
        Arc::new(handlers::ReminderHandler::new()),
        Arc::new(handlers::ListHandler::new()),
        Arc::new(handlers::HelpHandler::new()),
    ])
}

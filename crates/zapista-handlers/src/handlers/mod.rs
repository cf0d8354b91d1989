pub mod help;
pub mod list;
pub mod pending;
pub mod reminder;
pub mod reminder_history;

pub use help::HelpHandler;
pub use list::ListHandler;
pub use pending::PendingConfirmationHandler;
pub use reminder::ReminderHandler;
pub use reminder_history::ReminderHistoryHandler;

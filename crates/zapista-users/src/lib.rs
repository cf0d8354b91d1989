pub mod db;
pub mod error;
pub mod pending;
pub mod rate_limit;
pub mod reminder_history;
pub mod resolver;
pub mod types;

pub use error::{Result, UserError};
pub use pending::{PendingConfirmation, PendingStore};
pub use rate_limit::RateLimiter;
pub use reminder_history::{ReminderHistoryEntry, ReminderHistoryStore, ReminderKind};
pub use resolver::{ResolvedUser, UserResolver};
pub use types::{QuietHours, User};

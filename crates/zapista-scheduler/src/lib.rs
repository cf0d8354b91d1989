//! `zapista-scheduler` — durable cron job store and timer.
//!
//! # Overview
//!
//! Jobs live in a single JSON document (see [`store::JobStore`]), written
//! atomically on every mutation. The [`engine::SchedulerEngine`] sleeps
//! until the earliest enabled job's `next_run_at_ms`, wakes, executes all
//! due jobs through an injected [`engine::JobHandler`], and re-arms.
//!
//! # Schedule variants
//!
//! | Variant | Behaviour                                                        |
//! |---------|-------------------------------------------------------------------|
//! | `at`    | Single fire at an absolute millisecond timestamp                  |
//! | `every` | Repeat every N ms, bounded to [30 min, 30 days]                    |
//! | `cron`  | 5-field cron expression, interpreted in the job's IANA timezone   |
//!
//! Job ids are short mnemonic strings (see [`friendly_id`]), not UUIDs —
//! derived from the reminder's own message so a user can recognize and
//! talk about a job by name.

pub mod engine;
pub mod error;
pub mod friendly_id;
pub mod schedule;
pub mod store;
pub mod types;

pub use engine::{JobHandler, JobOutcome, SchedulerEngine, SchedulerHandle, MAX_SNOOZES};
pub use error::{Result, SchedulerError};
pub use store::JobStore;
pub use types::{CronJob, CronSchedule};

use serde::{Deserialize, Serialize};
use zapista_core::types::Owner;

use zapista_core::reminder::{CronJobState, CronPayload};

/// When and how often a job should run.
///
/// Three forms, matching what the reminder tool and the ICS-import flow
/// actually need: a one-shot instant, a fixed-period repeat, and a full
/// cron expression interpreted in the owner's own timezone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CronSchedule {
    /// Fire once at an absolute millisecond timestamp.
    At { at_ms: i64 },

    /// Fire every `every_ms` milliseconds. Bounded to
    /// [`zapista_core::config::MIN_EVERY_MS`, `zapista_core::config::MAX_EVERY_MS`].
    Every {
        every_ms: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        not_before_ms: Option<i64>,
    },

    /// Fire on a 5-field cron expression, interpreted in `timezone` (an IANA
    /// zone id such as `America/Sao_Paulo`).
    Cron {
        expression: String,
        timezone: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        not_before_ms: Option<i64>,
    },
}

impl CronSchedule {
    /// Short label used in log lines and duplicate-merge comparisons.
    pub fn kind(&self) -> &'static str {
        match self {
            CronSchedule::At { .. } => "at",
            CronSchedule::Every { .. } => "every",
            CronSchedule::Cron { .. } => "cron",
        }
    }

    /// Whether this schedule repeats after it fires.
    pub fn is_recurring(&self) -> bool {
        !matches!(self, CronSchedule::At { .. })
    }
}

/// A persisted scheduled job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronJob {
    /// Mnemonic id: a 2-3 letter prefix derived from the job's message plus
    /// a numeric suffix, unique within the store.
    pub id: String,
    /// The (channel, chat_id) that created this job. Listing and removal
    /// are always scoped to this owner.
    pub owner: Owner,
    pub name: String,
    pub enabled: bool,
    pub schedule: CronSchedule,
    pub payload: CronPayload,
    #[serde(default)]
    pub state: CronJobState,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    /// When true, the job is deleted (rather than disabled) after its
    /// final successful run — used for pre-event leads and snooze children.
    #[serde(default)]
    pub delete_after_run: bool,
}

impl CronJob {
    /// True when `owner` matches this job's owner — the sole authorization
    /// check for list/remove/snooze.
    pub fn owned_by(&self, owner: &Owner) -> bool {
        &self.owner == owner
    }

    /// Key used for duplicate-merge-on-add: same owner, same normalized
    /// message, same schedule kind and parameters.
    pub fn merge_key(&self) -> (String, String, String) {
        (
            self.owner.key(),
            normalize_message(&self.payload.message),
            schedule_key(&self.schedule),
        )
    }
}

pub fn normalize_message(message: &str) -> String {
    message.trim().to_lowercase()
}

fn schedule_key(schedule: &CronSchedule) -> String {
    match schedule {
        CronSchedule::At { at_ms } => format!("at:{at_ms}"),
        CronSchedule::Every {
            every_ms,
            not_before_ms,
        } => format!("every:{every_ms}:{not_before_ms:?}"),
        CronSchedule::Cron {
            expression,
            timezone,
            not_before_ms,
        } => format!("cron:{expression}:{timezone}:{not_before_ms:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_is_not_recurring_every_and_cron_are() {
        assert!(!CronSchedule::At { at_ms: 0 }.is_recurring());
        assert!(CronSchedule::Every {
            every_ms: 1_800_000,
            not_before_ms: None
        }
        .is_recurring());
        assert!(CronSchedule::Cron {
            expression: "0 9 * * *".into(),
            timezone: "America/Sao_Paulo".into(),
            not_before_ms: None
        }
        .is_recurring());
    }

    #[test]
    fn normalize_message_trims_and_lowercases() {
        assert_eq!(normalize_message("  Tomar Remedio  "), "tomar remedio");
    }
}

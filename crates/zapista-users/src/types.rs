use serde::{Deserialize, Serialize};
use zapista_core::types::Locale;

/// Quiet-hours window in the user's local timezone: messages and reminders
/// are still processed, but proactive deliveries (cron fires) outside
/// `[start, end)` are deferred to the window's end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuietHours {
    /// Hour of day, 0-23, local time.
    pub start_hour: u8,
    pub end_hour: u8,
}

impl Default for QuietHours {
    /// No quiet hours by default — start == end means "never quiet".
    fn default() -> Self {
        Self {
            start_hour: 0,
            end_hour: 0,
        }
    }
}

impl QuietHours {
    /// True if `hour` (0-23, local) falls inside the quiet window. A window
    /// that wraps past midnight (e.g. 22 -> 7) is handled like the spec's
    /// active-hours windows.
    pub fn contains(&self, hour: u8) -> bool {
        if self.start_hour == self.end_hour {
            return false;
        }
        if self.start_hour < self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Per-user identity and personalization. Phone-hash identity keeps the
/// actual phone number out of logs and the database's plain-text columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// SHA-256 hash of the channel phone number — never the raw number.
    pub id: String,
    pub display_name: String,
    pub language: Locale,
    /// IANA timezone identifier, e.g. `America/Sao_Paulo`.
    pub timezone: String,
    #[serde(default)]
    pub quiet_hours: QuietHours,
    /// Default pre-event lead, in seconds (spec default: 900 = 15 min).
    pub default_lead_secs: i64,
    /// Up to 3 additional pre-event leads, in seconds.
    #[serde(default)]
    pub extra_leads_secs: Vec<i64>,

    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Resolve the language with the spec's deterministic fallback:
    /// explicit override (this field is always populated) > phone-prefix
    /// default > "en". The phone-prefix fallback is applied at creation
    /// time in `identity::create_user`; this accessor just returns the
    /// stored value.
    pub fn resolved_language(&self) -> Locale {
        self.language
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_hours_same_day_window() {
        let q = QuietHours {
            start_hour: 22,
            end_hour: 7,
        };
        assert!(q.contains(23));
        assert!(q.contains(2));
        assert!(!q.contains(12));
    }

    #[test]
    fn quiet_hours_disabled_when_equal() {
        let q = QuietHours::default();
        assert!(!q.contains(3));
    }
}

//! Next-run computation for [`crate::types::CronSchedule`].
//!
//! `cron` expressions are evaluated in the job's own IANA timezone (via
//! `chrono-tz`) and only converted to a UTC millisecond epoch at the end —
//! so `"0 9 * * *"` means 9 AM in the user's zone, not the host's.

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronExpr;

use crate::error::{Result, SchedulerError};
use crate::types::CronSchedule;

/// Compute the next UTC-epoch-millisecond run time, given the current time
/// in epoch milliseconds. Returns `None` when the schedule is exhausted
/// (an `at` job whose instant has passed).
pub fn compute_next_run_ms(schedule: &CronSchedule, now_ms: i64) -> Result<Option<i64>> {
    match schedule {
        CronSchedule::At { at_ms } => Ok((*at_ms > now_ms).then_some(*at_ms)),

        CronSchedule::Every {
            every_ms,
            not_before_ms,
        } => {
            if let Some(nb) = not_before_ms {
                if *nb > now_ms {
                    return Ok(Some(*nb));
                }
            }
            Ok(Some(now_ms + every_ms))
        }

        CronSchedule::Cron {
            expression,
            timezone,
            not_before_ms,
        } => {
            let tz: Tz = timezone
                .parse()
                .map_err(|_| SchedulerError::InvalidCron(format!("unknown timezone: {timezone}")))?;

            let floor_ms = match not_before_ms {
                Some(nb) if *nb > now_ms => *nb,
                _ => now_ms,
            };

            let floor_utc = ms_to_utc(floor_ms)?;
            let floor_local = floor_utc.with_timezone(&tz);

            // The `cron` crate parses 6 or 7 whitespace-separated fields
            // with seconds first; the spec's expressions are the familiar
            // 5-field form, so a literal "0" seconds field is prepended.
            let schedule_expr = CronExpr::from_str(&format!("0 {expression}"))
                .map_err(|e| SchedulerError::InvalidCron(e.to_string()))?;

            let next = schedule_expr
                .after(&floor_local)
                .next()
                .ok_or_else(|| SchedulerError::InvalidCron("no future occurrence".to_string()))?;

            Ok(Some(next.with_timezone(&Utc).timestamp_millis()))
        }
    }
}

fn ms_to_utc(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| SchedulerError::InvalidSchedule(format!("out-of-range timestamp: {ms}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_fires_only_when_in_the_future() {
        let past = CronSchedule::At { at_ms: 1_000 };
        assert_eq!(compute_next_run_ms(&past, 5_000).unwrap(), None);

        let future = CronSchedule::At { at_ms: 10_000 };
        assert_eq!(compute_next_run_ms(&future, 5_000).unwrap(), Some(10_000));
    }

    #[test]
    fn every_respects_not_before() {
        let s = CronSchedule::Every {
            every_ms: 1_800_000,
            not_before_ms: Some(50_000),
        };
        assert_eq!(compute_next_run_ms(&s, 1_000).unwrap(), Some(50_000));
    }

    #[test]
    fn every_advances_by_interval_once_past_not_before() {
        let s = CronSchedule::Every {
            every_ms: 1_800_000,
            not_before_ms: None,
        };
        assert_eq!(compute_next_run_ms(&s, 10_000).unwrap(), Some(1_810_000));
    }

    #[test]
    fn cron_interprets_expression_in_owner_timezone() {
        // 2024-01-01T00:00:00Z, well before 9am in Sao Paulo (UTC-3).
        let now_ms = 1_704_067_200_000;
        let s = CronSchedule::Cron {
            expression: "0 9 * * *".to_string(),
            timezone: "America/Sao_Paulo".to_string(),
            not_before_ms: None,
        };
        let next = compute_next_run_ms(&s, now_ms).unwrap().unwrap();
        let next_utc = Utc.timestamp_millis_opt(next).single().unwrap();
        let next_local = next_utc.with_timezone(&chrono_tz::America::Sao_Paulo);
        assert_eq!(next_local.format("%H:%M").to_string(), "09:00");
    }
}
